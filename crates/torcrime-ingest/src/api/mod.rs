//! CKAN open-data portal client
//!
//! Only the two calls the pipeline needs: `package_show` for resource
//! discovery and `datastore/dump` for the bulk rows of one resource.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::CkanClient;
pub use types::*;
