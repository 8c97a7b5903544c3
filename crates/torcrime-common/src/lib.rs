//! torcrime common library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pieces shared by every torcrime workspace member:
//!
//! - **Error handling**: [`CommonError`] and its [`Result`] alias
//! - **Environment**: typed readers for settings held in env vars
//! - **Logging**: `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use torcrime_common::{env, Result};
//!
//! fn batch_size() -> Result<usize> {
//!     env::parse_or("TORCRIME_BATCH_SIZE", 500)
//! }
//! ```

pub mod env;
pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
