//! CKAN action API response types
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! package document is ignored.

use serde::{Deserialize, Serialize};

/// Envelope every CKAN action wraps its answer in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CkanResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CkanErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CkanErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "__type", default)]
    pub kind: Option<String>,
}

impl CkanErrorBody {
    pub fn describe(&self) -> String {
        match (&self.kind, &self.message) {
            (Some(kind), Some(message)) => format!("{kind}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(kind), None) => kind.clone(),
            (None, None) => "no error detail".to_string(),
        }
    }
}

/// Package descriptor returned by `package_show`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Package {
    /// Resources backed by the datastore, in metadata order
    pub fn active_resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.datastore_active)
    }
}

/// One downloadable unit of a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Absent means the resource has no datastore table
    #[serde(default)]
    pub datastore_active: bool,
    #[serde(default)]
    pub position: u32,
}
