//! HTTP client for the CKAN portal

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use crate::api::{endpoints, types::*};
use crate::error::{IngestError, Result};
use crate::models::{DumpFormat, RawPayload};

pub struct CkanClient {
    client: Client,
    base_url: String,
}

impl CkanClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("torcrime-ingest/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the package descriptor for `dataset`
    #[tracing::instrument(skip(self))]
    pub async fn package_show(&self, dataset: &str) -> Result<Package> {
        let url = endpoints::package_show_url(&self.base_url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&[("id", dataset)])
            .send()
            .await?;
        let body = ensure_success(response)?.bytes().await?;

        let envelope: CkanResponse<Package> = serde_json::from_slice(&body)?;
        match (envelope.success, envelope.result) {
            (true, Some(package)) => {
                debug!(
                    package = %package.name,
                    resources = package.resources.len(),
                    "Package metadata received"
                );
                Ok(package)
            },
            _ => Err(IngestError::CkanRejected {
                dataset: dataset.to_string(),
                message: envelope
                    .error
                    .map(|e| e.describe())
                    .unwrap_or_else(|| "response carried no result".to_string()),
            }),
        }
    }

    /// Download the bulk dump of one datastore resource
    #[tracing::instrument(skip(self))]
    pub async fn datastore_dump(&self, resource_id: &str, format: DumpFormat) -> Result<RawPayload> {
        let url = endpoints::datastore_dump_url(&self.base_url, resource_id);
        let mut request = self.client.get(&url);
        if let Some(value) = format.query_value() {
            request = request.query(&[("format", value)]);
        }

        let response = ensure_success(request.send().await?)?;
        let payload = match format {
            DumpFormat::Csv => RawPayload::Text(response.text().await?),
            DumpFormat::Json => {
                let body = response.bytes().await?;
                RawPayload::Records(serde_json::from_slice(&body)?)
            },
        };

        debug!(resource_id, size = payload.len_hint(), "Dump downloaded");
        Ok(payload)
    }
}

fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(IngestError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
