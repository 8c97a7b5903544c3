//! Resource discovery and download

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::api::CkanClient;
use crate::error::Result;
use crate::models::{DumpFormat, RawResource};

pub struct Fetcher<'a> {
    client: &'a CkanClient,
    format: DumpFormat,
}

impl<'a> Fetcher<'a> {
    pub fn new(client: &'a CkanClient, format: DumpFormat) -> Self {
        Self { client, format }
    }

    /// Download every datastore-active resource of `dataset`
    ///
    /// Output follows the order of the package's resource list. Any failure
    /// aborts the whole fetch.
    #[tracing::instrument(skip(self), fields(format = %self.format))]
    pub async fn fetch(&self, dataset: &str) -> Result<Vec<RawResource>> {
        let package = self.client.package_show(dataset).await?;
        let active: Vec<_> = package.active_resources().collect();

        info!(
            dataset,
            total = package.resources.len(),
            active = active.len(),
            "Discovered resources"
        );

        if active.is_empty() {
            warn!(dataset, "Package has no datastore-active resources");
            return Ok(Vec::new());
        }

        let pb = ProgressBar::new(active.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut fetched = Vec::with_capacity(active.len());
        for resource in active {
            pb.set_message(resource.name.clone().unwrap_or_else(|| resource.id.clone()));
            let payload = self.client.datastore_dump(&resource.id, self.format).await?;

            info!(
                resource_id = %resource.id,
                position = resource.position,
                size = payload.len_hint(),
                "Fetched resource"
            );

            fetched.push(RawResource {
                id: resource.id.clone(),
                name: resource.name.clone(),
                position: resource.position,
                payload,
            });
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(fetched)
    }
}
