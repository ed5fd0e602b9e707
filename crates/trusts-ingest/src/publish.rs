//! Publishing datasets to the TRUSTS catalog

use crate::config::Settings;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};
use trusts_common::types::{ContractMetadata, TrustsDataset};

/// Destination for mapped datasets
#[async_trait]
pub trait CatalogPublisher: Send + Sync {
    async fn post_dataset(&self, dataset: &TrustsDataset, contract: &ContractMetadata)
        -> Result<()>;
}

#[derive(Serialize)]
struct PackageCreate<'a> {
    #[serde(flatten)]
    dataset: &'a TrustsDataset,
    contract: &'a ContractMetadata,
}

/// `package_create` client for the TRUSTS catalog API
pub struct TrustsClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TrustsClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder().timeout(settings.http_timeout).build()?;

        Ok(Self {
            client,
            base_url: settings.trusts_url.trim_end_matches('/').to_string(),
            token: settings.ckan_token.clone(),
        })
    }

    fn package_create_url(&self) -> String {
        format!("{}/api/3/action/package_create", self.base_url)
    }
}

#[async_trait]
impl CatalogPublisher for TrustsClient {
    async fn post_dataset(
        &self,
        dataset: &TrustsDataset,
        contract: &ContractMetadata,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.package_create_url())
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .json(&PackageCreate { dataset, contract })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), dataset = ?dataset.name, "package_create rejected");
            return Err(IngestError::transport(status.as_u16(), body));
        }

        info!(dataset = ?dataset.name, "Published dataset");
        Ok(())
    }
}
