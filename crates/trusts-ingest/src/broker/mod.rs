//! Broker-query pipeline
//!
//! Lists every resource offered at the broker, fetches each description,
//! reshapes it into a catalog record and publishes a derived dataset to the
//! TRUSTS catalog. A record that fails is logged and the run moves on.

pub mod client;
pub mod graph;
pub mod query;
pub mod tabular;

pub use client::BrokerClient;
pub use graph::{artifact_urls, graph_to_catalog_record, JsonLdDocument};
pub use query::sparql_all_resources;
pub use tabular::{parse_tabular_response, TabularRow, DEFAULT_SEPARATOR};

use crate::error::{IngestError, Result};
use crate::publish::CatalogPublisher;
use std::collections::HashSet;
use tracing::{debug, error, info};
use trusts_common::types::{CatalogRecord, ContractMetadata, DatasetResources, TrustsDataset};

/// Theme every republished dataset is filed under.
pub const CLONE_THEME: &str = "https://trusts.poolparty.biz/Themes/18";

/// Organization owning republished datasets.
pub const CLONE_OWNER_ORG: &str = "clone_node";

/// Data provider named on republished resources.
pub const CLONE_DATA_PROVIDER: &str = "Interoperability Provider with the Clone";

/// Outcome of one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub published: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Derive the dataset published for a broker record.
pub fn client_payload(record: &CatalogRecord) -> Result<TrustsDataset> {
    let first = record
        .resources
        .first()
        .ok_or_else(|| IngestError::mapping_gap("record has no resource entries"))?;

    let name = record.name.clone().unwrap_or_default();
    let title = record.title.clone().unwrap_or_default();

    Ok(TrustsDataset {
        name: Some(format!("{}_v1", name.to_lowercase().replace(' ', "_"))),
        title: Some(format!("{}test_clone_v1", title)),
        theme: Some(CLONE_THEME.to_string()),
        notes: record.notes.clone().unwrap_or_else(|| "None".to_string()).into(),
        owner_org: CLONE_OWNER_ORG.to_string(),
        keywords: Some(record.tags.clone()),
        resources: DatasetResources {
            created: first.created.clone(),
            data_provider: Some(CLONE_DATA_PROVIDER.to_string()),
            remote_id: first.id.clone(),
            rights: record.license_url.clone(),
            url: Some(format!("{}__v1", first.url.as_deref().unwrap_or_default())),
            name: Some(format!(
                "{}test_clone_resource",
                first.name.as_deref().unwrap_or_default()
            )),
        },
    })
}

/// `<uri>` -> `uri`
fn external_name(raw: &str) -> &str {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Query the broker and publish every describable resource.
pub async fn run(
    broker: &BrokerClient,
    publisher: &dyn CatalogPublisher,
    resource_type: Option<&str>,
) -> Result<RunSummary> {
    let query = sparql_all_resources(resource_type);
    let raw = broker.query(&query).await?;
    let rows = parse_tabular_response(&raw, DEFAULT_SEPARATOR)?;
    info!(rows = rows.len(), "Broker returned resources");

    let mut seen = HashSet::new();
    let mut summary = RunSummary::default();

    for row in &rows {
        let Some(raw_name) = row.get("externalname") else {
            error!(?row, "Row has no externalname column");
            summary.failed += 1;
            continue;
        };
        let name = external_name(raw_name).to_string();

        if !seen.insert(name.clone()) {
            debug!(external_name = %name, "Already processed, skipping");
            summary.duplicates += 1;
            continue;
        }

        match process_element(broker, publisher, &name).await {
            Ok(()) => summary.published += 1,
            Err(e) => {
                error!(external_name = %name, error = %e, "Failed to process broker element");
                summary.failed += 1;
            },
        }
    }

    info!(
        published = summary.published,
        duplicates = summary.duplicates,
        failed = summary.failed,
        "Broker run finished"
    );
    Ok(summary)
}

async fn process_element(
    broker: &BrokerClient,
    publisher: &dyn CatalogPublisher,
    name: &str,
) -> Result<()> {
    let document = broker
        .describe(name)
        .await?
        .ok_or_else(|| IngestError::mapping_gap(format!("'{}' is not an element identifier", name)))?;

    debug!(external_name = %name, artifacts = ?artifact_urls(&document), "Described element");

    let record = graph_to_catalog_record(&document)?
        .ok_or_else(|| IngestError::mapping_gap("resource has no theme"))?;
    let dataset = client_payload(&record)?;
    let contract = ContractMetadata::starting_now();

    publisher.post_dataset(&dataset, &contract).await
}
