//! Record shapes shared by the ingestion pipelines

mod dataset;
mod record;

pub use dataset::{ContractMetadata, DatasetResources, TrustsDataset};
pub use record::{CatalogRecord, Organization, ResourceEntry};
