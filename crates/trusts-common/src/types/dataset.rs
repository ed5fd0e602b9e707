//! Payloads handed to the TRUSTS platform

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dataset in the shape the TRUSTS platform ingests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustsDataset {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub notes: Value,
    pub owner_org: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    pub resources: DatasetResources,
}

/// The single resource attached to a [`TrustsDataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetResources {
    pub created: Option<String>,
    #[serde(rename = "dataProvider")]
    pub data_provider: Option<String>,
    #[serde(rename = "remoteId")]
    pub remote_id: Option<String>,
    pub rights: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
}

/// Validity window of the contract a published dataset is offered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub contract_start_date: String,
    pub contract_start_time: String,
    pub contract_end_date: String,
    pub contract_end_time: String,
}

impl ContractMetadata {
    /// Default contract length.
    pub const DEFAULT_WEEKS: i64 = 52;

    /// A contract starting at `start` and running for `weeks`.
    pub fn spanning(start: NaiveDateTime, weeks: i64) -> Self {
        let end = start + Duration::weeks(weeks);
        Self {
            contract_start_date: start.date().format("%Y-%m-%d").to_string(),
            contract_start_time: start.time().format("%H:%M:%S%.6f").to_string(),
            contract_end_date: end.date().format("%Y-%m-%d").to_string(),
            contract_end_time: end.time().format("%H:%M:%S%.6f").to_string(),
        }
    }

    /// A contract starting now (local time) with the default length.
    pub fn starting_now() -> Self {
        Self::spanning(chrono::Local::now().naive_local(), Self::DEFAULT_WEEKS)
    }
}
