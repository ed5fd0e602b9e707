//! Catalog record ("packagemeta") with its resource entries and organization
//!
//! The downstream catalog expects every key to be present, so optional
//! values serialize as `null` instead of being skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;
use uuid::{uuid, Uuid};

/// Count fields declared on [`CatalogRecord`] that a flattened counter must
/// not shadow.
const DECLARED_COUNTERS: [&str; 3] = ["dataset_count", "service_count", "application_count"];

/// One dataset as represented in the downstream catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub creator_user_id: Option<String>,
    pub id: Option<String>,
    pub isopen: Option<bool>,
    pub license_id: Option<String>,
    pub license_title: Option<String>,
    pub license_url: Option<String>,
    pub maintainer: Option<String>,
    pub maintainer_email: Option<String>,
    pub metadata_created: Option<String>,
    pub metadata_modified: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub num_resources: usize,
    pub num_tags: usize,
    pub owner_org: Option<String>,
    pub private: Option<bool>,
    pub state: String,
    pub theme: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
    pub tags: Vec<String>,
    pub groups: Vec<Value>,
    pub dataset_count: u32,
    pub service_count: u32,
    pub application_count: u32,
    pub relationships_as_object: Vec<Value>,
    pub relationships_as_subject: Vec<Value>,
    pub resources: Vec<ResourceEntry>,
    pub organization: Option<Organization>,
    pub external_provider_name: Option<String>,
    pub provider_base_url: Option<String>,
    /// Counters keyed `<type>count` (e.g. `servicecount`).
    ///
    /// These sit next to, and never update, the `*_count` fields above.
    #[serde(flatten)]
    pub type_counters: BTreeMap<String, u32>,
}

impl CatalogRecord {
    /// A record with every key present and nothing sourced yet.
    pub fn empty() -> Self {
        Self {
            author: None,
            author_email: None,
            creator_user_id: None,
            id: None,
            isopen: None,
            license_id: None,
            license_title: None,
            license_url: None,
            maintainer: None,
            maintainer_email: None,
            metadata_created: None,
            metadata_modified: None,
            name: None,
            notes: None,
            num_resources: 0,
            num_tags: 0,
            owner_org: None,
            private: None,
            state: "active".to_string(),
            theme: None,
            title: None,
            record_type: None,
            url: None,
            version: None,
            tags: Vec::new(),
            groups: Vec::new(),
            dataset_count: 0,
            service_count: 0,
            application_count: 0,
            relationships_as_object: Vec::new(),
            relationships_as_subject: Vec::new(),
            resources: Vec::new(),
            organization: None,
            external_provider_name: None,
            provider_base_url: None,
            type_counters: BTreeMap::new(),
        }
    }

    /// Set the counter for this record's own type.
    ///
    /// The key is the type glued to `count` without a separator, so a
    /// `service` record gets `servicecount` while `service_count` stays 0.
    /// A key naming one of the declared count fields is skipped, since it
    /// would serialize as a duplicate JSON key.
    pub fn mark_type_counter(&mut self) {
        let key = format!("{}count", self.record_type.as_deref().unwrap_or_default());
        if DECLARED_COUNTERS.contains(&key.as_str()) {
            warn!(key = %key, "Type counter would shadow a declared field, skipping");
            return;
        }
        self.type_counters.insert(key, 1);
    }
}

impl Default for CatalogRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// One downloadable artifact of a catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub artifact: String,
    pub cache_last_updated: Option<String>,
    pub cache_url: Option<String>,
    pub created: Option<String>,
    pub description: Option<String>,
    pub format: String,
    pub hash: Option<String>,
    pub id: Option<String>,
    pub last_modified: Option<String>,
    pub metadata_modified: Option<String>,
    pub mimetype: Option<String>,
    pub mimetype_inner: Option<String>,
    pub name: Option<String>,
    pub package_id: Option<String>,
    pub position: u32,
    pub representation: Option<String>,
    pub resource_type: String,
    pub size: Option<u64>,
    pub state: String,
    pub url: Option<String>,
    pub url_type: String,
}

impl ResourceEntry {
    /// An entry for `artifact` with the fixed external-resource defaults.
    pub fn external(artifact: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            cache_last_updated: None,
            cache_url: None,
            created: None,
            description: None,
            format: "EXTERNAL".to_string(),
            hash: None,
            id: None,
            last_modified: None,
            metadata_modified: None,
            mimetype: None,
            mimetype_inner: None,
            name: None,
            package_id: None,
            position: 0,
            representation: None,
            resource_type: "resource".to_string(),
            size: None,
            state: "active".to_string(),
            url: None,
            url_type: "upload".to_string(),
        }
    }
}

/// Organization owning a catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub org_type: String,
    pub description: String,
    pub image_url: String,
    pub created: String,
    pub is_organization: bool,
    pub approval_status: String,
    pub state: String,
}

impl Organization {
    /// Id every broker-sourced record is filed under.
    pub const PLACEHOLDER_ID: Uuid = uuid!("52bc9332-2ba1-4c4f-bf85-5a141cd68423");

    /// Organization for an external provider; only the name is sourced,
    /// the rest are fixed placeholder values.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            id: Self::PLACEHOLDER_ID,
            name: name.into(),
            title: "Orga1".to_string(),
            org_type: "organization".to_string(),
            description: String::new(),
            image_url: String::new(),
            created: "2022-02-02T16:32:58.653424".to_string(),
            is_organization: true,
            approval_status: "approved".to_string(),
            state: "active".to_string(),
        }
    }
}
