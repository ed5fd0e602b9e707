//! Broker descriptions (JSON-LD) and their conversion to catalog records
//!
//! A description is a flat `@graph` of typed nodes. One `ids:Resource`
//! carries the dataset metadata; every `ids:Representation` points at the
//! `ids:Artifact` holding the file through `instance == @id`.

use crate::error::{IngestError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use trusts_common::clean_multilang;
use trusts_common::types::{CatalogRecord, Organization, ResourceEntry};

/// A JSON-LD description document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonLdDocument {
    #[serde(rename = "@graph", default)]
    pub graph: Vec<GraphNode>,
}

/// One typed node of the graph
#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,

    #[serde(rename = "@type", default)]
    pub node_type: Value,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Node types the transform looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Resource,
    Representation,
    Artifact,
}

impl NodeKind {
    fn local_name(self) -> &'static str {
        match self {
            NodeKind::Resource => "Resource",
            NodeKind::Representation => "Representation",
            NodeKind::Artifact => "Artifact",
        }
    }

    fn matches(self, type_name: &str) -> bool {
        let local = self.local_name();
        type_name
            .strip_prefix("ids:")
            .or_else(|| type_name.strip_prefix("https://w3id.org/idsa/core/"))
            .is_some_and(|rest| rest == local)
    }
}

impl GraphNode {
    /// Whether the node's `@type` (a string or a list) names `kind`.
    pub fn is(&self, kind: NodeKind) -> bool {
        match &self.node_type {
            Value::String(t) => kind.matches(t),
            Value::Array(types) => types
                .iter()
                .filter_map(Value::as_str)
                .any(|t| kind.matches(t)),
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).filter(|v| !v.is_null())
    }

    /// Property as plain text, see [`clean_multilang`].
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(clean_multilang)
    }

    fn required_text(&self, key: &str) -> Result<String> {
        self.text(key)
            .ok_or_else(|| IngestError::parse(format!("Resource node has no `{}`", key)))
    }
}

impl JsonLdDocument {
    pub fn nodes(&self, kind: NodeKind) -> impl Iterator<Item = &GraphNode> {
        self.graph.iter().filter(move |n| n.is(kind))
    }
}

/// External (`sameAs`) URLs of every artifact in the description.
pub fn artifact_urls(doc: &JsonLdDocument) -> Vec<String> {
    doc.nodes(NodeKind::Artifact)
        .filter_map(|n| n.text("sameAs"))
        .collect()
}

/// Host part of the provider's URI: the third `/` segment up to any `:`.
///
/// `https://provider.example.org:8080/api/offers/1` -> `provider.example.org`
pub fn organization_name(same_as: &str) -> Result<String> {
    same_as
        .split('/')
        .nth(2)
        .and_then(|authority| authority.split(':').next())
        .map(str::to_string)
        .ok_or_else(|| IngestError::parse(format!("cannot derive organization from '{}'", same_as)))
}

fn last_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

fn byte_size(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        other => clean_multilang(other).trim().parse().ok(),
    }
}

/// Convert a broker description into a catalog record.
///
/// Returns `Ok(None)` when the resource has no `theme`: such records have no
/// place in the catalog and are passed over rather than reported as errors.
pub fn graph_to_catalog_record(doc: &JsonLdDocument) -> Result<Option<CatalogRecord>> {
    let resource = doc
        .nodes(NodeKind::Resource)
        .next()
        .ok_or_else(|| IngestError::parse("description has no ids:Resource node"))?;

    let Some(theme) = resource.text("theme") else {
        debug!(resource = ?resource.id, "Resource has no theme, skipping");
        return Ok(None);
    };

    let resource_uri = resource.required_text("sameAs")?;
    let organization_name = organization_name(&resource_uri)?;
    let provider_base_url = organization_name
        .split('/')
        .take(3)
        .collect::<Vec<_>>()
        .join("/");

    let title = resource.required_text("title")?;
    let asset_type = resource.required_text("asset_type")?;
    let license = resource.text("standardLicense");
    let created = resource.text("created");
    let modified = resource.text("modified");
    let description = resource.text("description");

    let mut record = CatalogRecord::empty();
    record.id = Some(resource_uri.clone());
    record.license_id = license.clone();
    record.license_url = license.clone();
    record.license_title = license;
    record.metadata_created = created.clone();
    record.metadata_modified = modified.clone();
    record.name = Some(title.clone());
    record.title = Some(title);
    record.record_type = Some(last_segment(&asset_type).to_lowercase());
    record.theme = Some(last_segment(&theme).to_string());
    record.version = resource.text("version");
    record.external_provider_name = Some(organization_name.clone());
    record.provider_base_url = Some(provider_base_url.clone());
    record.url = Some(provider_base_url);
    record.creator_user_id = Some("X".to_string());
    record.private = Some(false);
    record.mark_type_counter();

    let artifacts: Vec<&GraphNode> = doc.nodes(NodeKind::Artifact).collect();

    for representation in doc.nodes(NodeKind::Representation) {
        let instance = representation.text("instance");
        let artifact = artifacts
            .iter()
            .find(|a| a.id.is_some() && a.id == instance);

        let Some(artifact) = artifact else {
            warn!(
                representation = ?representation.id,
                instance = ?instance,
                "Representation has no matching artifact, skipping"
            );
            continue;
        };

        let mut entry = ResourceEntry::external(artifact.id.clone().unwrap_or_default());
        entry.created = created.clone();
        entry.description = description.clone();
        entry.hash = artifact.text("checkSum");
        entry.id = representation.id.clone();
        entry.last_modified = modified.clone();
        entry.metadata_modified = representation.text("modified");
        entry.mimetype = representation.text("mediaType");
        entry.name = artifact.text("fileName");
        entry.package_id = Some(resource_uri.clone());
        entry.representation = representation.text("sameAs");
        entry.size = artifact.get("ids:byteSize").and_then(byte_size);
        entry.url = representation.text("sameAs");
        record.resources.push(entry);
    }

    let organization = Organization::placeholder(organization_name);
    record.owner_org = Some(organization.id.to_string());
    record.organization = Some(organization);
    record.num_resources = artifacts.len();

    Ok(Some(record))
}
