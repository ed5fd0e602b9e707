//! EDM record -> TRUSTS record mapping tables

use super::xpath::{ExtractionRule, XmlDocument};
use crate::error::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Owner of every Europeana record in the catalog.
pub const EUROPEANA_OWNER_ORG: &str = "Europeana";

/// Dataset-level fields
pub const DATASET_RULES: &[(&str, ExtractionRule)] = &[
    ("name", ExtractionRule::first("edm:EuropeanaAggregation/edm:datasetName")),
    ("title", ExtractionRule::first("ore:Proxy/dc:title")),
    ("notes", ExtractionRule::first("ore:Proxy/dc:description")),
];

/// Fields of the `resources` sub-map
pub const RESOURCE_RULES: &[(&str, ExtractionRule)] = &[
    ("created", ExtractionRule::first("dqv:QualityAnnotation/dcterms:created")),
    ("dataProvider", ExtractionRule::first("ore:Aggregation/edm:rights")),
    ("name", ExtractionRule::first("edm:EuropeanaAggregation/edm:datasetName")),
    ("remoteId", ExtractionRule::first("ore:Proxy/dc:identifier")),
    ("rights", ExtractionRule::first("ore:Aggregation/edm:rights")),
    ("url", ExtractionRule::first("edm:WebResource/@rdf:about")),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuropeanaRecord {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    pub owner_org: String,
    pub resources: EuropeanaResources,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuropeanaResources {
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
    /// File stem of the source XML
    pub europeana_id: String,
}

/// Evaluate every rule of `table` against `doc`.
pub fn apply_rules(
    doc: &XmlDocument,
    table: &[(&str, ExtractionRule)],
) -> Result<BTreeMap<String, Value>> {
    let mut fields = BTreeMap::new();
    for (field, rule) in table {
        fields.insert(field.to_string(), Value::from(doc.extract(rule)?));
    }
    Ok(fields)
}

/// Map one EDM XML file.
pub fn transform_xml_file(path: &Path) -> Result<EuropeanaRecord> {
    let doc = XmlDocument::from_file(path)?;
    transform_document(&doc, europeana_id(path))
}

pub fn transform_document(doc: &XmlDocument, europeana_id: String) -> Result<EuropeanaRecord> {
    Ok(EuropeanaRecord {
        fields: apply_rules(doc, DATASET_RULES)?,
        owner_org: EUROPEANA_OWNER_ORG.to_string(),
        resources: EuropeanaResources {
            fields: apply_rules(doc, RESOURCE_RULES)?,
            europeana_id,
        },
    })
}

/// `path/to/12345.xml` -> `12345`
fn europeana_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const EDM_RECORD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:dqv="http://www.w3.org/ns/dqv#"
         xmlns:edm="http://www.europeana.eu/schemas/edm/"
         xmlns:ore="http://www.openarchives.org/ore/terms/">
  <ore:Proxy rdf:about="/proxy/provider/1">
    <dc:title>Ansicht von Wien</dc:title>
    <dc:description>Kupferstich</dc:description>
    <dc:identifier>AT-1234</dc:identifier>
  </ore:Proxy>
  <ore:Aggregation rdf:about="/aggregation/provider/1">
    <edm:rights rdf:resource="http://rightsstatements.org/vocab/InC/1.0/">InC</edm:rights>
  </ore:Aggregation>
  <edm:WebResource rdf:about="https://example.org/wien.jpg"/>
  <edm:EuropeanaAggregation rdf:about="/aggregation/europeana/1">
    <edm:datasetName>15508_Ag_AT_Wien</edm:datasetName>
  </edm:EuropeanaAggregation>
  <dqv:QualityAnnotation>
    <dcterms:created>2021-03-01T12:00:00Z</dcterms:created>
  </dqv:QualityAnnotation>
</rdf:RDF>"#;

    #[test]
    fn test_transform_document() {
        let doc = XmlDocument::parse(EDM_RECORD).unwrap();
        let record = transform_document(&doc, "1".to_string()).unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "15508_Ag_AT_Wien",
                "title": "Ansicht von Wien",
                "notes": "Kupferstich",
                "owner_org": "Europeana",
                "resources": {
                    "created": "2021-03-01T12:00:00Z",
                    "dataProvider": "InC",
                    "name": "15508_Ag_AT_Wien",
                    "remoteId": "AT-1234",
                    "rights": "InC",
                    "url": "https://example.org/wien.jpg",
                    "europeana_id": "1"
                }
            })
        );
    }

    #[test]
    fn test_missing_fields_are_empty_strings() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
            xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"
            xmlns:dqv="http://www.w3.org/ns/dqv#" xmlns:edm="http://www.europeana.eu/schemas/edm/"
            xmlns:ore="http://www.openarchives.org/ore/terms/"/>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let record = transform_document(&doc, "x".to_string()).unwrap();

        assert_eq!(record.fields["title"], "");
        assert_eq!(record.resources.fields["url"], "");
    }

    #[test]
    fn test_transform_xml_file_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("9200386_BibliographicResource_3000118.xml");
        std::fs::write(&path, EDM_RECORD).unwrap();

        let record = transform_xml_file(&path).unwrap();
        assert_eq!(record.resources.europeana_id, "9200386_BibliographicResource_3000118");
        assert_eq!(record.owner_org, "Europeana");
    }
}
