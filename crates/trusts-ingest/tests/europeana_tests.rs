//! Europeana staging and transformation tests over a local zip fixture

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use trusts_ingest::europeana::{self, archive, ArchiveSource, EuropeanaOptions, RunSummary, StagingFolders};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn edm_record(title: &str, identifier: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:dc="http://purl.org/dc/elements/1.1/"
         xmlns:dcterms="http://purl.org/dc/terms/"
         xmlns:dqv="http://www.w3.org/ns/dqv#"
         xmlns:edm="http://www.europeana.eu/schemas/edm/"
         xmlns:ore="http://www.openarchives.org/ore/terms/">
  <ore:Proxy><dc:title>{title}</dc:title><dc:identifier>{identifier}</dc:identifier></ore:Proxy>
  <ore:Aggregation><edm:rights>http://creativecommons.org/publicdomain/mark/1.0/</edm:rights></ore:Aggregation>
  <edm:WebResource rdf:about="https://example.org/{identifier}.jpg"/>
  <edm:EuropeanaAggregation><edm:datasetName>2048128_Ag_EU</edm:datasetName></edm:EuropeanaAggregation>
</rdf:RDF>"#
    )
}

fn write_archive(path: &Path, entries: &[(&str, String)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[tokio::test]
async fn test_archive_is_unpacked_and_transformed() {
    let base = TempDir::new().unwrap();
    let folders = StagingFolders::create(base.path(), archive::archive_stem("2048128.zip")).unwrap();

    let zip_path = folders.zipped.join("2048128.zip");
    write_archive(
        &zip_path,
        &[
            ("2048128/item_1.xml", edm_record("Landscape", "item-1")),
            ("2048128/item_2.xml", edm_record("Portrait", "item-2")),
            ("2048128/notes.txt", "ignored".to_string()),
        ],
    );

    europeana::unpack(zip_path, folders.unzipped.clone()).await.unwrap();
    let written = europeana::transform_folder(&folders.unzipped).await.unwrap();
    assert_eq!(written, 2);

    let json_path = folders.jsons.join("2048128/item_1.json");
    let value: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();

    assert_eq!(value["title"], "Landscape");
    assert_eq!(value["name"], "2048128_Ag_EU");
    assert_eq!(value["notes"], "");
    assert_eq!(value["owner_org"], "Europeana");
    assert_eq!(value["resources"]["remoteId"], "item-1");
    assert_eq!(value["resources"]["url"], "https://example.org/item-1.jpg");
    assert_eq!(
        value["resources"]["rights"],
        "http://creativecommons.org/publicdomain/mark/1.0/"
    );
    assert_eq!(value["resources"]["created"], "");
    assert_eq!(value["resources"]["europeana_id"], "item_1");

    assert!(folders.jsons.join("2048128/item_2.json").is_file());
    assert!(!folders.jsons.join("2048128/notes.json").exists());
}

#[tokio::test]
async fn test_malformed_xml_aborts_transform() {
    let base = TempDir::new().unwrap();
    let folders = StagingFolders::create(base.path(), "broken").unwrap();
    fs::write(folders.unzipped.join("bad.xml"), "<rdf:RDF><unclosed></rdf:RDF>").unwrap();

    assert!(europeana::transform_folder(&folders.unzipped).await.is_err());
}

#[tokio::test]
async fn test_unpack_rejects_non_zip() {
    let base = TempDir::new().unwrap();
    let not_zip = base.path().join("fake.zip");
    fs::write(&not_zip, "plain text").unwrap();

    let result = europeana::unpack(not_zip, base.path().join("out")).await;
    assert!(matches!(result, Err(trusts_ingest::IngestError::Archive(_))));
}

/// Serves zip fixtures from a local folder and records every download
/// together with the number of JSON records present when it started.
struct FolderSource {
    dir: TempDir,
    listing: Vec<String>,
    jsons_root: PathBuf,
    downloads: Mutex<Vec<(String, usize)>>,
}

impl FolderSource {
    fn new(archives: &[&str], extra_listing: &[&str], jsons_root: PathBuf) -> Self {
        let dir = TempDir::new().unwrap();
        for name in archives {
            let stem = archive::archive_stem(name);
            let entry = format!("{stem}/item.xml");
            write_archive(
                &dir.path().join(name),
                &[(entry.as_str(), edm_record(stem, &format!("{stem}-1")))],
            );
        }

        let mut listing: Vec<String> = archives.iter().map(|n| n.to_string()).collect();
        listing.extend(extra_listing.iter().map(|n| n.to_string()));
        listing.sort();

        Self {
            dir,
            listing,
            jsons_root,
            downloads: Mutex::new(Vec::new()),
        }
    }

    fn json_count(&self) -> usize {
        WalkDir::new(&self.jsons_root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count()
    }
}

#[async_trait]
impl ArchiveSource for FolderSource {
    async fn list_archives(&self) -> trusts_ingest::Result<Vec<String>> {
        Ok(self.listing.clone())
    }

    async fn download(&self, name: &str, dest_dir: &Path) -> trusts_ingest::Result<PathBuf> {
        assert!(!name.ends_with("md5sum"), "checksum file {name} was downloaded");
        self.downloads.lock().unwrap().push((name.to_string(), self.json_count()));

        let dest = dest_dir.join(name);
        fs::copy(self.dir.path().join(name), &dest)?;
        Ok(dest)
    }
}

#[tokio::test]
async fn test_run_downloads_each_batch_before_transforming() {
    let base = TempDir::new().unwrap();
    let source = FolderSource::new(
        &["a.zip", "b.zip", "c.zip", "d.zip"],
        &["a.zip.md5sum", "b.zip.md5sum"],
        base.path().join("jsons"),
    );

    let mut options = EuropeanaOptions::new(base.path());
    options.until = Some(3);
    options.batch_size = 2;

    let summary = europeana::run_with(&source, &options).await.unwrap();

    assert_eq!(summary, RunSummary { archives: 3, records: 3 });
    assert_eq!(
        *source.downloads.lock().unwrap(),
        vec![
            ("a.zip".to_string(), 0),
            ("b.zip".to_string(), 0),
            ("c.zip".to_string(), 2),
        ]
    );
    assert!(base.path().join("jsons/c/c/item.json").is_file());
    assert!(!base.path().join("zipped/d.zip").exists());
    assert!(!base.path().join("unzipped/d").exists());
}

#[tokio::test]
async fn test_run_with_zero_batch_size_goes_one_by_one() {
    let base = TempDir::new().unwrap();
    let source = FolderSource::new(&["a.zip", "b.zip"], &[], base.path().join("jsons"));

    let mut options = EuropeanaOptions::new(base.path());
    options.batch_size = 0;

    let summary = europeana::run_with(&source, &options).await.unwrap();

    assert_eq!(summary, RunSummary { archives: 2, records: 2 });
    assert_eq!(
        *source.downloads.lock().unwrap(),
        vec![("a.zip".to_string(), 0), ("b.zip".to_string(), 1)]
    );
}
