//! Europeana pipeline
//!
//! Downloads the zipped EDM XML datasets from the Europeana FTP server,
//! unpacks them into a staging area and writes one TRUSTS JSON per record.
//! The first failure aborts the run.

pub mod archive;
pub mod ftp;
pub mod mapping;
pub mod xpath;

pub use archive::{json_output_path, StagingFolders};
pub use ftp::{remove_checksum_files, FtpClient, FtpConfig};
pub use mapping::{transform_xml_file, EuropeanaRecord};

use crate::error::Result;
use crate::progress::create_progress_bar;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Archives downloaded and unpacked before their records are transformed.
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct EuropeanaOptions {
    /// Root of the staging area
    pub base_folder: PathBuf,

    /// Process only the first `until` archives
    pub until: Option<usize>,

    pub batch_size: usize,
    pub ftp: FtpConfig,
}

impl EuropeanaOptions {
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_folder: base_folder.into(),
            until: None,
            batch_size: DEFAULT_BATCH_SIZE,
            ftp: FtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub archives: usize,
    pub records: usize,
}

/// Where the zipped datasets come from
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Every name in the archive directory, checksum files included.
    async fn list_archives(&self) -> Result<Vec<String>>;

    /// Fetch `name` into `dest_dir` and return the local path.
    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Split a directory listing into the batches a run works through: checksum
/// files dropped, cut to the first `until` archives, at least one per batch.
pub fn plan_batches(listing: Vec<String>, until: Option<usize>, batch_size: usize) -> Vec<Vec<String>> {
    let mut archives = remove_checksum_files(listing);
    if let Some(until) = until {
        archives.truncate(until);
    }
    archives
        .chunks(batch_size.max(1))
        .map(<[String]>::to_vec)
        .collect()
}

/// Run against the FTP server named in `options`.
pub async fn run(options: &EuropeanaOptions) -> Result<RunSummary> {
    let client = FtpClient::new(options.ftp.clone());
    run_with(&client, options).await
}

/// Each batch is downloaded and unpacked in full before any of its records
/// are transformed.
pub async fn run_with(source: &dyn ArchiveSource, options: &EuropeanaOptions) -> Result<RunSummary> {
    let listing = source.list_archives().await?;
    let batches = plan_batches(listing, options.until, options.batch_size);

    let mut summary = RunSummary::default();
    for batch in &batches {
        info!(archives = ?batch, "Processing batch");

        let mut staged = Vec::with_capacity(batch.len());
        for name in batch {
            let folders = StagingFolders::create(&options.base_folder, archive::archive_stem(name))?;
            let local = source.download(name, &folders.zipped).await?;
            unpack(local, folders.unzipped.clone()).await?;
            staged.push(folders);
        }

        for folders in &staged {
            summary.records += transform_folder(&folders.unzipped).await?;
            summary.archives += 1;
        }
    }

    info!(archives = summary.archives, records = summary.records, "Europeana run finished");
    Ok(summary)
}

/// Unzip `archive` into `to_dir` on a blocking task.
pub async fn unpack(archive: PathBuf, to_dir: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || archive::unzip(&archive, &to_dir)).await?
}

/// Transform every `.xml` below `unzipped`, writing each record to its
/// [`json_output_path`]. Returns the number of records written.
pub async fn transform_folder(unzipped: &Path) -> Result<usize> {
    let unzipped = unzipped.to_path_buf();
    tokio::task::spawn_blocking(move || transform_folder_sync(&unzipped)).await?
}

fn xml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let is_xml = entry.path().extension().is_some_and(|ext| ext == "xml");
        if entry.file_type().is_file() && is_xml {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn transform_folder_sync(unzipped: &Path) -> Result<usize> {
    let files = xml_files(unzipped)?;
    let pb = create_progress_bar(files.len() as u64, "Transforming");

    for path in &files {
        let record = transform_xml_file(path)?;
        let out = json_output_path(path);
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&out)?);
        serde_json::to_writer(&mut writer, &record)?;
        writer.flush()?;
        debug!(json = %out.display(), "Wrote record");
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(files.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_plan_batches_drops_checksums_and_chunks() {
        let batches = plan_batches(
            listing(&["a.zip", "a.zip.md5sum", "b.zip", "b.zip.md5sum", "c.zip"]),
            None,
            2,
        );
        assert_eq!(batches, vec![listing(&["a.zip", "b.zip"]), listing(&["c.zip"])]);
    }

    #[test]
    fn test_plan_batches_until_counts_archives_only() {
        let batches = plan_batches(listing(&["a.zip.md5sum", "a.zip", "b.zip", "c.zip"]), Some(2), 10);
        assert_eq!(batches, vec![listing(&["a.zip", "b.zip"])]);
    }

    #[test]
    fn test_plan_batches_zero_size_means_one() {
        let batches = plan_batches(listing(&["a.zip", "b.zip"]), None, 0);
        assert_eq!(batches, vec![listing(&["a.zip"]), listing(&["b.zip"])]);
    }

    #[test]
    fn test_plan_batches_empty_listing() {
        assert!(plan_batches(Vec::new(), Some(3), 10).is_empty());
    }
}
