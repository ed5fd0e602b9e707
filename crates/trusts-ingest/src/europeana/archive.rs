//! Staging area layout and archive extraction
//!
//! ```text
//! <base>/zipped/<archive>
//! <base>/unzipped/<archive>/.../*.xml
//! <base>/jsons/<archive>/.../*.json
//! ```

use crate::error::Result;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Folders one archive is staged in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingFolders {
    pub zipped: PathBuf,
    pub unzipped: PathBuf,
    pub jsons: PathBuf,
}

impl StagingFolders {
    /// Create (if missing) the staging folders for `archive_name` under `base`.
    pub fn create(base: &Path, archive_name: &str) -> Result<Self> {
        let folders = Self {
            zipped: base.join("zipped"),
            unzipped: base.join("unzipped").join(archive_name),
            jsons: base.join("jsons").join(archive_name),
        };

        for dir in [&folders.zipped, &folders.unzipped, &folders.jsons] {
            fs::create_dir_all(dir)?;
        }
        Ok(folders)
    }
}

/// Staging folder name for an archive: the file name without its extension.
pub fn archive_stem(archive_name: &str) -> &str {
    Path::new(archive_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(archive_name)
}

/// Extract every entry of `archive` into `to_dir`.
pub fn unzip(archive: &Path, to_dir: &Path) -> Result<()> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    debug!(archive = %archive.display(), entries = zip.len(), "Extracting");
    zip.extract(to_dir)?;
    Ok(())
}

/// Where the JSON for an extracted XML file is written.
pub fn json_output_path(xml_path: &Path) -> PathBuf {
    let rewritten = xml_path
        .to_string_lossy()
        .replace("unzipped", "jsons")
        .replace(".xml", ".json");
    PathBuf::from(rewritten)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_create_staging_folders() {
        let base = tempfile::tempdir().unwrap();
        let folders = StagingFolders::create(base.path(), "2021").unwrap();

        assert_eq!(folders.zipped, base.path().join("zipped"));
        assert_eq!(folders.unzipped, base.path().join("unzipped/2021"));
        assert!(folders.jsons.is_dir());

        // Creating twice is harmless
        StagingFolders::create(base.path(), "2021").unwrap();
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(archive_stem("2021.zip"), "2021");
        assert_eq!(archive_stem("plain"), "plain");
    }

    #[test]
    fn test_unzip_extracts_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("set.zip");

        let mut writer = ZipWriter::new(File::create(&archive_path).unwrap());
        for name in ["set/1.xml", "set/2.xml"] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"<rdf:RDF/>").unwrap();
        }
        writer.finish().unwrap();

        let out = dir.path().join("out");
        unzip(&archive_path, &out).unwrap();
        assert!(out.join("set/1.xml").is_file());
        assert!(out.join("set/2.xml").is_file());
    }

    #[test]
    fn test_json_output_path() {
        let path = Path::new("staging/unzipped/2021/2021/record.xml");
        assert_eq!(
            json_output_path(path),
            PathBuf::from("staging/jsons/2021/2021/record.json")
        );
    }
}
