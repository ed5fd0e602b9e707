//! Europeana FTP archive access
//!
//! Every call opens its own session on a blocking task, runs one command
//! and quits.

use super::ArchiveSource;
use crate::error::Result;
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Mode};
use tracing::{debug, info, warn};

/// Public Europeana download server.
pub const DEFAULT_HOST: &str = "download.europeana.eu";

/// Directory holding the zipped EDM XML datasets.
pub const DEFAULT_WORKING_DIR: &str = "dataset/XML";

/// Suffix of the checksum files listed next to each archive.
const CHECKSUM_SUFFIX: &str = "md5sum";

/// Configuration for FTP connection
#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub host: String,

    /// FTP server port (usually 21)
    pub port: u16,

    pub username: String,
    pub password: String,

    /// Directory entered after login
    pub working_dir: String,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: String::new(),
            working_dir: DEFAULT_WORKING_DIR.to_string(),
        }
    }
}

impl FtpConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

/// Drop the `*.md5sum` companions from a listing.
pub fn remove_checksum_files(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| !name.ends_with(CHECKSUM_SUFFIX))
        .collect()
}

pub struct FtpClient {
    config: FtpConfig,
}

impl FtpClient {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    /// Names in the working directory, checksum files included.
    pub async fn list_archives(&self) -> Result<Vec<String>> {
        let config = self.config.clone();
        let names = tokio::task::spawn_blocking(move || Self::list_sync(&config)).await??;

        info!(entries = names.len(), "Listed Europeana working directory");
        Ok(names)
    }

    /// Download `name` from the working directory into `dest_dir`, returning
    /// the local path.
    pub async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let config = self.config.clone();
        let name = name.to_string();
        let dest = dest_dir.join(&name);

        let path = tokio::task::spawn_blocking(move || {
            Self::download_sync(&config, &name, &dest).map(|()| dest)
        })
        .await??;

        info!(path = %path.display(), "Downloaded archive");
        Ok(path)
    }

    fn open(config: &FtpConfig) -> Result<FtpStream> {
        debug!(host = %config.host, port = config.port, "Connecting to FTP server");

        let mut ftp_stream = FtpStream::connect(format!("{}:{}", config.host, config.port))?;
        ftp_stream.set_mode(Mode::Passive);
        ftp_stream.login(&config.username, &config.password)?;
        ftp_stream.cwd(&config.working_dir)?;
        Ok(ftp_stream)
    }

    fn close(mut ftp_stream: FtpStream) {
        if let Err(e) = ftp_stream.quit() {
            warn!(error = %e, "Failed to quit FTP session gracefully");
        }
    }

    fn list_sync(config: &FtpConfig) -> Result<Vec<String>> {
        let mut ftp_stream = Self::open(config)?;
        let names = ftp_stream.nlst(None)?;
        Self::close(ftp_stream);
        Ok(names)
    }

    fn download_sync(config: &FtpConfig, name: &str, dest: &Path) -> Result<()> {
        let mut ftp_stream = Self::open(config)?;
        ftp_stream.transfer_type(FileType::Binary)?;

        debug!(file = %name, "Downloading");
        let mut file = File::create(dest)?;
        let bytes = ftp_stream.retr(name, |stream| {
            std::io::copy(stream, &mut file).map_err(FtpError::ConnectionError)
        })?;
        debug!(file = %name, bytes, "Download complete");

        Self::close(ftp_stream);
        Ok(())
    }
}

#[async_trait]
impl ArchiveSource for FtpClient {
    async fn list_archives(&self) -> Result<Vec<String>> {
        FtpClient::list_archives(self).await
    }

    async fn download(&self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        FtpClient::download(self, name, dest_dir).await
    }
}
