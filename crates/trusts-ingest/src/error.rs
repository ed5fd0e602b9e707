//! Error types for the ingestion pipelines
//!
//! Three kinds describe the data itself: a connector answering with a
//! failure ([`IngestError::Transport`]), a source record that has no
//! counterpart in the TRUSTS schema ([`IngestError::MappingGap`]), and input
//! that does not have the expected structure ([`IngestError::Parse`]). The
//! remaining variants wrap the infrastructure the pipelines run on.

use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    /// Remote endpoint answered with a non-success status or an empty body
    #[error("CONNECTOR_EXCEPTION Code: {status} Text: {body}")]
    Transport { status: u16, body: String },

    /// Source record cannot be expressed in the target schema
    #[error("Record cannot be mapped: {reason}")]
    MappingGap { reason: String },

    /// Source data does not have the expected structure
    #[error("Parse error: {detail}")]
    Parse { detail: String },

    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}. Check the .env file or the process environment.")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FTP operation failed: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task could not be joined
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    pub fn transport(status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            status,
            body: body.into(),
        }
    }

    pub fn mapping_gap(reason: impl Into<String>) -> Self {
        Self::MappingGap {
            reason: reason.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse {
            detail: detail.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
