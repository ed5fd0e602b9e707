//! TRUSTS Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Pipelines that pull metadata from external catalogs and reshape it into
//! TRUSTS datasets.
//!
//! # Supported Sources
//!
//! - **Broker**: resources offered at an IDS broker, described as JSON-LD and
//!   republished to the TRUSTS catalog
//! - **Europeana**: zipped EDM XML datasets from the Europeana FTP server
//! - **OpenAIRE**: gzip-compressed JSON-lines research product dumps
//!
//! # Example
//!
//! ```no_run
//! use trusts_ingest::openaire;
//! use std::path::Path;
//!
//! fn main() -> trusts_ingest::Result<()> {
//!     let written = openaire::run(Path::new("dumps"), Path::new("out"), openaire::DEFAULT_LIMIT)?;
//!     tracing::info!(written, "done");
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod europeana;
pub mod openaire;
pub mod progress;
pub mod publish;

pub use error::{IngestError, Result};
