//! TRUSTS Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared record shapes and utilities for the TRUSTS interoperability tooling.
//!
//! # Overview
//!
//! - **Types**: the catalog record ("packagemeta"), its resource entries and
//!   organization, the TRUSTS dataset payload and contract metadata
//! - **Multilang**: flattening of JSON-LD language/typed literals to plain text
//! - **Logging**: tracing subscriber setup shared by every pipeline
//!
//! # Example
//!
//! ```no_run
//! use trusts_common::clean_multilang;
//! use trusts_common::types::CatalogRecord;
//!
//! let mut record = CatalogRecord::empty();
//! record.title = Some(clean_multilang(&serde_json::json!({"@value": "Rivers"})));
//! assert_eq!(record.title.as_deref(), Some("Rivers"));
//! ```

pub mod logging;
pub mod multilang;
pub mod types;

pub use multilang::clean_multilang;
