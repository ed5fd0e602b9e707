//! Connector and platform settings
//!
//! Settings come from an env-style file (`.env` by default). Keys the file
//! does not define are taken from the process environment.

use crate::error::{IngestError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Default settings file name.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Credentials and endpoints for the broker pipeline
#[derive(Clone)]
pub struct Settings {
    /// Base URL of the IDS connector the broker is reached through
    pub connector_url: String,

    /// Broker the connector forwards queries to
    pub broker_url: String,

    /// Connector basic-auth user
    pub admin: String,

    /// Connector basic-auth password
    pub password: String,

    /// API token for the TRUSTS catalog
    pub ckan_token: String,

    /// Base URL of the TRUSTS catalog
    pub trusts_url: String,

    pub http_timeout: Duration,
}

impl Settings {
    /// Load settings from `path`, falling back to the process environment
    /// for keys the file lacks.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut file_values = HashMap::new();

        match dotenvy::from_path_iter(path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|e| {
                        IngestError::config(format!("invalid line in {}: {}", path.display(), e))
                    })?;
                    file_values.insert(key, value);
                }
                debug!(path = %path.display(), keys = file_values.len(), "Loaded settings file");
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Settings file not readable, using process environment");
            },
        }

        Self::from_lookup(|key| {
            file_values
                .get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| IngestError::config(format!("{} is not set", key)))
        };

        let http_timeout = match lookup("TRUSTS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                IngestError::config(format!("TRUSTS_HTTP_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            connector_url: required("CONNECTOR_URL")?,
            broker_url: required("BROKER_URL")?,
            admin: required("ADMIN")?,
            password: required("PASSWORD")?,
            ckan_token: required("CKAN_TOKEN")?,
            trusts_url: required("TRUSTS_URL")?,
            http_timeout: Duration::from_secs(http_timeout),
        })
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("connector_url", &self.connector_url)
            .field("broker_url", &self.broker_url)
            .field("admin", &self.admin)
            .field("password", &"***")
            .field("ckan_token", &"***")
            .field("trusts_url", &self.trusts_url)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn complete() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("CONNECTOR_URL", "https://connector.example.org"),
            ("BROKER_URL", "https://broker.example.org"),
            ("ADMIN", "admin"),
            ("PASSWORD", "secret"),
            ("CKAN_TOKEN", "token"),
            ("TRUSTS_URL", "https://trusts.example.org"),
        ])
    }

    #[test]
    fn test_from_lookup_complete() {
        let values = complete();
        let settings = Settings::from_lookup(|k| values.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.connector_url, "https://connector.example.org");
        assert_eq!(settings.admin, "admin");
        assert_eq!(settings.http_timeout, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));
    }

    #[test]
    fn test_missing_key_is_named() {
        let mut values = complete();
        values.remove("CKAN_TOKEN");
        let err = Settings::from_lookup(|k| values.get(k).map(|v| v.to_string())).unwrap_err();

        assert!(err.to_string().contains("CKAN_TOKEN"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let values = complete();
        let settings = Settings::from_lookup(|k| values.get(k).map(|v| v.to_string())).unwrap();
        let rendered = format!("{:?}", settings);

        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("token\""));
    }

    #[test]
    fn test_load_reads_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (key, value) in complete() {
            writeln!(file, "{}={}", key, value).unwrap();
        }
        writeln!(file, "TRUSTS_HTTP_TIMEOUT_SECS=30").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.broker_url, "https://broker.example.org");
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
    }
}
