//! HTTP client for the IDS broker, reached through the local connector

use crate::broker::graph::JsonLdDocument;
use crate::config::Settings;
use crate::error::{IngestError, Result};
use reqwest::{Client, Response};
use tracing::{debug, error};

/// Shortest element identifier worth sending to the broker.
const MIN_ELEMENT_ID_LEN: usize = 5;

/// Connector endpoints used to reach the broker
pub struct BrokerClient {
    client: Client,
    connector_url: String,
    broker_url: String,
    admin: String,
    password: String,
}

impl BrokerClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder().timeout(settings.http_timeout).build()?;

        Ok(Self {
            client,
            connector_url: settings.connector_url.trim_end_matches('/').to_string(),
            broker_url: settings.broker_url.clone(),
            admin: settings.admin.clone(),
            password: settings.password.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/ids/{}", self.connector_url, path)
    }

    /// Run a SPARQL query at the broker and return the raw tab-separated
    /// answer.
    pub async fn query(&self, query: &str) -> Result<String> {
        debug!(broker = %self.broker_url, "Querying broker");

        let response = self
            .client
            .post(self.endpoint("query"))
            .basic_auth(&self.admin, Some(&self.password))
            .query(&[("recipient", self.broker_url.as_str())])
            .body(query.to_string())
            .send()
            .await?;

        match checked_body(response).await {
            Ok(body) => Ok(body),
            Err(e) => {
                error!(error = %e, query = %query, "Broker query failed");
                Err(e)
            },
        }
    }

    /// Fetch the JSON-LD description of one element.
    ///
    /// Identifiers that cannot be URIs (too short or without `:`) return
    /// `Ok(None)` without contacting the connector.
    pub async fn describe(&self, element_uri: &str) -> Result<Option<JsonLdDocument>> {
        if element_uri.len() < MIN_ELEMENT_ID_LEN || !element_uri.contains(':') {
            debug!(element = %element_uri, "Not an element identifier, skipping description");
            return Ok(None);
        }

        let response = self
            .client
            .post(self.endpoint("description"))
            .basic_auth(&self.admin, Some(&self.password))
            .query(&[
                ("recipient", self.broker_url.as_str()),
                ("elementId", element_uri),
            ])
            .send()
            .await?;

        let body = match checked_body(response).await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, element = %element_uri, "Broker description failed");
                return Err(e);
            },
        };

        let document = serde_json::from_str(&body)?;
        Ok(Some(document))
    }
}

/// Body of a successful response; anything above 299 or an empty body is a
/// transport failure.
async fn checked_body(response: Response) -> Result<String> {
    let status = response.status().as_u16();
    let body = response.text().await?;

    if status > 299 || body.is_empty() {
        return Err(IngestError::transport(status, body));
    }
    Ok(body)
}
