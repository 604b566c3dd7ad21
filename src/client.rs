//! PQL streaming client.
//!
//! This module provides the main `Client` type for executing streaming queries
//! against a PQL server.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::coerce::coerce;
use crate::config::{ClientConfig, Settings};
use crate::error::{Error, Result};
use crate::parser::JsonArrayParser;
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use crate::types::{QueryPlan, ServiceSchema};
use crate::value::Value;

/// Lazily-produced, single-pass sequence of query results.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Value>> + Send>>;

/// PQL streaming client.
///
/// This client executes PQL queries and returns results as an async stream,
/// so result sets of any size can be processed without loading them into
/// memory. A client is cheap to clone and can run any number of queries
/// concurrently; each query owns its own connection and parser.
///
/// # Example
///
/// ```ignore
/// use pql_stream::Client;
/// use futures::StreamExt;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new("localhost:8080", "test_1")?;
///
///     let mut stream = client.query("people { name ~ 'foo' }").await?;
///     while let Some(record) = stream.next().await {
///         let record = record?;
///         println!("Got: {}", record);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Client {
    /// Create a client for `namespace` on `server_address` (API `v1`, no
    /// date coercion).
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the address does not include a port.
    pub fn new(server_address: &str, namespace: &str) -> Result<Self> {
        let config = Settings::new(server_address, namespace).build()?;
        Ok(Self::from_config(config))
    }

    /// Create a client from a validated configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(ReqwestTransport::new(), config)
    }

    /// Create a new client with a custom reqwest client.
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_http_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self::with_transport(ReqwestTransport::with_client(http), config)
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(transport: impl Transport + 'static, config: ClientConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            config,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A client for another namespace on the same server, sharing the transport.
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let endpoint = self.config.endpoint().with_namespace(namespace);
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.with_endpoint(endpoint),
        }
    }

    /// A client for another API version of the same namespace.
    pub fn with_version(&self, version: &str) -> Self {
        let endpoint = self.config.endpoint().with_version(version);
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.with_endpoint(endpoint),
        }
    }

    /// Execute a PQL query and return results as an async stream.
    ///
    /// The returned future resolves once the response headers have arrived;
    /// the body is parsed only as the stream is polled. Each item is one
    /// element of the server's result array. Dropping the stream early closes
    /// the connection.
    ///
    /// # Errors
    ///
    /// - [`Error::Query`] if the server answers with status 400 or above; the
    ///   error carries the response body.
    /// - [`Error::Http`] if the request cannot be sent.
    ///
    /// Items of the stream fail with [`Error::Parse`] (malformed or truncated
    /// body) or [`Error::Io`]; the stream ends after the first failure.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures::StreamExt;
    ///
    /// let mut stream = client.query("people{}").await?;
    ///
    /// let mut count = 0;
    /// while let Some(result) = stream.next().await {
    ///     let record = result?;
    ///     count += 1;
    /// }
    /// println!("Processed {} records", count);
    /// ```
    pub async fn query(&self, pql: &str) -> Result<RecordStream> {
        let url = with_query(self.config.endpoint().query_url(), pql);
        let response = self.send(url).await?;

        let reader = StreamReader::new(response.into_body());
        let mut parser = JsonArrayParser::new(reader);
        let coerce_dates = self.config.coerce_dates();

        let s = stream! {
            loop {
                match parser.next().await {
                    Ok(Some(record)) if coerce_dates => yield Ok(coerce(&record)),
                    Ok(Some(record)) => yield Ok(record),
                    Ok(None) => {
                        debug!(records = parser.emitted(), "Query stream finished");
                        break;
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        Ok(Box::pin(s))
    }

    /// Execute a PQL query and collect all results into a Vec.
    ///
    /// **Warning**: This loads all results into memory. For large result sets,
    /// use `query()` instead to process records one at a time.
    pub async fn query_all(&self, pql: &str) -> Result<Vec<Value>> {
        let mut stream = self.query(pql).await?;
        let mut results = Vec::new();

        while let Some(item) = stream.next().await {
            results.push(item?);
        }

        Ok(results)
    }

    /// Ask the server for the SQL it would run for `pql`.
    pub async fn plan(&self, pql: &str) -> Result<QueryPlan> {
        let url = with_query(self.config.endpoint().resource_url("plan"), pql);
        self.fetch_json(url).await
    }

    /// List the entities of the configured namespace and version.
    pub async fn describe(&self) -> Result<Value> {
        let url = self.config.endpoint().resource_url("describe");
        self.fetch_json::<serde_json::Value>(url).await.map(Value::from)
    }

    /// Describe the fields of one entity.
    pub async fn describe_entity(&self, entity: &str) -> Result<Value> {
        let url = self
            .config
            .endpoint()
            .resource_url(&format!("describe/{}", entity));
        self.fetch_json::<serde_json::Value>(url).await.map(Value::from)
    }

    /// Fetch the schema of every namespace and version the server exposes.
    pub async fn describe_all(&self) -> Result<ServiceSchema> {
        let url = self.config.endpoint().describe_all_url();
        self.fetch_json(url).await
    }

    /// Send a GET and turn error statuses into [`Error::Query`].
    async fn send(&self, url: Url) -> Result<RawResponse> {
        debug!(url = %url, "Sending PQL request");
        let response = self.transport.get(url).await?;

        if response.is_error() {
            let status = response.status();
            let body = response.text().await?;
            warn!(status, body = %body, "PQL server returned an error");
            return Err(Error::Query { status, body });
        }

        debug!(status = response.status(), "PQL response headers received");
        Ok(response)
    }

    /// Small responses that are read whole and decoded.
    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let body = self.send(url).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Append `?query=<pql>`, form-encoded.
fn with_query(mut url: Url, pql: &str) -> Url {
    url.query_pairs_mut().append_pair("query", pql);
    url
}
