//! HTTP client for the paginated content source.
//!
//! The engine talks to a single request/response endpoint: it POSTs a query
//! descriptor selecting one resource collection, a page size, and an
//! optional cursor, and receives the envelope parsed by
//! [`crate::types::QueryResponse`]. The [`PageSource`] trait is the seam
//! the paginator and orchestrator consume, so tests can substitute
//! in-memory doubles without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, instrument};

use crate::types::{EntityPage, QueryResponse};
use crate::{Error, Result};

/// Default timeout for a single page request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Descriptor for one page request against one collection.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Wire name of the resource collection (e.g. `products`).
    pub collection: String,
    /// Field selection for each node, already rendered as query text.
    pub selection: String,
    /// Maximum nodes per page.
    pub page_size: u32,
    /// Cursor from the previous page; `None` means start of collection.
    pub cursor: Option<String>,
    /// Endpoint override for this collection; `None` uses the client's
    /// default endpoint.
    pub endpoint: Option<String>,
}

impl PageRequest {
    /// The same request positioned at `cursor`.
    #[must_use]
    pub fn at_cursor(&self, cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    /// Render the query document for this request.
    #[must_use]
    pub fn query_text(&self) -> String {
        format!(
            "query Collect($first: Int!, $after: String) {{ {collection}(first: $first, after: $after) {{ pageInfo {{ hasNextPage endCursor }} nodes {{ {selection} }} }} }}",
            collection = self.collection,
            selection = self.selection,
        )
    }
}

/// A source of entity pages.
///
/// Implemented by [`ContentClient`] for real HTTP traffic and by in-memory
/// doubles in tests. One call corresponds to one fetch attempt.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a single page of the requested collection.
    async fn fetch_page(&self, request: &PageRequest) -> Result<EntityPage>;
}

/// HTTP client for the content source endpoint.
pub struct ContentClient {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl ContentClient {
    /// Create a client for `endpoint` with default settings.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout (primarily for tests).
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("routescout/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            auth_token: None,
        })
    }

    /// Attach a bearer token passed through to every request.
    ///
    /// The engine performs no auth logic of its own; the token is supplied
    /// by the build orchestrator and forwarded verbatim.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// The default endpoint this client targets.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageSource for ContentClient {
    #[instrument(skip_all, fields(collection = %request.collection, cursor = ?request.cursor))]
    async fn fetch_page(&self, request: &PageRequest) -> Result<EntityPage> {
        let endpoint = request.endpoint.as_deref().unwrap_or(&self.endpoint);
        let body = serde_json::json!({
            "query": request.query_text(),
            "variables": { "first": request.page_size, "after": request.cursor },
        });

        let mut http = self.client.post(endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            http = http.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = http.send().await?;
        let response = response.error_for_status().map_err(Error::Network)?;
        let envelope: QueryResponse = response.json().await?;
        let page = envelope.into_page(&request.collection)?;

        debug!(
            nodes = page.nodes.len(),
            has_next = page.has_next,
            "fetched page"
        );
        Ok(page)
    }
}
