//! Elasticsearch client module
//!
//! Provides `ElasticsearchClient` for publishing documents over the
//! Elasticsearch REST API.

use super::Auth;
use crate::error::EtlError;
use crate::index::DocumentIndex;
use eyre::{Result, eyre};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use url::Url;

/// Elasticsearch client for indexing documents.
///
/// # Example
/// ```no_run
/// use table_indexer::client::{Auth, ElasticsearchClient};
/// use table_indexer::index::DocumentIndex;
/// use serde_json::json;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200")?;
/// let client = ElasticsearchClient::try_new(url, Auth::None)?;
///
/// client.ping().await?;
/// client
///     .index_document("smartwatch_data", "0", &json!({"name": "A"}))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    client: Client,
    url: Url,
}

impl ElasticsearchClient {
    /// Create a new client from a base URL and credentials.
    ///
    /// # Errors
    /// Returns an error if the credentials are not a valid header value or
    /// the HTTP client cannot be built
    pub fn try_new(url: Url, auth: Auth) -> Result<Self> {
        if url.cannot_be_a_base() {
            eyre::bail!("Index URL cannot be used as a base: {}", url);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(value) = auth.header_value() {
            headers.insert(reqwest::header::AUTHORIZATION, value.parse()?);
        }
        let client = Client::builder().default_headers(headers).build()?;

        log::debug!("Created Elasticsearch client for {} (auth: {})", url, auth);
        Ok(Self { client, url })
    }

    /// URL of a single document: `{base}/{index}/_doc/{id}`
    ///
    /// Segments are percent-encoded, so identifiers may contain `/`.
    pub fn document_url(&self, index: &str, id: &str) -> Result<Url> {
        let mut url = self.url.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("Index URL cannot be used as a base: {}", self.url))?
            .pop_if_empty()
            .push(index)
            .push("_doc")
            .push(id);
        Ok(url)
    }

    /// Verify the destination is reachable and accepts our credentials.
    pub async fn ping(&self) -> Result<()> {
        let response = self.send(Method::GET, self.url.clone(), None).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::connectivity(format!(
                "{} answered {}: {}",
                self.url, status, body
            ))
            .into());
        }
        log::debug!("Elasticsearch at {} is reachable", self.url);
        Ok(())
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        let request = self.client.request(method, url.clone());
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        request.send().await.map_err(|e| {
            EtlError::connectivity(format!("failed to reach {}: {}", url, e)).into()
        })
    }
}

impl DocumentIndex for ElasticsearchClient {
    async fn index_document(&self, index: &str, id: &str, body: &Value) -> Result<()> {
        let url = self.document_url(index, id)?;
        let response = self.send(Method::PUT, url, Some(body)).await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        let message = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("not authorized to index into '{}' ({}): {}", index, status, text)
            }
            _ => format!(
                "document '{}' rejected by '{}' ({}): {}",
                id, index, status, text
            ),
        };
        Err(EtlError::index(message).into())
    }
}

impl std::fmt::Display for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
