//! Publishing clean record sets to a search index
//!
//! [`DocumentIndex`] is the seam between the loader and the search
//! service; [`ElasticsearchClient`](crate::client::ElasticsearchClient)
//! is the production implementation.

mod document_id;
mod loader;

pub use document_id::DocumentIdStrategy;
pub use loader::IndexLoader;

use eyre::Result;
use serde_json::Value;

/// A destination that stores one document per call
pub trait DocumentIndex: Send + Sync {
    /// Create or replace the document `id` in `index` with `body`
    ///
    /// # Errors
    /// Returns an error if the service is unreachable or rejects the document
    fn index_document(
        &self,
        index: &str,
        id: &str,
        body: &Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
