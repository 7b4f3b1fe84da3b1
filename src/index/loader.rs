//! Search index loader
//!
//! Publishes every row of a clean record set as its own document.

use super::{DocumentIdStrategy, DocumentIndex};
use crate::etl::Loader;
use crate::records::RecordSet;
use eyre::{Context, Result};

/// Loader that indexes one document per row
///
/// Rows are published strictly in order with one call each. The first
/// failure stops the loop and is returned; documents indexed before it
/// stay in the index.
///
/// # Example
/// ```no_run
/// use table_indexer::client::{Auth, ElasticsearchClient};
/// use table_indexer::etl::Loader;
/// use table_indexer::index::IndexLoader;
/// use table_indexer::records::RecordSet;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("http://localhost:9200")?;
/// let client = ElasticsearchClient::try_new(url, Auth::None)?;
/// let loader = IndexLoader::new(client, "smartwatch_data");
///
/// let set = RecordSet::with_rows(
///     vec!["name".to_string()],
///     vec![vec![Some("A".to_string())]],
/// )?;
/// let count = loader.load(set).await?;
/// assert_eq!(count, 1);
/// # Ok(())
/// # }
/// ```
pub struct IndexLoader<I> {
    client: I,
    index: String,
    ids: DocumentIdStrategy,
}

impl<I: DocumentIndex> IndexLoader<I> {
    /// Create a loader using positional document identifiers
    pub fn new(client: I, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            ids: DocumentIdStrategy::Position,
        }
    }

    /// Set how document identifiers are derived (default: position)
    pub fn with_ids(mut self, ids: DocumentIdStrategy) -> Self {
        self.ids = ids;
        self
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

impl<I: DocumentIndex> Loader for IndexLoader<I> {
    type Item = RecordSet;

    async fn load(&self, items: Self::Item) -> Result<usize> {
        if items.is_empty() {
            log::info!("No documents to index into '{}'", self.index);
            return Ok(0);
        }

        self.ids.validate(&items)?;

        log::debug!(
            "Indexing {} document(s) into '{}' keyed by {}",
            items.len(),
            self.index,
            self.ids
        );

        let mut indexed = 0;
        for (position, body) in items.documents().enumerate() {
            let id = self.ids.document_id(position, &body)?;
            self.client
                .index_document(&self.index, &id, &body)
                .await
                .with_context(|| {
                    format!(
                        "Failed to index document '{}' (row {}); {} document(s) already indexed",
                        id, position, indexed
                    )
                })?;
            log::trace!("Indexed document '{}'", id);
            indexed += 1;
        }

        log::info!("Indexed {} document(s) into '{}'", indexed, self.index);
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EtlError, classify};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// In-memory index that can be told to fail on a given call
    #[derive(Clone, Default)]
    struct MemoryIndex {
        docs: Arc<Mutex<BTreeMap<String, Value>>>,
        calls: Arc<Mutex<usize>>,
        fail_on_call: Option<usize>,
    }

    impl DocumentIndex for MemoryIndex {
        async fn index_document(&self, index: &str, id: &str, body: &Value) -> Result<()> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if self.fail_on_call == Some(call) {
                return Err(EtlError::index(format!("{}: rejected {}", index, id)).into());
            }
            self.docs
                .lock()
                .unwrap()
                .insert(id.to_string(), body.clone());
            Ok(())
        }
    }

    fn rows(values: &[&str]) -> RecordSet {
        RecordSet::with_rows(
            vec!["name".to_string()],
            values.iter().map(|v| vec![Some(v.to_string())]).collect(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_positional_ids() {
        let index = MemoryIndex::default();
        let loader = IndexLoader::new(index.clone(), "smartwatch_data");

        let count = loader.load(rows(&["a", "b", "c"])).await.unwrap();
        assert_eq!(count, 3);

        let docs = index.docs.lock().unwrap();
        let ids: Vec<&String> = docs.keys().collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(docs["1"], json!({"name": "b"}));
    }

    #[tokio::test]
    async fn test_shorter_rerun_leaves_stale_document() {
        let index = MemoryIndex::default();
        let loader = IndexLoader::new(index.clone(), "smartwatch_data");

        loader.load(rows(&["a", "b", "c"])).await.unwrap();
        loader.load(rows(&["x", "y"])).await.unwrap();

        let docs = index.docs.lock().unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs["0"], json!({"name": "x"}));
        assert_eq!(docs["1"], json!({"name": "y"}));
        assert_eq!(docs["2"], json!({"name": "c"}));
    }

    #[tokio::test]
    async fn test_failure_stops_loop_and_keeps_earlier_documents() {
        let index = MemoryIndex {
            fail_on_call: Some(2),
            ..Default::default()
        };
        let loader = IndexLoader::new(index.clone(), "smartwatch_data");

        let err = loader.load(rows(&["a", "b", "c"])).await.unwrap_err();

        assert!(matches!(classify(&err), Some(EtlError::Index(_))));
        assert_eq!(*index.calls.lock().unwrap(), 2);
        let docs = index.docs.lock().unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["0"]);
    }

    #[tokio::test]
    async fn test_column_ids() {
        let index = MemoryIndex::default();
        let loader = IndexLoader::new(index.clone(), "smartwatch_data")
            .with_ids(DocumentIdStrategy::Column("name".to_string()));

        loader.load(rows(&["a", "b"])).await.unwrap();
        loader.load(rows(&["b"])).await.unwrap();

        let docs = index.docs.lock().unwrap();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_id_column_indexes_nothing() {
        let index = MemoryIndex::default();
        let loader = IndexLoader::new(index.clone(), "smartwatch_data")
            .with_ids(DocumentIdStrategy::Column("device_id".to_string()));

        let err = loader.load(rows(&["a"])).await.unwrap_err();
        assert!(matches!(classify(&err), Some(EtlError::Index(_))));
        assert_eq!(*index.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_set() {
        let index = MemoryIndex::default();
        let loader = IndexLoader::new(index.clone(), "smartwatch_data");

        assert_eq!(loader.load(rows(&[])).await.unwrap(), 0);
        assert_eq!(*index.calls.lock().unwrap(), 0);
    }
}
