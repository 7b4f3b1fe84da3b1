//! Extractor trait for data extraction from various sources

use eyre::Result;

/// Extractor trait for extracting a dataset from a source
///
/// Implementors define how to extract data from sources like:
/// - Relational databases
/// - Intermediate snapshot files
///
/// # Example
/// ```no_run
/// use table_indexer::etl::Extractor;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct LinesExtractor {
///     path: PathBuf,
/// }
///
/// impl Extractor for LinesExtractor {
///     type Output = Vec<String>;
///
///     async fn extract(&self) -> Result<Self::Output> {
///         let content = std::fs::read_to_string(&self.path)?;
///         Ok(content.lines().map(str::to_string).collect())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The extracted dataset
    type Output: Send;

    /// Extract the complete dataset from the source
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, I/O, query, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Self::Output>> + Send;
}
