//! Loader trait for loading data to destinations

use eyre::Result;

/// Loader trait for loading a dataset to a destination
///
/// Implementors define how to load data to destinations:
/// - Search indexes
/// - Intermediate snapshot files
///
/// # Example
/// ```no_run
/// use table_indexer::etl::Loader;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct LinesLoader {
///     path: PathBuf,
/// }
///
/// impl Loader for LinesLoader {
///     type Item = Vec<String>;
///
///     async fn load(&self, items: Self::Item) -> Result<usize> {
///         std::fs::write(&self.path, items.join("\n"))?;
///         Ok(items.len())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The dataset accepted by this loader
    type Item: Send;

    /// Load the dataset to the destination
    ///
    /// Returns the number of records successfully loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (network, I/O, validation, etc.)
    fn load(&self, items: Self::Item) -> impl std::future::Future<Output = Result<usize>> + Send;
}
