//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// A dataset whose size can be reported between stages
pub trait Batch {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Batch for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// Stages run strictly in order and each one receives the complete output
/// of the previous one. A failing stage aborts the pipeline before the
/// next stage starts.
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Output)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use table_indexer::etl::Pipeline;
/// # use table_indexer::etl::{Extractor, IdentityTransformer, Loader};
/// # use eyre::Result;
/// # struct MyExtractor;
/// # impl Extractor for MyExtractor {
/// #     type Output = Vec<i32>;
/// #     async fn extract(&self) -> Result<Self::Output> { Ok(vec![]) }
/// # }
/// # struct MyLoader;
/// # impl Loader for MyLoader {
/// #     type Item = Vec<i32>;
/// #     async fn load(&self, items: Self::Item) -> Result<usize> { Ok(items.len()) }
/// # }
///
/// # async fn example() -> Result<()> {
/// let pipeline = Pipeline::new(
///     MyExtractor,
///     IdentityTransformer::new(),
///     MyLoader,
/// );
///
/// let count = pipeline.run().await?;
/// println!("Processed {} records", count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    E::Output: Batch,
    T: Transformer<Input = E::Output>,
    T::Output: Batch,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract the dataset from the source
    /// 2. Transform it
    /// 3. Load it to the destination
    ///
    /// Returns the number of records successfully loaded
    ///
    /// # Errors
    /// Returns an error if any stage fails
    pub async fn run(&self) -> Result<usize> {
        log::debug!("Extracting from source...");
        let extracted = self.extractor.extract().await?;
        log::debug!("Extracted {} record(s)", extracted.len());

        if extracted.is_empty() {
            log::warn!("No records extracted, loading an empty dataset");
        }

        log::debug!("Transforming records...");
        let transformed = self.transformer.transform(extracted)?;
        log::debug!("Transformed into {} record(s)", transformed.len());

        log::debug!("Loading to destination...");
        let count = self.loader.load(transformed).await?;
        log::debug!("Loaded {} record(s)", count);

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::IdentityTransformer;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockExtractor(Vec<i32>);

    impl Extractor for MockExtractor {
        type Output = Vec<i32>;
        async fn extract(&self) -> Result<Self::Output> {
            Ok(self.0.clone())
        }
    }

    struct FailingExtractor;

    impl Extractor for FailingExtractor {
        type Output = Vec<i32>;
        async fn extract(&self) -> Result<Self::Output> {
            eyre::bail!("source unreachable")
        }
    }

    struct DoubleTransformer;

    impl Transformer for DoubleTransformer {
        type Input = Vec<i32>;
        type Output = Vec<i32>;
        fn transform(&self, input: Self::Input) -> Result<Self::Output> {
            Ok(input.into_iter().map(|i| i * 2).collect())
        }
    }

    struct SumLoader {
        sum: Arc<Mutex<i32>>,
        called: Arc<AtomicBool>,
    }

    impl Loader for SumLoader {
        type Item = Vec<i32>;
        async fn load(&self, items: Self::Item) -> Result<usize> {
            self.called.store(true, Ordering::SeqCst);
            *self.sum.lock().unwrap() = items.iter().sum();
            Ok(items.len())
        }
    }

    fn sum_loader() -> (SumLoader, Arc<Mutex<i32>>, Arc<AtomicBool>) {
        let sum = Arc::new(Mutex::new(0));
        let called = Arc::new(AtomicBool::new(false));
        let loader = SumLoader {
            sum: sum.clone(),
            called: called.clone(),
        };
        (loader, sum, called)
    }

    #[tokio::test]
    async fn test_pipeline() {
        let (loader, sum, _) = sum_loader();
        let pipeline = Pipeline::new(MockExtractor(vec![1, 2, 3]), DoubleTransformer, loader);

        let count = pipeline.run().await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(*sum.lock().unwrap(), 12); // (1+2+3)*2 = 12
    }

    #[tokio::test]
    async fn test_empty_pipeline_still_loads() {
        let (loader, _, called) = sum_loader();
        let pipeline = Pipeline::new(MockExtractor(vec![]), IdentityTransformer::new(), loader);

        let count = pipeline.run().await.unwrap();
        assert_eq!(count, 0);
        assert!(called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_extract_skips_load() {
        let (loader, _, called) = sum_loader();
        let pipeline = Pipeline::new(FailingExtractor, DoubleTransformer, loader);

        let err = pipeline.run().await.unwrap_err();
        assert!(err.to_string().contains("source unreachable"));
        assert!(!called.load(Ordering::SeqCst));
    }
}
