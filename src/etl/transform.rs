//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming a dataset
///
/// Implementors define how to transform data:
/// - Data cleaning (deduplication, renaming, filling gaps)
/// - Format conversion
/// - Validation
///
/// # Example
/// ```no_run
/// use table_indexer::etl::Transformer;
/// use eyre::Result;
///
/// struct Uppercase;
///
/// impl Transformer for Uppercase {
///     type Input = Vec<String>;
///     type Output = Vec<String>;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.into_iter().map(|s| s.to_uppercase()).collect())
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input dataset type
    type Input: Send;

    /// Output dataset type after transformation
    type Output: Send;

    /// Transform a complete dataset
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Identity transformer that passes data through unchanged
///
/// Use this when a pipeline step only moves data between a source and a
/// destination. The generic parameter T must be specified when creating
/// the transformer.
pub struct IdentityTransformer<T> {
    _phantom: std::marker::PhantomData<fn() -> T>,
}

impl<T> Default for IdentityTransformer<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> IdentityTransformer<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Send> Transformer for IdentityTransformer<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transformer() {
        let transformer = IdentityTransformer::<Vec<i32>>::new();
        let input = vec![1, 2, 3];
        let output = transformer.transform(input.clone()).unwrap();
        assert_eq!(input, output);
    }
}
