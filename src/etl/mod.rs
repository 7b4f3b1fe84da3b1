//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides trait definitions for building data pipelines
//! that extract a dataset from a source, transform it, and load it to a
//! destination. Each stage hands the next one its complete output.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{Batch, Pipeline};
pub use transform::{IdentityTransformer, Transformer};
