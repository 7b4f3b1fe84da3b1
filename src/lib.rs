//! Table Indexer
//!
//! Extracts one PostgreSQL table, cleans it, and indexes every row as a
//! document in Elasticsearch, with CSV snapshots between the steps.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod index;
pub mod job;
pub mod records;
pub mod scheduler;
pub mod source;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use client::{Auth, ElasticsearchClient};
pub use config::PipelineConfig;
pub use error::EtlError;
pub use etl::{Extractor, IdentityTransformer, Loader, Pipeline, Transformer};
pub use index::{DocumentIdStrategy, DocumentIndex, IndexLoader};
pub use job::{Job, Step};
pub use records::RecordSet;
pub use scheduler::{RetryPolicy, RunReport, Scheduler};
pub use source::PostgresExtractor;
pub use storage::{CsvReader, CsvWriter};
pub use transform::Cleaner;
