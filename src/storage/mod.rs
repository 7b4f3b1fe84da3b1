//! File system storage for intermediate snapshots
//!
//! Each run writes two snapshots at fixed paths: the raw extraction and
//! the cleaned record set. Every run overwrites the previous run's files.

mod snapshot;

pub use snapshot::{CsvReader, CsvWriter};
