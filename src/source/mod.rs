//! Relational sources
//!
//! The extract step reads one table in full. [`PostgresExtractor`] is the
//! production source; anything implementing
//! [`Extractor<Output = RecordSet>`](crate::etl::Extractor) can stand in
//! for it.

mod postgres;

pub use postgres::{PostgresExtractor, quote_ident};
