//! Record set cleaner

use super::column_names::{CollisionPolicy, normalize_columns};
use crate::etl::Transformer;
use crate::records::{RecordSet, Row};
use eyre::Result;
use std::collections::HashSet;

/// Placeholder written into every missing cell
pub const MISSING_SENTINEL: &str = "N/A";

/// Transformer that turns a raw snapshot into a clean one
///
/// Rules, applied in order:
/// 1. Rows identical in every cell collapse to their first occurrence;
///    survivors keep their relative order
/// 2. Column names go through [`normalize_column_name`](super::normalize_column_name)
/// 3. Null and empty cells become [`MISSING_SENTINEL`]
///
/// Columns are never added or dropped, and rows never multiply.
///
/// # Example
/// ```
/// use table_indexer::etl::Transformer;
/// use table_indexer::records::RecordSet;
/// use table_indexer::transform::Cleaner;
///
/// let raw = RecordSet::with_rows(
///     vec!["Name ".to_string(), "Val".to_string()],
///     vec![
///         vec![Some("A".to_string()), Some("1".to_string())],
///         vec![Some("A".to_string()), Some("1".to_string())],
///         vec![Some("A".to_string()), None],
///     ],
/// )
/// .unwrap();
///
/// let clean = Cleaner::default().transform(raw).unwrap();
/// assert_eq!(clean.columns, vec!["name", "val"]);
/// assert_eq!(clean.len(), 2);
/// assert_eq!(clean.rows[1][1].as_deref(), Some("N/A"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    collisions: CollisionPolicy,
}

impl Cleaner {
    pub fn new(collisions: CollisionPolicy) -> Self {
        Self { collisions }
    }

    /// Drop rows that exactly repeat an earlier row
    fn deduplicate(rows: Vec<Row>) -> Vec<Row> {
        let mut seen: HashSet<Row> = HashSet::with_capacity(rows.len());
        rows.into_iter()
            .filter(|row| seen.insert(row.clone()))
            .collect()
    }

    fn fill_missing(row: Row) -> Row {
        row.into_iter()
            .map(|cell| match cell {
                Some(text) if !text.is_empty() => Some(text),
                _ => Some(MISSING_SENTINEL.to_string()),
            })
            .collect()
    }
}

impl Transformer for Cleaner {
    type Input = RecordSet;
    type Output = RecordSet;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let RecordSet { columns, rows } = input;
        let raw_count = rows.len();

        let rows = Self::deduplicate(rows);
        if rows.len() < raw_count {
            log::info!("Removed {} duplicate row(s)", raw_count - rows.len());
        }

        let columns = normalize_columns(&columns, self.collisions)?;

        let mut filled = 0;
        let rows = rows
            .into_iter()
            .map(|row| {
                filled += row
                    .iter()
                    .filter(|cell| cell.as_deref().is_none_or(str::is_empty))
                    .count();
                Self::fill_missing(row)
            })
            .collect();
        log::debug!("Filled {} missing cell(s) with {:?}", filled, MISSING_SENTINEL);

        Ok(RecordSet { columns, rows })
    }
}
