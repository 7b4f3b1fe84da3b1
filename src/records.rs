//! Tabular record sets passed between pipeline stages
//!
//! A [`RecordSet`] is the fully materialized output of one stage: the
//! ordered column names of the source table and every row, each row
//! positionally aligned with the columns. Cells are rendered as text and
//! `None` marks a null.

use crate::etl::Batch;
use eyre::Result;
use serde_json::{Map, Value};

/// A single cell; `None` is a null (or, after a CSV round trip, an empty field)
pub type Cell = Option<String>;

/// A single row, aligned with [`RecordSet::columns`]
pub type Row = Vec<Cell>;

/// Ordered rows over ordered columns
///
/// Column names may repeat. Two distinct source columns can normalize to
/// the same name, and both columns are kept so that column count stays
/// fixed across cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RecordSet {
    /// Create an empty record set with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a record set from columns and rows, checking every row's width
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row)?;
        }
        Ok(set)
    }

    /// Append a row
    ///
    /// # Errors
    /// Returns an error if the row does not have one cell per column
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            eyre::bail!(
                "Row {} has {} cell(s), expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Position of the last column with this name
    ///
    /// The last one is used because it is the one that survives in
    /// document form (see [`RecordSet::to_document`]).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().rposition(|c| c == name)
    }

    /// Render a row as a JSON object of `column -> value`
    ///
    /// Duplicate column names collapse: the later column's value wins, and
    /// the key keeps the position of its first occurrence. Nulls become
    /// JSON `null`.
    pub fn to_document(&self, row: &Row) -> Value {
        let mut doc = Map::with_capacity(self.columns.len());
        for (column, cell) in self.columns.iter().zip(row) {
            let value = match cell {
                Some(text) => Value::String(text.clone()),
                None => Value::Null,
            };
            doc.insert(column.clone(), value);
        }
        Value::Object(doc)
    }

    /// Every row rendered with [`RecordSet::to_document`]
    pub fn documents(&self) -> impl Iterator<Item = Value> + '_ {
        self.rows.iter().map(|row| self.to_document(row))
    }
}

impl Batch for RecordSet {
    fn len(&self) -> usize {
        self.rows.len()
    }
}
