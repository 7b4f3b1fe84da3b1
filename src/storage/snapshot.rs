//! CSV snapshot files
//!
//! Snapshots hand a complete record set from one step to the next: a
//! header row, then one record per line. Null cells are written as empty
//! fields and read back as `None`.

use crate::error::EtlError;
use crate::etl::{Extractor, Loader};
use crate::records::RecordSet;
use eyre::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Read a snapshot from a CSV file
pub struct CsvReader {
    path: PathBuf,
}

impl CsvReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the whole snapshot
    ///
    /// Header names are returned verbatim, including surrounding whitespace.
    ///
    /// # Errors
    /// Returns [`EtlError::Transform`] if the file is missing, unreadable,
    /// or has rows whose width differs from the header
    pub fn read(&self) -> Result<RecordSet> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| {
                EtlError::transform(format!(
                    "cannot open snapshot {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| self.malformed(e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut set = RecordSet::new(columns);
        for record in reader.records() {
            let record = record.map_err(|e| self.malformed(e))?;
            let row = record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect();
            set.push_row(row)
                .map_err(|e| EtlError::transform(format!("{}: {}", self.path.display(), e)))?;
        }

        log::debug!(
            "Read {} row(s) x {} column(s) from {}",
            set.len(),
            set.width(),
            self.path.display()
        );
        Ok(set)
    }

    fn malformed(&self, err: csv::Error) -> EtlError {
        EtlError::transform(format!(
            "malformed snapshot {}: {}",
            self.path.display(),
            err
        ))
    }
}

impl Extractor for CsvReader {
    type Output = RecordSet;

    async fn extract(&self) -> Result<Self::Output> {
        self.read()
    }
}

/// Write a snapshot to a CSV file
///
/// The file is replaced atomically: rows go to a temporary file next to
/// the destination, which is renamed over it once everything is flushed.
/// A failed write leaves the previous snapshot untouched.
pub struct CsvWriter {
    path: PathBuf,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write the record set, replacing any previous snapshot
    pub fn write(&self, set: &RecordSet) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot directory: {}", dir.display()))?;

        let temp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

        let mut writer = csv::Writer::from_writer(temp);
        writer
            .write_record(&set.columns)
            .with_context(|| "Failed to write snapshot header")?;
        for row in &set.rows {
            writer
                .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
                .with_context(|| "Failed to write snapshot row")?;
        }

        let mut temp = writer
            .into_inner()
            .map_err(|e| eyre::eyre!("Failed to flush snapshot: {}", e.error()))?;
        temp.flush()?;
        temp.as_file()
            .sync_all()
            .with_context(|| "Failed to sync snapshot")?;

        temp.persist(&self.path)
            .with_context(|| format!("Failed to replace snapshot: {}", self.path.display()))?;

        log::debug!(
            "Wrote {} row(s) x {} column(s) to {}",
            set.len(),
            set.width(),
            self.path.display()
        );
        Ok(())
    }
}

impl Loader for CsvWriter {
    type Item = RecordSet;

    async fn load(&self, items: Self::Item) -> Result<usize> {
        self.write(&items)?;
        Ok(items.len())
    }
}
