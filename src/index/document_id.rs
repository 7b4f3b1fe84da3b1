//! Document identifier strategies

use crate::error::EtlError;
use crate::records::RecordSet;
use crate::transform::MISSING_SENTINEL;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// How a row's document identifier is derived
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentIdStrategy {
    /// Zero-based row position in the clean record set
    ///
    /// A later run with fewer or reordered rows overwrites whatever shares
    /// a position and leaves documents past its length in place.
    #[default]
    Position,
    /// Value of the named column
    Column(String),
    /// SHA-256 of the document body, hex encoded
    ContentHash,
}

impl DocumentIdStrategy {
    /// Check that identifiers can be derived for every row
    ///
    /// Run before the first document is published, so a misconfigured
    /// column or a row without a key never leaves a partial load behind.
    pub fn validate(&self, set: &RecordSet) -> Result<(), EtlError> {
        let Self::Column(column) = self else {
            return Ok(());
        };
        let Some(index) = set.column_index(column) else {
            return Err(EtlError::index(format!(
                "id column '{}' not found in columns [{}]",
                column,
                set.columns.join(", ")
            )));
        };

        let missing: Vec<String> = set
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !is_key(row.get(index).and_then(|cell| cell.as_deref())))
            .map(|(position, _)| position.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EtlError::index(format!(
                "{} row(s) have no value in id column '{}': rows {}",
                missing.len(),
                column,
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Identifier for the document at `position` with the given body
    pub fn document_id(&self, position: usize, body: &Value) -> Result<String, EtlError> {
        match self {
            Self::Position => Ok(position.to_string()),
            Self::Column(column) => match body.get(column) {
                Some(Value::String(id)) if is_key(Some(id.as_str())) => Ok(id.clone()),
                _ => Err(EtlError::index(format!(
                    "row {} has no value in id column '{}'",
                    position, column
                ))),
            },
            Self::ContentHash => {
                let bytes = serde_json::to_vec(body)
                    .map_err(|e| EtlError::index(format!("cannot hash row {}: {}", position, e)))?;
                Ok(format!("{:x}", Sha256::digest(&bytes)))
            }
        }
    }
}

/// A usable business key: present, non-empty and not the missing-value placeholder
fn is_key(value: Option<&str>) -> bool {
    matches!(value, Some(id) if !id.is_empty() && id != MISSING_SENTINEL)
}

impl std::fmt::Display for DocumentIdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Column(column) => write!(f, "column '{}'", column),
            Self::ContentHash => write!(f, "content hash"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_position() {
        let body = json!({"name": "A"});
        assert_eq!(DocumentIdStrategy::Position.document_id(0, &body).unwrap(), "0");
        assert_eq!(DocumentIdStrategy::Position.document_id(41, &body).unwrap(), "41");
    }

    #[test]
    fn test_column() {
        let strategy = DocumentIdStrategy::Column("device_id".to_string());
        let body = json!({"device_id": "w-17", "bpm": "72"});
        assert_eq!(strategy.document_id(3, &body).unwrap(), "w-17");

        let missing = json!({"bpm": "72"});
        assert!(matches!(
            strategy.document_id(3, &missing),
            Err(EtlError::Index(_))
        ));
    }

    #[test]
    fn test_placeholder_is_not_a_key() {
        let strategy = DocumentIdStrategy::Column("device_id".to_string());
        let body = json!({"device_id": "N/A", "bpm": "72"});
        assert!(matches!(
            strategy.document_id(0, &body),
            Err(EtlError::Index(_))
        ));
    }

    #[test]
    fn test_column_validate_rejects_missing_keys() {
        let set = RecordSet::with_rows(
            vec!["device_id".to_string(), "bpm".to_string()],
            vec![
                vec![Some("N/A".to_string()), Some("60".to_string())],
                vec![Some("w1".to_string()), Some("70".to_string())],
                vec![None, Some("80".to_string())],
            ],
        )
        .unwrap();
        let strategy = DocumentIdStrategy::Column("device_id".to_string());

        let err = strategy.validate(&set).unwrap_err();
        assert!(matches!(err, EtlError::Index(_)));
        assert!(err.to_string().contains("rows 0, 2"), "{}", err);
    }

    #[test]
    fn test_column_validate() {
        let set = RecordSet::new(vec!["bpm".to_string()]);
        let strategy = DocumentIdStrategy::Column("device_id".to_string());
        assert!(strategy.validate(&set).is_err());
        assert!(DocumentIdStrategy::Position.validate(&set).is_ok());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let strategy = DocumentIdStrategy::ContentHash;
        let a = strategy.document_id(0, &json!({"name": "A"})).unwrap();
        let b = strategy.document_id(9, &json!({"name": "A"})).unwrap();
        let c = strategy.document_id(0, &json!({"name": "B"})).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
