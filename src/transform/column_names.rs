//! Column-name normalization

use crate::error::EtlError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// What to do when two source columns normalize to the same name
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Keep both columns; in document form the later one overwrites the earlier
    #[default]
    LastWriteWins,
    /// Fail the clean step
    Reject,
}

impl FromStr for CollisionPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last_write_wins" | "last-write-wins" => Ok(Self::LastWriteWins),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unknown collision policy '{}' (expected last_write_wins or reject)",
                other
            )),
        }
    }
}

/// Normalize a single column name
///
/// Trims surrounding whitespace, lowercases, turns spaces into underscores
/// and removes `|`. The result is trimmed once more, since removing a pipe
/// can expose whitespace such as a tab at either end.
///
/// ```
/// use table_indexer::transform::normalize_column_name;
///
/// assert_eq!(normalize_column_name("  Heart Rate|BPM "), "heart_ratebpm");
/// assert_eq!(normalize_column_name("A B"), normalize_column_name("a |B"));
/// ```
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('|', "")
        .trim()
        .to_string()
}

/// Normalize every column name, keeping order and count
///
/// Collisions are reported through `policy`: with
/// [`CollisionPolicy::LastWriteWins`] each one is logged and both columns
/// are kept; with [`CollisionPolicy::Reject`] the first one found is
/// returned as an error.
pub fn normalize_columns(
    columns: &[String],
    policy: CollisionPolicy,
) -> Result<Vec<String>, EtlError> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(columns.len());
    let mut normalized = Vec::with_capacity(columns.len());

    for original in columns {
        let name = normalize_column_name(original);
        if let Some(first) = seen.insert(name.clone(), original.as_str()) {
            match policy {
                CollisionPolicy::Reject => {
                    return Err(EtlError::ColumnCollision {
                        first: first.to_string(),
                        second: original.clone(),
                        normalized: name,
                    });
                }
                CollisionPolicy::LastWriteWins => {
                    log::warn!(
                        "Columns {:?} and {:?} both normalize to {:?}; the later column wins in indexed documents",
                        first,
                        original,
                        name
                    );
                }
            }
        }
        normalized.push(name);
    }

    Ok(normalized)
}
