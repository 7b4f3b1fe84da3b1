//! Run configuration
//!
//! Configuration is layered:
//! 1. Built-in defaults
//! 2. An optional YAML file
//! 3. `ETL_*` environment variables (usually sourced from a `.env` file)
//!
//! Example file:
//! ```yaml
//! source:
//!   host: localhost
//!   port: 5432
//!   database: postgres
//!   user: postgres
//!   password: postgres
//!   schema: public
//!   table: table_m3
//! artifacts:
//!   raw_path: raw_data.csv
//!   clean_path: clean_data.csv
//! destination:
//!   url: http://localhost:9200
//!   index: smartwatch_data
//!   id_strategy: position
//! schedule:
//!   interval_secs: 600
//!   retries: 1
//!   retry_delay_secs: 600
//! cleaning:
//!   collisions: last_write_wins
//! ```

use crate::client::Auth;
use crate::index::DocumentIdStrategy;
use crate::transform::CollisionPolicy;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const REDACTED: &str = "********";

/// Connection parameters and target table for the source database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub schema: String,
    pub table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            schema: "public".to_string(),
            table: "table_m3".to_string(),
        }
    }
}

impl std::fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "postgres://{}@{}:{}/{} ({}.{})",
            self.user, self.host, self.port, self.database, self.schema, self.table
        )
    }
}

/// Locations of the intermediate snapshots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactConfig {
    pub raw_path: PathBuf,
    pub clean_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from("raw_data.csv"),
            clean_path: PathBuf::from("clean_data.csv"),
        }
    }
}

/// How document identifiers are chosen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategyKind {
    Position,
    Column,
    ContentHash,
}

impl FromStr for IdStrategyKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "position" => Ok(Self::Position),
            "column" => Ok(Self::Column),
            "content_hash" | "hash" => Ok(Self::ContentHash),
            other => Err(format!(
                "unknown id strategy '{}' (expected position, column or content_hash)",
                other
            )),
        }
    }
}

/// Destination search index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub url: String,
    pub index: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub apikey: Option<String>,
    pub id_strategy: IdStrategyKind,
    /// Column used for identifiers when `id_strategy` is `column`
    pub id_column: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "smartwatch_data".to_string(),
            username: None,
            password: None,
            apikey: None,
            id_strategy: IdStrategyKind::Position,
            id_column: None,
        }
    }
}

impl IndexConfig {
    pub fn parsed_url(&self) -> Result<Url> {
        Url::parse(&self.url).with_context(|| format!("Invalid index URL: {}", self.url))
    }

    /// API key wins over username/password; no credentials means no auth
    pub fn auth(&self) -> Auth {
        match (&self.apikey, &self.username, &self.password) {
            (Some(apikey), _, _) => Auth::Apikey(apikey.clone()),
            (None, Some(username), Some(password)) => {
                Auth::Basic(username.clone(), password.clone())
            }
            _ => Auth::None,
        }
    }

    pub fn document_ids(&self) -> Result<DocumentIdStrategy> {
        match self.id_strategy {
            IdStrategyKind::Position => Ok(DocumentIdStrategy::Position),
            IdStrategyKind::ContentHash => Ok(DocumentIdStrategy::ContentHash),
            IdStrategyKind::Column => match &self.id_column {
                Some(column) => Ok(DocumentIdStrategy::Column(column.clone())),
                None => eyre::bail!("id_strategy 'column' requires id_column to be set"),
            },
        }
    }
}

/// Trigger interval and the retry policy applied around each step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    pub retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            retries: 1,
            retry_delay_secs: 600,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleaningConfig {
    pub collisions: CollisionPolicy,
}

/// Complete configuration for a pipeline run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub artifacts: ArtifactConfig,
    pub destination: IndexConfig,
    pub schedule: ScheduleConfig,
    pub cleaning: CleaningConfig,
}

impl PipelineConfig {
    /// Build the effective configuration
    ///
    /// Reads `path` if given (it must exist), then applies `ETL_*`
    /// environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a YAML file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config YAML: {}", path.display()))
    }

    /// Override fields from `ETL_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        let source = &mut self.source;
        override_with(&mut source.host, env_string("ETL_SOURCE_HOST"));
        override_with(&mut source.port, env_parse("ETL_SOURCE_PORT")?);
        override_with(&mut source.database, env_string("ETL_SOURCE_DATABASE"));
        override_with(&mut source.user, env_string("ETL_SOURCE_USER"));
        override_with(&mut source.password, env_string("ETL_SOURCE_PASSWORD"));
        override_with(&mut source.schema, env_string("ETL_SOURCE_SCHEMA"));
        override_with(&mut source.table, env_string("ETL_SOURCE_TABLE"));

        let artifacts = &mut self.artifacts;
        override_with(&mut artifacts.raw_path, env_string("ETL_RAW_PATH").map(PathBuf::from));
        override_with(
            &mut artifacts.clean_path,
            env_string("ETL_CLEAN_PATH").map(PathBuf::from),
        );

        let destination = &mut self.destination;
        override_with(&mut destination.url, env_string("ETL_INDEX_URL"));
        override_with(&mut destination.index, env_string("ETL_INDEX_NAME"));
        if let Some(username) = env_string("ETL_INDEX_USERNAME") {
            destination.username = Some(username);
        }
        if let Some(password) = env_string("ETL_INDEX_PASSWORD") {
            destination.password = Some(password);
        }
        if let Some(apikey) = env_string("ETL_INDEX_APIKEY") {
            destination.apikey = Some(apikey);
        }
        override_with(
            &mut destination.id_strategy,
            env_parse("ETL_INDEX_ID_STRATEGY")?,
        );
        if let Some(column) = env_string("ETL_INDEX_ID_COLUMN") {
            destination.id_column = Some(column);
        }

        let schedule = &mut self.schedule;
        override_with(&mut schedule.interval_secs, env_parse("ETL_INTERVAL_SECS")?);
        override_with(&mut schedule.retries, env_parse("ETL_RETRIES")?);
        override_with(
            &mut schedule.retry_delay_secs,
            env_parse("ETL_RETRY_DELAY_SECS")?,
        );

        override_with(&mut self.cleaning.collisions, env_parse("ETL_COLLISIONS")?);

        Ok(())
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        if self.source.table.trim().is_empty() {
            eyre::bail!("Source table name must not be empty");
        }
        if self.destination.index.trim().is_empty() {
            eyre::bail!("Index name must not be empty");
        }
        self.destination.parsed_url()?;
        self.destination.document_ids()?;
        if self.schedule.interval_secs == 0 {
            eyre::bail!("Schedule interval must be at least one second");
        }
        if self.artifacts.raw_path == self.artifacts.clean_path {
            eyre::bail!(
                "Raw and clean artifacts must use different paths: {}",
                self.artifacts.raw_path.display()
            );
        }
        Ok(())
    }

    /// Copy of the configuration with every secret replaced
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.source.password = REDACTED.to_string();
        if config.destination.password.is_some() {
            config.destination.password = Some(REDACTED.to_string());
        }
        if config.destination.apikey.is_some() {
            config.destination.apikey = Some(REDACTED.to_string());
        }
        config
    }

    /// Redacted YAML rendering for display
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.redacted()).with_context(|| "Failed to serialize config")
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| eyre::eyre!("Invalid {}: {} ({})", key, raw, e)),
        None => Ok(None),
    }
}
