//! The extract → clean → load job
//!
//! A [`Job`] is the unit of work handed to the scheduler: three steps with
//! a fixed dependency chain. Each step is its own [`Pipeline`] from one
//! durable artifact to the next:
//!
//! | Step    | Extract from      | Transform  | Load into         |
//! |---------|-------------------|------------|-------------------|
//! | Extract | source table      | identity   | raw snapshot      |
//! | Clean   | raw snapshot      | [`Cleaner`]| clean snapshot    |
//! | Load    | clean snapshot    | identity   | search index      |

use crate::config::PipelineConfig;
use crate::etl::{Extractor, IdentityTransformer, Pipeline};
use crate::index::{DocumentIdStrategy, DocumentIndex, IndexLoader};
use crate::records::RecordSet;
use crate::storage::{CsvReader, CsvWriter};
use crate::transform::{Cleaner, CollisionPolicy};
use eyre::{Context, Result};
use std::path::{Path, PathBuf};

/// One step of the job, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Extract,
    Clean,
    Load,
}

impl Step {
    /// Every step in the order it must run
    pub const ALL: [Step; 3] = [Step::Extract, Step::Clean, Step::Load];

    /// Stable identifier used in logs and run reports
    pub fn task_id(&self) -> &'static str {
        match self {
            Self::Extract => "fetch_from_source",
            Self::Clean => "clean_records",
            Self::Load => "load_to_index",
        }
    }

    /// The step that must finish before this one may start
    pub fn upstream(&self) -> Option<Step> {
        match self {
            Self::Extract => None,
            Self::Clean => Some(Self::Extract),
            Self::Load => Some(Self::Clean),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.task_id())
    }
}

impl std::str::FromStr for Step {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extract" | "fetch_from_source" => Ok(Self::Extract),
            "clean" | "clean_records" => Ok(Self::Clean),
            "load" | "load_to_index" => Ok(Self::Load),
            other => Err(format!(
                "unknown step '{}' (expected extract, clean or load)",
                other
            )),
        }
    }
}

/// The configured job: a source, a destination, and the artifacts between them
///
/// `S` is the source table extractor and `I` the search index; both are
/// cloned into each step's pipeline, so they should be cheap to clone.
#[derive(Debug, Clone)]
pub struct Job<S, I> {
    source: S,
    index: I,
    index_name: String,
    ids: DocumentIdStrategy,
    raw_path: PathBuf,
    clean_path: PathBuf,
    collisions: CollisionPolicy,
}

impl<S, I> Job<S, I>
where
    S: Extractor<Output = RecordSet> + Clone,
    I: DocumentIndex + Clone,
{
    /// Create a job from its collaborators and the run configuration
    pub fn new(source: S, index: I, config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            source,
            index,
            index_name: config.destination.index.clone(),
            ids: config.destination.document_ids()?,
            raw_path: config.artifacts.raw_path.clone(),
            clean_path: config.artifacts.clean_path.clone(),
            collisions: config.cleaning.collisions,
        })
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn clean_path(&self) -> &Path {
        &self.clean_path
    }

    /// Run a single step
    ///
    /// Returns the number of records the step wrote: rows for the two
    /// snapshot steps, documents for the load step.
    pub async fn run_step(&self, step: Step) -> Result<usize> {
        log::info!("Starting step {}", step);
        let count = match step {
            Step::Extract => {
                Pipeline::new(
                    self.source.clone(),
                    IdentityTransformer::<RecordSet>::new(),
                    CsvWriter::new(&self.raw_path),
                )
                .run()
                .await
            }
            Step::Clean => {
                Pipeline::new(
                    CsvReader::new(&self.raw_path),
                    Cleaner::new(self.collisions),
                    CsvWriter::new(&self.clean_path),
                )
                .run()
                .await
            }
            Step::Load => {
                let loader = IndexLoader::new(self.index.clone(), self.index_name.clone())
                    .with_ids(self.ids.clone());
                Pipeline::new(
                    CsvReader::new(&self.clean_path),
                    IdentityTransformer::<RecordSet>::new(),
                    loader,
                )
                .run()
                .await
            }
        }
        .with_context(|| format!("Step {} failed", step))?;

        log::info!("Finished step {} ({} record(s))", step, count);
        Ok(count)
    }

    /// Run every step in order, stopping at the first failure
    ///
    /// Returns the number of documents indexed.
    pub async fn run(&self) -> Result<usize> {
        let mut count = 0;
        for step in Step::ALL {
            count = self.run_step(step).await?;
        }
        Ok(count)
    }
}
