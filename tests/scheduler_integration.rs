//! Integration tests for scheduling, retries and run history

use eyre::Result;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use table_indexer::config::PipelineConfig;
use table_indexer::error::EtlError;
use table_indexer::etl::Extractor;
use table_indexer::index::DocumentIndex;
use table_indexer::job::{Job, Step};
use table_indexer::records::RecordSet;
use table_indexer::scheduler::{RetryPolicy, Scheduler, StepOutcome};
use tempfile::TempDir;

/// Extractor that fails its first `failures` calls, then succeeds
#[derive(Clone)]
struct FlakyTable {
    calls: Arc<AtomicUsize>,
    failures: usize,
}

impl FlakyTable {
    fn new(failures: usize) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failures,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Extractor for FlakyTable {
    type Output = RecordSet;

    async fn extract(&self) -> Result<Self::Output> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(EtlError::connectivity(format!("refused (call {})", call)).into());
        }
        RecordSet::with_rows(
            vec!["Name".to_string()],
            vec![vec![Some("watch".to_string())]],
        )
    }
}

#[derive(Clone, Default)]
struct CountingIndex {
    writes: Arc<Mutex<Vec<String>>>,
}

impl DocumentIndex for CountingIndex {
    async fn index_document(&self, _index: &str, id: &str, _body: &Value) -> Result<()> {
        self.writes.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

fn scheduler(
    temp: &TempDir,
    table: FlakyTable,
    index: CountingIndex,
    retries: u32,
    interval: Duration,
) -> Scheduler<FlakyTable, CountingIndex> {
    let mut config = PipelineConfig::default();
    config.artifacts.raw_path = temp.path().join("raw_data.csv");
    config.artifacts.clean_path = temp.path().join("clean_data.csv");
    let job = Job::new(table, index, &config).unwrap();
    Scheduler::new(job, interval, RetryPolicy::new(retries, Duration::ZERO))
}

#[tokio::test]
async fn test_retry_recovers_transient_failure() {
    let temp = TempDir::new().unwrap();
    let table = FlakyTable::new(1);
    let index = CountingIndex::default();
    let mut scheduler = scheduler(
        &temp,
        table.clone(),
        index.clone(),
        1,
        Duration::from_secs(3600),
    );

    let report = scheduler.run_once().await;

    assert!(report.succeeded(), "{}", report);
    assert_eq!(table.calls(), 2);
    assert_eq!(report.steps[0].attempts, 2);
    assert_eq!(report.steps[1].attempts, 1);
    assert_eq!(
        report.outcome(Step::Load),
        Some(&StepOutcome::Succeeded { records: 1 })
    );
    assert_eq!(*index.writes.lock().unwrap(), vec!["0"]);
}

#[tokio::test]
async fn test_exhausted_retries_skip_downstream_steps() {
    let temp = TempDir::new().unwrap();
    let table = FlakyTable::new(usize::MAX);
    let index = CountingIndex::default();
    let mut scheduler = scheduler(
        &temp,
        table.clone(),
        index.clone(),
        2,
        Duration::from_secs(3600),
    );

    let report = scheduler.run_once().await;

    assert!(!report.succeeded());
    assert_eq!(table.calls(), 3);
    assert_eq!(report.failed_step().map(|s| s.step), Some(Step::Extract));
    assert!(matches!(
        report.outcome(Step::Extract),
        Some(StepOutcome::Failed {
            kind: Some("connectivity"),
            ..
        })
    ));
    assert_eq!(report.outcome(Step::Clean), Some(&StepOutcome::Skipped));
    assert_eq!(report.outcome(Step::Load), Some(&StepOutcome::Skipped));
    assert!(report.error().unwrap().contains("refused (call 3)"));
    assert!(index.writes.lock().unwrap().is_empty());
    assert!(!temp.path().join("raw_data.csv").exists());
}

#[tokio::test]
async fn test_history_records_every_run() {
    let temp = TempDir::new().unwrap();
    let table = FlakyTable::new(1);
    let mut scheduler = scheduler(
        &temp,
        table,
        CountingIndex::default(),
        0,
        Duration::from_secs(3600),
    );

    scheduler.run_once().await;
    scheduler.run_once().await;

    let history: Vec<_> = scheduler.history().collect();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].run, 1);
    assert!(!history[0].succeeded());
    assert_eq!(history[1].run, 2);
    assert!(history[1].succeeded());
}

#[tokio::test]
async fn test_serve_runs_immediately_and_stops_on_shutdown() {
    let temp = TempDir::new().unwrap();
    let table = FlakyTable::new(0);
    let index = CountingIndex::default();
    let mut scheduler = scheduler(
        &temp,
        table.clone(),
        index.clone(),
        0,
        Duration::from_secs(3600),
    );

    scheduler
        .serve_until(tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(table.calls(), 1);
    assert_eq!(scheduler.history().count(), 1);
    assert_eq!(index.writes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_serve_rejects_zero_interval() {
    let temp = TempDir::new().unwrap();
    let mut scheduler = scheduler(
        &temp,
        FlakyTable::new(0),
        CountingIndex::default(),
        0,
        Duration::ZERO,
    );

    let result = scheduler.serve_until(std::future::ready(())).await;
    assert!(result.is_err());
    assert_eq!(scheduler.history().count(), 0);
}
