//! Per-document ingestion and isolated batch runs.
//!
//! [`Ingestor::process`] handles one key end to end: read → classify → route →
//! chunk → write. [`ingest_batch`] fans a list of keys out over tokio tasks,
//! bounded by a semaphore, and folds every per-document error or panic into a
//! [`DocumentOutcome::Failed`] entry of the [`IngestReport`].

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use docingest_chunking::{ChunkRouter, DocumentTypeClassifier};
use docingest_shared::{AppConfig, DocIngestError, DocumentType, Result};

use crate::store::{ChunkSink, ContentSource, chunks_key};

// ---------------------------------------------------------------------------
// Outcomes and report
// ---------------------------------------------------------------------------

/// What happened to one input key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Completed {
        key: String,
        output_key: String,
        doc_type: DocumentType,
        chunk_count: usize,
    },
    Skipped {
        key: String,
        reason: String,
    },
    Failed {
        key: String,
        error: String,
    },
}

impl DocumentOutcome {
    pub fn failed(key: impl Into<String>, error: impl ToString) -> Self {
        Self::Failed {
            key: key.into(),
            error: error.to_string(),
        }
    }

    /// The input key this outcome belongs to.
    pub fn key(&self) -> &str {
        match self {
            Self::Completed { key, .. } | Self::Skipped { key, .. } | Self::Failed { key, .. } => {
                key
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Result of one batch run, outcomes in input-key order.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentOutcome>,
}

impl IngestReport {
    pub fn completed(&self) -> usize {
        self.documents.iter().filter(|d| d.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.iter().filter(|d| d.is_failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.documents.iter().filter(|d| d.is_skipped()).count()
    }

    /// Total chunks written across completed documents.
    pub fn chunk_count(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match d {
                DocumentOutcome::Completed { chunk_count, .. } => *chunk_count,
                _ => 0,
            })
            .sum()
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DocIngestError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| DocIngestError::io(path, e))
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for batch runs.
pub trait ProgressReporter: Send + Sync {
    /// Called once with the number of keys in the batch.
    fn batch_started(&self, total: usize);
    /// Called when a document gets a concurrency slot.
    fn document_started(&self, key: &str);
    /// Called in input order as outcomes are collected.
    fn document_finished(&self, outcome: &DocumentOutcome, current: usize, total: usize);
    /// Called when the report is complete.
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn batch_started(&self, _total: usize) {}
    fn document_started(&self, _key: &str) {}
    fn document_finished(&self, _outcome: &DocumentOutcome, _current: usize, _total: usize) {}
    fn done(&self, _report: &IngestReport) {}
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// Classifier, router, and output naming for one document at a time.
pub struct Ingestor {
    classifier: DocumentTypeClassifier,
    router: ChunkRouter,
    output_suffix: String,
}

impl Ingestor {
    pub fn new(
        classifier: DocumentTypeClassifier,
        router: ChunkRouter,
        output_suffix: impl Into<String>,
    ) -> Self {
        Self {
            classifier,
            router,
            output_suffix: output_suffix.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            DocumentTypeClassifier::from_config(config),
            ChunkRouter::from_config(config),
            config.defaults.output_suffix.clone(),
        )
    }

    pub fn output_suffix(&self) -> &str {
        &self.output_suffix
    }

    /// Chunk the document at `key` and write its chunk list.
    ///
    /// Non-Markdown keys are skipped without touching either collaborator.
    #[instrument(skip(self, source, sink))]
    pub fn process(
        &self,
        source: &dyn ContentSource,
        sink: &dyn ChunkSink,
        key: &str,
    ) -> Result<DocumentOutcome> {
        let Some(output_key) = chunks_key(key, &self.output_suffix) else {
            debug!("not a markdown object, skipping");
            return Ok(DocumentOutcome::Skipped {
                key: key.to_string(),
                reason: "not a .md object".into(),
            });
        };

        let content = source.read_text(key)?;
        let doc_type = self.classifier.classify(&content, key);
        let chunks = self.router.chunk(&content, key, doc_type);
        sink.write_chunks(&output_key, &chunks)?;

        info!(%doc_type, chunk_count = chunks.len(), %output_key, "document ingested");
        Ok(DocumentOutcome::Completed {
            key: key.to_string(),
            output_key,
            doc_type,
            chunk_count: chunks.len(),
        })
    }

    /// Like [`process`](Self::process), with errors folded into a `Failed` outcome.
    pub fn process_isolated(
        &self,
        source: &dyn ContentSource,
        sink: &dyn ChunkSink,
        key: &str,
    ) -> DocumentOutcome {
        match self.process(source, sink, key) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(key, error = %e, "document failed");
                DocumentOutcome::failed(key, e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Ingest `keys` with at most `concurrency` documents in flight.
///
/// Never fails as a whole: each key ends up as exactly one outcome in the
/// report, in the same order as `keys`.
#[instrument(skip_all, fields(total = keys.len(), concurrency = concurrency))]
pub async fn ingest_batch<S>(
    ingestor: Arc<Ingestor>,
    store: Arc<S>,
    keys: Vec<String>,
    concurrency: usize,
    progress: Arc<dyn ProgressReporter>,
) -> IngestReport
where
    S: ContentSource + ChunkSink + 'static,
{
    let run_id = Uuid::now_v7();
    let started_at = Utc::now();
    let total = keys.len();
    progress.batch_started(total);
    info!(%run_id, total, "ingest started");

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(total);

    for key in keys {
        let sem = semaphore.clone();
        let ingestor = ingestor.clone();
        let store = store.clone();
        let progress = progress.clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let _permit = match sem.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return DocumentOutcome::failed(task_key, e),
            };
            progress.document_started(&task_key);

            let blocking_key = task_key.clone();
            let joined = tokio::task::spawn_blocking(move || {
                ingestor.process_isolated(&*store, &*store, &blocking_key)
            })
            .await;

            joined.unwrap_or_else(|e| {
                warn!(key = %task_key, error = %e, "document task panicked");
                DocumentOutcome::failed(task_key, e)
            })
        });
        handles.push((key, handle));
    }

    let mut documents = Vec::with_capacity(total);
    for (i, (key, handle)) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%key, error = %e, "document task failed to join");
                DocumentOutcome::failed(key, e)
            }
        };
        progress.document_finished(&outcome, i + 1, total);
        documents.push(outcome);
    }

    let report = IngestReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        documents,
    };
    info!(
        %run_id,
        completed = report.completed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "ingest finished"
    );
    progress.done(&report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use docingest_shared::Chunk;

    use crate::store::FsStore;

    /// In-memory store that records writes; keys containing `panic` blow up.
    #[derive(Default)]
    struct MemoryStore {
        objects: HashMap<String, String>,
        written: Mutex<HashMap<String, Vec<Chunk>>>,
    }

    impl MemoryStore {
        fn with(objects: &[(&str, &str)]) -> Self {
            Self {
                objects: objects
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        fn written(&self, key: &str) -> Option<Vec<Chunk>> {
            self.written.lock().unwrap().get(key).cloned()
        }
    }

    impl ContentSource for MemoryStore {
        fn read_text(&self, key: &str) -> Result<String> {
            if key.contains("panic") {
                panic!("simulated source crash for {key}");
            }
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| DocIngestError::Source(format!("{key}: no such object")))
        }
    }

    impl ChunkSink for MemoryStore {
        fn write_chunks(&self, key: &str, chunks: &[Chunk]) -> Result<()> {
            self.written
                .lock()
                .unwrap()
                .insert(key.to_string(), chunks.to_vec());
            Ok(())
        }
    }

    /// Source that tracks how many reads overlap.
    #[derive(Default)]
    struct GaugedStore {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ContentSource for GaugedStore {
        fn read_text(&self, key: &str) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("# {key}\nbody"))
        }
    }

    impl ChunkSink for GaugedStore {
        fn write_chunks(&self, _key: &str, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingProgress {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    impl ProgressReporter for CountingProgress {
        fn batch_started(&self, _total: usize) {}
        fn document_started(&self, _key: &str) {
            self.started.fetch_add(1, Ordering::SeqCst);
        }
        fn document_finished(&self, _outcome: &DocumentOutcome, current: usize, _total: usize) {
            let seen = self.finished.fetch_add(1, Ordering::SeqCst);
            assert_eq!(seen + 1, current);
        }
        fn done(&self, _report: &IngestReport) {}
    }

    fn ingestor() -> Ingestor {
        Ingestor::from_config(&AppConfig::default())
    }

    #[test]
    fn process_writes_chunks_next_to_source() {
        let store = MemoryStore::with(&[(
            "protected/bom/parts.md",
            "| 部品番号 | 名称 |\n|---|---|\n| P-1 | ボルト |",
        )]);

        let outcome = ingestor()
            .process(&store, &store, "protected/bom/parts.md")
            .unwrap();

        assert_eq!(
            outcome,
            DocumentOutcome::Completed {
                key: "protected/bom/parts.md".into(),
                output_key: "protected/bom/parts_chunks.json".into(),
                doc_type: DocumentType::CurrentBom,
                chunk_count: 1,
            }
        );
        let chunks = store.written("protected/bom/parts_chunks.json").unwrap();
        assert_eq!(chunks[0].id, "protected/bom/parts.md#table0");
        assert_eq!(chunks[0].metadata.source, "protected/bom/parts.md");
    }

    #[test]
    fn process_skips_non_markdown_keys() {
        let store = MemoryStore::default();
        let outcome = ingestor().process(&store, &store, "scan.pdf").unwrap();
        assert!(outcome.is_skipped());
        assert_eq!(outcome.key(), "scan.pdf");
        assert!(store.written.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_document_writes_empty_list() {
        let store = MemoryStore::with(&[("empty.md", "")]);
        let outcome = ingestor().process(&store, &store, "empty.md").unwrap();
        assert!(matches!(
            outcome,
            DocumentOutcome::Completed { chunk_count: 0, .. }
        ));
        assert_eq!(store.written("empty_chunks.json").unwrap(), Vec::<Chunk>::new());
    }

    #[test]
    fn process_propagates_source_errors() {
        let store = MemoryStore::default();
        let err = ingestor().process(&store, &store, "missing.md").unwrap_err();
        assert!(matches!(err, DocIngestError::Source(_)));

        let outcome = ingestor().process_isolated(&store, &store, "missing.md");
        assert!(outcome.is_failed());
    }

    #[test]
    fn custom_output_suffix() {
        let config = AppConfig {
            defaults: docingest_shared::DefaultsConfig {
                output_suffix: ".chunks.json".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let store = MemoryStore::with(&[("a.md", "# A\nbody")]);
        let outcome = Ingestor::from_config(&config)
            .process(&store, &store, "a.md")
            .unwrap();
        assert!(matches!(
            outcome,
            DocumentOutcome::Completed { ref output_key, .. } if output_key == "a.chunks.json"
        ));
    }

    #[tokio::test]
    async fn batch_isolates_failures_and_keeps_order() {
        let store = Arc::new(MemoryStore::with(&[
            ("a.md", "Article 1\nScope"),
            ("c.md", "# Notes\ntext"),
        ]));
        let keys = vec![
            "a.md".to_string(),
            "missing.md".to_string(),
            "panic.md".to_string(),
            "c.md".to_string(),
            "image.png".to_string(),
        ];
        let progress = Arc::new(CountingProgress::default());

        let report = ingest_batch(
            Arc::new(ingestor()),
            store.clone(),
            keys.clone(),
            2,
            progress.clone(),
        )
        .await;

        let reported: Vec<&str> = report.documents.iter().map(|d| d.key()).collect();
        assert_eq!(reported, keys.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(report.finished_at >= report.started_at);

        assert!(matches!(
            report.documents[0],
            DocumentOutcome::Completed { doc_type: DocumentType::Regulation, .. }
        ));
        assert!(store.written("c_chunks.json").is_some());
        assert_eq!(progress.started.load(Ordering::SeqCst), 5);
        assert_eq!(progress.finished.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn batch_respects_concurrency_limit() {
        let store = Arc::new(GaugedStore::default());
        let keys: Vec<String> = (0..8).map(|i| format!("doc{i}.md")).collect();

        let report = ingest_batch(
            Arc::new(ingestor()),
            store.clone(),
            keys,
            2,
            Arc::new(SilentProgress),
        )
        .await;

        assert_eq!(report.completed(), 8);
        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "{peak} documents were read at once");
        assert!(peak >= 1);
        assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_with_zero_concurrency_still_runs() {
        let store = Arc::new(MemoryStore::with(&[("a.md", "text")]));
        let report = ingest_batch(
            Arc::new(ingestor()),
            store,
            vec!["a.md".into()],
            0,
            Arc::new(SilentProgress),
        )
        .await;
        assert_eq!(report.completed(), 1);
    }

    #[tokio::test]
    async fn batch_over_fs_store_and_report_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("protected/rules")).unwrap();
        std::fs::write(
            dir.path().join("protected/rules/list.md"),
            "\u{feff}Rule: 重量が増加した場合\n重心を確認する",
        )
        .unwrap();

        let store = Arc::new(FsStore::new(dir.path()));
        let keys = store.list_markdown("protected/").unwrap();
        let report = ingest_batch(
            Arc::new(ingestor()),
            store,
            keys,
            4,
            Arc::new(SilentProgress),
        )
        .await;

        assert_eq!(report.completed(), 1);
        assert_eq!(report.chunk_count(), 1);
        let written =
            std::fs::read_to_string(dir.path().join("protected/rules/list_chunks.json")).unwrap();
        let chunks: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(chunks[0]["metadata"]["doc_type"], "reflex_rules");
        assert_eq!(chunks[0]["metadata"]["trigger_condition"], "weight_change");

        let report_path = dir.path().join("reports/run.json");
        report.write_json(&report_path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["documents"][0]["status"], "completed");
        assert_eq!(json["documents"][0]["output_key"], "protected/rules/list_chunks.json");
        assert_eq!(json["run_id"], report.run_id.to_string());
    }
}
