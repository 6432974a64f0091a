//! Sink task lifecycle and per-record pipeline driver
//!
//! The host scheduler drives the task through `start`, repeated `put` calls,
//! `flush` and finally `stop`. A `put` call is the commit barrier: it only
//! returns `Ok` once every record of the batch was durably accepted by the
//! store, so the host may advance its stream position afterwards.
//!
//! Per record:
//!
//! 1. Resolve the target database from the topic
//! 2. Convert the payload into a document with an `_id`
//! 3. Attempt a create write
//! 4. On conflict, run the [`ConflictResolver`]
//!
//! The first fatal error aborts the rest of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use couchsink_conflict::{merger_for, ConflictResolver, RetryPolicy};
use couchsink_core::{
    config::Config,
    domain::{classify_result, DatabaseName, Document, DomainError, IncomingRecord, WriteOutcome},
    ports::{IConverter, IDocumentStore, IMerger},
};
use couchsink_store::{CouchClient, CouchDocumentStore};

use crate::{converter::JsonConverter, error::SinkError, router::TopicRouter};

/// Immutable per-task settings, shared for the task's lifetime
#[derive(Clone)]
pub struct TaskSettings {
    /// Topic to database routing table
    pub router: TopicRouter,
    /// Document store shared by every record and batch
    pub store: Arc<dyn IDocumentStore>,
    /// Payload converter
    pub converter: Arc<dyn IConverter>,
    /// Merge strategy used by the resolver
    pub merger: Arc<dyn IMerger>,
    /// Fetch retry bound and pacing
    pub retry: RetryPolicy,
}

impl TaskSettings {
    /// Resolves a validated configuration into task settings
    ///
    /// # Errors
    /// Returns [`SinkError::InvalidConfig`] if the configuration does not
    /// validate, or [`SinkError::Store`] if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self, SinkError> {
        let errors = config.validate();
        if !errors.is_empty() {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SinkError::InvalidConfig(joined));
        }

        let router = TopicRouter::from_topics(&config.topics)
            .map_err(|e| SinkError::InvalidConfig(e.to_string()))?;
        let client = CouchClient::from_config(&config.store)?;
        let merger = merger_for(&config.merging.strategy)
            .map_err(|e| SinkError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            router,
            store: Arc::new(CouchDocumentStore::new(client)),
            converter: Arc::new(JsonConverter::new(config.converter.id_from_key)),
            merger,
            retry: RetryPolicy::new(
                config.merging.max_conflicting_docs_fetch_retries,
                Duration::from_millis(config.merging.fetch_retry_backoff_ms),
            )
            .with_max_backoff(Duration::from_millis(
                config.merging.fetch_retry_backoff_max_ms,
            )),
        })
    }

    fn resolver(&self) -> ConflictResolver {
        ConflictResolver::new(self.store.clone(), self.merger.clone(), self.retry)
    }
}

impl std::fmt::Debug for TaskSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSettings")
            .field("routes", &self.router.len())
            .field("merger", &self.merger.name())
            .field("retry", &self.retry)
            .finish()
    }
}

/// Informational result of a successful batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records written by a plain create
    pub created: usize,
    /// Records written through conflict resolution
    pub merged: usize,
    /// Wall time of the batch
    pub duration_ms: u64,
}

impl BatchSummary {
    /// Total number of records written
    pub fn total(&self) -> usize {
        self.created + self.merged
    }
}

/// How a single record was written
enum RecordOutcome {
    Created,
    Merged,
}

/// Sink task writing stream records into the document store
pub struct SinkTask {
    settings: Arc<TaskSettings>,
    shutdown: CancellationToken,
}

impl SinkTask {
    /// Starts a task from configuration
    ///
    /// # Errors
    /// See [`TaskSettings::from_config`]
    pub fn start(config: &Config) -> Result<Self, SinkError> {
        let settings = TaskSettings::from_config(config)?;
        info!(
            store = %config.store.url,
            routes = settings.router.len(),
            merger = settings.merger.name(),
            max_fetch_retries = settings.retry.max_retries,
            "Sink task started"
        );
        Ok(Self::new(settings))
    }

    /// Creates a task from already resolved settings
    pub fn new(settings: TaskSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replaces the merge strategy
    pub fn with_merger(mut self, merger: Arc<dyn IMerger>) -> Self {
        Arc::make_mut(&mut self.settings).merger = merger;
        self
    }

    /// Returns the task settings
    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    /// Returns a token that stops the task when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Writes a batch of records, in order
    ///
    /// # Errors
    /// Returns the first fatal error; records after it are not written.
    /// Returns [`SinkError::Cancelled`] if the task is stopped while the
    /// batch is in flight. In-flight requests are dropped.
    pub async fn put(&self, records: Vec<IncomingRecord>) -> Result<BatchSummary, SinkError> {
        if self.shutdown.is_cancelled() {
            return Err(SinkError::Cancelled);
        }
        if records.is_empty() {
            return Ok(BatchSummary::default());
        }

        let batch_size = records.len();
        debug!(records = batch_size, "Processing batch");

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                warn!(records = batch_size, "Batch abandoned, task is stopping");
                Err(SinkError::Cancelled)
            }
            result = self.process_batch(&records) => result,
        }
    }

    /// Acknowledges a flush request
    ///
    /// Nothing is buffered: every successful `put` is already durable.
    pub async fn flush(&self) -> Result<(), SinkError> {
        debug!("Flush requested, nothing pending");
        Ok(())
    }

    /// Stops the task, abandoning any batch in flight
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Stopping sink task");
            self.shutdown.cancel();
        }
    }

    async fn process_batch(&self, records: &[IncomingRecord]) -> Result<BatchSummary, SinkError> {
        let started = Instant::now();
        let resolver = self.settings.resolver();
        let mut summary = BatchSummary::default();

        for record in records {
            match self.process_record(record, &resolver).await? {
                RecordOutcome::Created => summary.created += 1,
                RecordOutcome::Merged => summary.merged += 1,
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            created = summary.created,
            merged = summary.merged,
            duration_ms = summary.duration_ms,
            "Batch written"
        );
        Ok(summary)
    }

    async fn process_record(
        &self,
        record: &IncomingRecord,
        resolver: &ConflictResolver,
    ) -> Result<RecordOutcome, SinkError> {
        let Some(database) = self.settings.router.route(&record.topic) else {
            error!(
                topic = %record.topic,
                position = %record.position(),
                "No database mapping for topic"
            );
            return Err(SinkError::NoRoute {
                topic: record.topic.clone(),
            });
        };

        let doc = self.convert(record, database)?;

        let outcome = classify_result(self.settings.store.insert(database, &doc).await);
        match outcome {
            WriteOutcome::Accepted(_) => {
                debug!(database = %database, doc_id = %doc.id(), "Document created");
                Ok(RecordOutcome::Created)
            }
            WriteOutcome::Conflict => {
                debug!(database = %database, doc_id = %doc.id(), "Create conflicted, merging");
                match resolver.resolve(database, &doc).await {
                    Ok(_) => Ok(RecordOutcome::Merged),
                    Err(source) => {
                        let err = SinkError::Resolution {
                            database: database.clone(),
                            source,
                        };
                        log_fatal(record, database, Some(&doc), &err);
                        Err(err)
                    }
                }
            }
            WriteOutcome::Failed(failure) => {
                let err = SinkError::InsertRejected {
                    database: database.clone(),
                    id: doc.id().clone(),
                    failure,
                };
                log_fatal(record, database, Some(&doc), &err);
                Err(err)
            }
        }
    }

    fn convert(
        &self,
        record: &IncomingRecord,
        database: &DatabaseName,
    ) -> Result<Document, SinkError> {
        let fields = self.settings.converter.from_record(record).map_err(|source| {
            let err = SinkError::Conversion {
                topic: record.topic.clone(),
                source,
            };
            log_fatal(record, database, None, &err);
            err
        })?;

        Document::from_map(fields).map_err(|source| {
            let err = match source {
                DomainError::InvalidDocumentId(_) => SinkError::MissingId {
                    topic: record.topic.clone(),
                    source,
                },
                other => SinkError::Conversion {
                    topic: record.topic.clone(),
                    source: other.into(),
                },
            };
            log_fatal(record, database, None, &err);
            err
        })
    }
}

/// Logs a fatal record failure with enough context to replay it
fn log_fatal(
    record: &IncomingRecord,
    database: &DatabaseName,
    doc: Option<&Document>,
    err: &SinkError,
) {
    let document = match doc {
        Some(doc) => doc.to_pretty(),
        None => serde_json::to_string_pretty(&record.value).unwrap_or_default(),
    };
    error!(
        topic = %record.topic,
        position = %record.position(),
        database = %database,
        status = ?err.status(),
        document = %document,
        error = %err,
        "Failed to write record"
    );
}
