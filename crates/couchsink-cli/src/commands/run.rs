//! Run command - Write newline-delimited JSON records into the store
//!
//! Stands in for the stream host: reads records from a file or stdin,
//! groups them into batches and hands each batch to the sink task. The
//! command stops at the first failed batch and exits non-zero; records
//! after the failure are left unwritten.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use couchsink_core::{config::Config, domain::IncomingRecord};
use couchsink_sink::{BatchSummary, SinkTask};

use crate::output::{get_formatter, OutputFormat};

/// Default number of records per batch
const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Args)]
pub struct RunCommand {
    /// Newline-delimited JSON records to write, `-` for stdin
    #[arg(long, short, default_value = "-")]
    input: String,

    /// Records handed to the sink per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

/// Totals over every batch of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunTotals {
    batches: usize,
    created: usize,
    merged: usize,
    duration_ms: u64,
}

impl RunTotals {
    fn add(&mut self, summary: &BatchSummary) {
        self.batches += 1;
        self.created += summary.created;
        self.merged += summary.merged;
        self.duration_ms += summary.duration_ms;
    }
}

impl RunCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if self.batch_size == 0 {
            anyhow::bail!("--batch-size must be at least 1");
        }

        let config = Config::load(config_path).with_context(|| {
            format!("Failed to load configuration from {}", config_path.display())
        })?;
        let task = SinkTask::start(&config).context("Failed to start sink task")?;

        let shutdown = task.shutdown_token();
        tokio::spawn(shutdown_signal(shutdown.clone()));

        let result = match self.input.as_str() {
            "-" => {
                info!("Reading records from stdin");
                let stdin = BufReader::new(tokio::io::stdin());
                pump(&task, stdin, self.batch_size, &shutdown).await
            }
            path => {
                let path = PathBuf::from(path);
                info!(input = %path.display(), "Reading records from file");
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                pump(&task, BufReader::new(file), self.batch_size, &shutdown).await
            }
        };

        task.flush().await?;
        task.stop();

        match result {
            Ok(totals) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "batches": totals.batches,
                        "created": totals.created,
                        "merged": totals.merged,
                        "duration_ms": totals.duration_ms,
                    }));
                } else {
                    formatter.success(&format!(
                        "Wrote {} records in {} batches",
                        totals.created + totals.merged,
                        totals.batches
                    ));
                    formatter.info(&format!("Created: {}", totals.created));
                    formatter.info(&format!("Merged:  {}", totals.merged));
                }
                Ok(())
            }
            Err(e) => {
                formatter.error(&format!("{e:#}"));
                Err(e)
            }
        }
    }
}

/// Reads records line by line and writes them batch by batch
async fn pump<R>(
    task: &SinkTask,
    reader: R,
    batch_size: usize,
    shutdown: &CancellationToken,
) -> Result<RunTotals>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut totals = RunTotals::default();
    let mut batch = Vec::with_capacity(batch_size);
    let mut line_no = 0usize;

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                warn!(pending = batch.len(), "Shutdown requested, discarding unwritten records");
                anyhow::bail!("interrupted before all records were written");
            }
            line = lines.next_line() => line.context("Failed to read input")?,
        };

        let Some(line) = line else { break };
        line_no += 1;

        if let Some(record) = parse_record(&line, line_no)? {
            batch.push(record);
        }

        if batch.len() >= batch_size {
            write_batch(task, std::mem::take(&mut batch), &mut totals).await?;
        }
    }

    if !batch.is_empty() {
        write_batch(task, batch, &mut totals).await?;
    }

    Ok(totals)
}

async fn write_batch(
    task: &SinkTask,
    batch: Vec<IncomingRecord>,
    totals: &mut RunTotals,
) -> Result<()> {
    let size = batch.len();
    let summary = task
        .put(batch)
        .await
        .with_context(|| format!("Batch {} of {size} records failed", totals.batches + 1))?;

    debug!(
        batch = totals.batches + 1,
        created = summary.created,
        merged = summary.merged,
        "Batch committed"
    );
    totals.add(&summary);
    Ok(())
}

/// Parses one input line; blank lines are skipped
fn parse_record(line: &str, line_no: usize) -> Result<Option<IncomingRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .with_context(|| format!("Line {line_no} is not a valid record"))
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
        _ = token.cancelled() => {
            return;
        }
    }

    token.cancel();
}
