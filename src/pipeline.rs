//! The BOM enrichment run: read → per-row lookup, scoring and replacement
//! search → aggregate → publish.
//!
//! Rows are independent. A failed or empty lookup only affects its own
//! [`ReportLine`]; the run aborts only on schema, read or report-sink errors,
//! or on cancellation.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::bom::read_bom;
use crate::distributor::Distributor;
use crate::error::Error;
use crate::models::{BomRow, LookupOutcome, Report, ReportLine, RiskSummary};
use crate::progress::{ProgressEvent, ProgressSender, Severity};
use crate::replacement::find_replacements;
use crate::report::ReportSink;
use crate::risk::scorer::classify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Reading,
    ProcessingRow { index: usize, total: usize },
    Aggregating,
    Done,
    Failed,
    Cancelled,
}

/// Shared flag checked before each row starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Pipeline {
    distributor: Arc<dyn Distributor>,
    progress: ProgressSender,
    concurrency: usize,
    cancel: CancelToken,
    state: watch::Sender<RunState>,
}

impl Pipeline {
    pub fn new(distributor: Arc<dyn Distributor>, progress: ProgressSender) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            distributor,
            progress,
            concurrency: 1,
            cancel: CancelToken::new(),
            state,
        }
    }

    /// Rows in flight at once. Results are still returned in row order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    #[cfg(test)]
    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    fn transition(&self, next: RunState) {
        tracing::debug!(state = ?next, "pipeline state");
        self.state.send_replace(next);
    }

    fn emit(&self, severity: Severity, message: impl Into<String>) {
        self.progress.send(ProgressEvent::new(severity, message));
    }

    fn fail(&self, err: Error) -> Error {
        tracing::debug!(error = %err, "run failed");
        self.transition(RunState::Failed);
        self.emit(Severity::Error, err.to_string());
        err
    }

    /// Run the whole pipeline over a CSV BOM and hand the result to `sink`.
    pub async fn run<R: Read>(
        &self,
        source_name: &str,
        source: R,
        sink: &dyn ReportSink,
    ) -> Result<Report, Error> {
        self.transition(RunState::Reading);
        let rows = read_bom(source).map_err(|e| self.fail(e))?;
        let total = rows.len();
        tracing::info!(
            source = source_name,
            rows = total,
            distributor = self.distributor.name(),
            "starting run"
        );

        let lines = match self.process_rows(rows).await {
            Ok(lines) => lines,
            Err(err @ Error::Cancelled { .. }) => {
                tracing::warn!(error = %err, "run cancelled");
                self.transition(RunState::Cancelled);
                self.emit(Severity::Warning, err.to_string());
                return Err(err);
            }
            Err(err) => return Err(self.fail(err)),
        };

        self.transition(RunState::Aggregating);
        let summary = RiskSummary::tally(&lines);
        let report = Report {
            generated_at: Local::now(),
            source: source_name.to_string(),
            distributor: self.distributor.name().to_string(),
            summary,
            lines,
        };

        self.progress.settle().await;
        let artifact = sink.publish(&report).map_err(|e| self.fail(e))?;

        self.transition(RunState::Done);
        self.emit(
            Severity::Success,
            format!("Done! Report saved to {}", artifact),
        );
        Ok(report)
    }

    /// Enrich every row, preserving row order.
    ///
    /// Rows not yet started when the cancel token fires are skipped and the
    /// already finished lines are returned inside [`Error::Cancelled`].
    pub async fn process_rows(&self, rows: Vec<BomRow>) -> Result<Vec<ReportLine>, Error> {
        let total = rows.len();

        let results: Vec<Option<ReportLine>> = stream::iter(rows.into_iter().enumerate())
            .map(|(i, row)| async move {
                if self.cancel.is_cancelled() {
                    return None;
                }
                Some(self.process_row(i + 1, total, row).await)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        if results.iter().any(Option::is_none) {
            let completed: Vec<ReportLine> = results.into_iter().flatten().collect();
            return Err(Error::Cancelled { completed, total });
        }

        Ok(results.into_iter().flatten().collect())
    }

    async fn process_row(&self, index: usize, total: usize, row: BomRow) -> ReportLine {
        self.transition(RunState::ProcessingRow { index, total });
        self.progress
            .send(ProgressEvent::row(index, total, &row.part_number));

        let outcome = if row.part_number.is_empty() {
            tracing::warn!(row = row.row_number, "empty part number, skipping lookup");
            LookupOutcome::NoData
        } else {
            self.distributor.lookup_part(&row.part_number).await
        };

        let risk = classify(&outcome);
        tracing::debug!(part_number = %row.part_number, ?risk, "classified");

        let replacements = if risk.needs_replacement() {
            self.emit(
                Severity::Info,
                format!("Searching replacements for {}...", row.part_number),
            );
            find_replacements(&*self.distributor, outcome.record(), &row.part_number).await
        } else {
            Vec::new()
        };

        ReportLine::new(row, outcome.into_record(), risk, replacements)
    }
}
