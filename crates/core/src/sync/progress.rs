//! Progress reporting for sync runs.
//!
//! The orchestrator reports run start, every state transition, every chunk,
//! every deletion and run completion through [`SyncProgressReporter`].

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::sync_config::OperationMode;
use super::sync_report::{SyncReport, SyncState};
use crate::activities::DestinationActivity;

/// Payload for a committed (or failed) chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkProgress {
    /// Chunk number (0-indexed)
    pub index: usize,
    /// Total chunks in this run
    pub total: usize,
    /// Items submitted in this chunk
    pub size: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Optional status message
    pub message: Option<String>,
}

impl ChunkProgress {
    pub fn new(index: usize, total: usize, size: usize) -> Self {
        Self {
            index,
            total,
            size,
            succeeded: 0,
            failed: 0,
            message: None,
        }
    }

    pub fn with_counts(mut self, succeeded: usize, failed: usize) -> Self {
        self.succeeded = succeeded;
        self.failed = failed;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Trait for reporting sync progress.
pub trait SyncProgressReporter: Send + Sync {
    /// Report that a run is starting.
    fn report_sync_start(&self, run_id: &str, mode: OperationMode);

    /// Report a state machine transition.
    fn report_transition(&self, from: SyncState, to: SyncState);

    /// Report the outcome of one chunk.
    fn report_chunk(&self, progress: &ChunkProgress);

    /// Announce a destination activity that is about to be deleted.
    fn report_delete(&self, activity: &DestinationActivity);

    /// Report that the run finished (successfully or not).
    fn report_sync_complete(&self, report: &SyncReport);
}

/// Reporter that writes progress to the log.
#[derive(Debug, Clone, Default)]
pub struct LogProgressReporter;

impl SyncProgressReporter for LogProgressReporter {
    fn report_sync_start(&self, run_id: &str, mode: OperationMode) {
        info!("Starting {} run {}", mode, run_id);
    }

    fn report_transition(&self, from: SyncState, to: SyncState) {
        info!("State: {} -> {}", from, to);
    }

    fn report_chunk(&self, progress: &ChunkProgress) {
        if progress.failed > 0 {
            warn!(
                "Chunk {}/{}: {} of {} items failed{}",
                progress.index + 1,
                progress.total,
                progress.failed,
                progress.size,
                progress
                    .message
                    .as_deref()
                    .map(|m| format!(" ({})", m))
                    .unwrap_or_default()
            );
        } else {
            info!(
                "Chunk {}/{}: {} items committed",
                progress.index + 1,
                progress.total,
                progress.succeeded
            );
        }
    }

    fn report_delete(&self, activity: &DestinationActivity) {
        info!(
            "Deleting activity {} ({} {} {})",
            activity.id,
            activity.activity_type.as_deref().unwrap_or("-"),
            activity.symbol.as_deref().unwrap_or("-"),
            activity.date.as_deref().unwrap_or("-")
        );
    }

    fn report_sync_complete(&self, report: &SyncReport) {
        match &report.cause {
            None => info!(
                "Run {} finished: fetched={}, imported={}, skipped={}, failed={}, removed={}",
                report.run_id,
                report.fetched,
                report.imported,
                report.skipped_unsupported + report.skipped_duplicate,
                report.failed,
                report.removed
            ),
            Some(cause) => warn!(
                "Run {} failed in {}: {} ({})",
                report.run_id, cause.failed_in, cause.message, cause.kind
            ),
        }
    }
}

/// A no-op progress reporter for contexts where progress reporting is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressReporter;

impl SyncProgressReporter for NoOpProgressReporter {
    fn report_sync_start(&self, _run_id: &str, _mode: OperationMode) {
        // No-op
    }

    fn report_transition(&self, _from: SyncState, _to: SyncState) {
        // No-op
    }

    fn report_chunk(&self, _progress: &ChunkProgress) {
        // No-op
    }

    fn report_delete(&self, _activity: &DestinationActivity) {
        // No-op
    }

    fn report_sync_complete(&self, _report: &SyncReport) {
        // No-op
    }
}
