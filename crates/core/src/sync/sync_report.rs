//! Run state machine and report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sync_config::OperationMode;
use crate::activities::DestinationActivity;
use crate::errors::{Error, ErrorKind, Result};

/// State of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    #[default]
    Idle,
    Fetching,
    Normalizing,
    Reconciling,
    Committing,
    Done,
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Fetching => write!(f, "fetching"),
            SyncState::Normalizing => write!(f, "normalizing"),
            SyncState::Reconciling => write!(f, "reconciling"),
            SyncState::Committing => write!(f, "committing"),
            SyncState::Done => write!(f, "done"),
            SyncState::Failed => write!(f, "failed"),
        }
    }
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Done | SyncState::Failed)
    }

    /// Allowed edges. List runs go Fetching → Done, delete-all runs go
    /// Fetching → Committing; `Failed` is reachable from any non-terminal
    /// state.
    pub fn can_transition_to(&self, next: SyncState) -> bool {
        use SyncState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Idle, Fetching) => true,
            (Fetching, Normalizing | Committing | Done) => true,
            (Normalizing, Reconciling) => true,
            (Reconciling, Committing) => true,
            (Committing, Done) => true,
            _ => false,
        }
    }
}

/// Where a recorded failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "camelCase")]
pub enum FailureStage {
    Normalize,
    Chunk { index: usize },
    Balance,
    Delete,
}

/// Non-fatal failure captured during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    #[serde(flatten)]
    pub stage: FailureStage,
    /// Affected ids (source ids, or destination ids for deletions).
    pub ids: Vec<String>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Fatal error that ended a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureCause {
    pub kind: ErrorKind,
    pub message: String,
    /// State the run was in when it failed.
    pub failed_in: SyncState,
}

/// Summary of one run. Created at start, finalized at the end, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub run_id: String,
    pub mode: OperationMode,
    pub state: SyncState,
    /// Every state visited, starting with `Idle`.
    pub state_history: Vec<SyncState>,
    /// Source activities fetched.
    pub fetched: u32,
    /// Transactions produced by the normalizer.
    pub normalized: u32,
    pub skipped_unsupported: u32,
    /// Already imported or repeated within the fetch.
    pub skipped_duplicate: u32,
    pub imported: u32,
    /// Activities that were not imported or deleted. Run-level failures such
    /// as the balance refresh are only listed in `failures`.
    pub failed: u32,
    pub removed: u32,
    pub listed: u32,
    /// Cash balance pushed to the destination account.
    pub balance: Option<Decimal>,
    pub failures: Vec<SyncFailure>,
    pub cause: Option<FailureCause>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub listed_activities: Vec<DestinationActivity>,
}

impl SyncReport {
    pub fn new(mode: OperationMode) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            mode,
            state: SyncState::Idle,
            state_history: vec![SyncState::Idle],
            fetched: 0,
            normalized: 0,
            skipped_unsupported: 0,
            skipped_duplicate: 0,
            imported: 0,
            failed: 0,
            removed: 0,
            listed: 0,
            balance: None,
            failures: Vec::new(),
            cause: None,
            started_at: Utc::now(),
            finished_at: None,
            listed_activities: Vec::new(),
        }
    }

    /// Moves the run to `next`, rejecting edges the state machine forbids.
    pub fn transition(&mut self, next: SyncState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::Unexpected(format!(
                "Invalid state transition {} -> {}",
                self.state, next
            )));
        }
        self.state = next;
        self.state_history.push(next);
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Records a non-fatal failure. `failed` is bumped by the number of
    /// activity ids, so run-level failures pass no ids.
    pub fn record_failure(&mut self, stage: FailureStage, ids: Vec<String>, err: &Error) {
        self.failed += ids.len() as u32;
        self.failures.push(SyncFailure {
            stage,
            ids,
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    /// Finalize as `Failed`, keeping all partial progress.
    pub fn fail(&mut self, err: &Error) {
        let failed_in = self.state;
        if self.state.is_terminal() {
            return;
        }
        self.cause = Some(FailureCause {
            kind: err.kind(),
            message: err.to_string(),
            failed_in,
        });
        self.state = SyncState::Failed;
        self.state_history.push(SyncState::Failed);
        self.finished_at = Some(Utc::now());
    }

    pub fn is_success(&self) -> bool {
        self.state == SyncState::Done
    }

    /// Whether the run finished but some items were not applied.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
