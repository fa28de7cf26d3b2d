//! Sync orchestrator.
//!
//! Sequences fetching, normalization, reconciliation and commit under the
//! three operation modes and aggregates the outcome into a [`SyncReport`].

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};

use super::committer::BatchCommitter;
use super::progress::SyncProgressReporter;
use super::sync_config::{OperationMode, SyncConfig};
use super::sync_report::{FailureStage, SyncReport, SyncState};
use super::sync_traits::{DestinationLedger, SourceActivityProvider, SymbolMapSource};
use crate::activities::{build_index, normalize, reconcile, DestinationAccount, Normalized};
use crate::errors::{Error, Result};

/// Orchestrates one run against a source and a destination.
///
/// # Example
///
/// ```ignore
/// let orchestrator = SyncOrchestrator::new(alpaca, ghostfolio, symbol_file, Arc::new(LogProgressReporter));
/// let report = orchestrator.run(&SyncConfig::default()).await;
/// ```
pub struct SyncOrchestrator<P: SyncProgressReporter> {
    source: Arc<dyn SourceActivityProvider>,
    ledger: Arc<dyn DestinationLedger>,
    symbols: Arc<dyn SymbolMapSource>,
    progress_reporter: Arc<P>,
}

impl<P: SyncProgressReporter> SyncOrchestrator<P> {
    pub fn new(
        source: Arc<dyn SourceActivityProvider>,
        ledger: Arc<dyn DestinationLedger>,
        symbols: Arc<dyn SymbolMapSource>,
        progress_reporter: Arc<P>,
    ) -> Self {
        Self {
            source,
            ledger,
            symbols,
            progress_reporter,
        }
    }

    /// Execute one run.
    ///
    /// Never returns an error: a fatal failure is captured in the report
    /// (state `Failed`, with the cause and the state it failed in).
    pub async fn run(&self, config: &SyncConfig) -> SyncReport {
        let mut report = SyncReport::new(config.mode);
        self.progress_reporter
            .report_sync_start(&report.run_id, config.mode);

        let result = match config.validate() {
            Ok(()) => match config.mode {
                OperationMode::Sync => self.run_sync(config, &mut report).await,
                OperationMode::List => self.run_list(config, &mut report).await,
                OperationMode::DeleteAll => self.run_delete_all(config, &mut report).await,
            },
            Err(err) => Err(err),
        };

        match result.and_then(|()| self.transition(&mut report, SyncState::Done)) {
            Ok(()) => {}
            Err(err) => {
                error!("{} run failed in {}: {}", config.mode, report.state, err);
                self.progress_reporter
                    .report_transition(report.state, SyncState::Failed);
                report.fail(&err);
            }
        }

        self.progress_reporter.report_sync_complete(&report);
        report
    }

    fn transition(&self, report: &mut SyncReport, next: SyncState) -> Result<()> {
        let from = report.state;
        report.transition(next)?;
        self.progress_reporter.report_transition(from, next);
        Ok(())
    }

    fn committer(&self, config: &SyncConfig) -> BatchCommitter {
        BatchCommitter::new(
            self.source.clone(),
            self.ledger.clone(),
            config.chunk_size,
            config.retry.clone(),
        )
    }

    /// Finds the destination account, creating it when `create` is set.
    async fn resolve_account(&self, config: &SyncConfig, create: bool) -> Result<DestinationAccount> {
        let name = config.account_name.as_str();
        let existing = config
            .retry
            .run("Find destination account", || self.ledger.find_account(name))
            .await?;

        match existing {
            Some(account) => {
                debug!("Using account '{}' ({})", account.name, account.id);
                Ok(account)
            }
            None if create => {
                info!("Creating account '{}' in {}", name, config.currency);
                // Single attempt, account creation is not idempotent.
                self.ledger
                    .create_account(name, &config.currency, config.platform_id.as_deref())
                    .await
            }
            None => Err(Error::NotFound(format!("Account '{}' does not exist", name))),
        }
    }

    async fn run_sync(&self, config: &SyncConfig, report: &mut SyncReport) -> Result<()> {
        let symbols = self.symbols.load()?;
        info!("Loaded {} symbol mappings", symbols.len());

        self.transition(report, SyncState::Fetching)?;
        let account = self.resolve_account(config, true).await?;
        let since = config.since(Utc::now().date_naive());
        if let Some(since) = since {
            info!("Fetching activities after {}", since);
        }
        let activities = config
            .retry
            .run("Fetch source activities", || {
                self.source.fetch_activities(&account, since)
            })
            .await?;
        report.fetched = activities.len() as u32;
        info!("Fetched {} source activities", activities.len());

        self.transition(report, SyncState::Normalizing)?;
        let mut transactions = Vec::with_capacity(activities.len());
        for activity in &activities {
            match normalize(activity, &symbols, &account) {
                Ok(Normalized::Transaction(tx)) => transactions.push(tx),
                Ok(Normalized::Skip(_)) => report.skipped_unsupported += 1,
                Err(err) => {
                    warn!("{}", err);
                    report.record_failure(FailureStage::Normalize, vec![activity.id.clone()], &err);
                }
            }
        }
        report.normalized = transactions.len() as u32;

        self.transition(report, SyncState::Reconciling)?;
        let existing = config
            .retry
            .run("List destination activities", || {
                self.ledger.list_activities(&account)
            })
            .await?;
        let index = build_index(&existing);
        debug!(
            "{} destination activities, {} carry a source id",
            existing.len(),
            index.len()
        );
        let reconciliation = reconcile(transactions, &index);
        report.skipped_duplicate = reconciliation.skipped() as u32;
        info!(
            "{} new transactions, {} already imported",
            reconciliation.delta.len(),
            reconciliation.skipped()
        );

        self.transition(report, SyncState::Committing)?;
        self.committer(config)
            .commit(
                &reconciliation.delta,
                &account,
                report,
                self.progress_reporter.as_ref(),
            )
            .await
    }

    async fn run_list(&self, config: &SyncConfig, report: &mut SyncReport) -> Result<()> {
        self.transition(report, SyncState::Fetching)?;
        let account = self.resolve_account(config, false).await?;
        let activities = config
            .retry
            .run("List destination activities", || {
                self.ledger.list_activities(&account)
            })
            .await?;

        info!(
            "Account '{}' holds {} activities",
            account.name,
            activities.len()
        );
        for activity in &activities {
            info!(
                "{} | {} | {} | {} | {}",
                activity.id,
                activity.date.as_deref().unwrap_or("-"),
                activity.activity_type.as_deref().unwrap_or("-"),
                activity.symbol.as_deref().unwrap_or("-"),
                activity.comment.as_deref().unwrap_or("")
            );
        }
        report.listed = activities.len() as u32;
        report.listed_activities = activities;
        Ok(())
    }

    async fn run_delete_all(&self, config: &SyncConfig, report: &mut SyncReport) -> Result<()> {
        self.transition(report, SyncState::Fetching)?;
        let account = self.resolve_account(config, false).await?;
        let activities = config
            .retry
            .run("List destination activities", || {
                self.ledger.list_activities(&account)
            })
            .await?;
        report.fetched = activities.len() as u32;
        warn!(
            "Deleting all {} activities from account '{}'",
            activities.len(),
            account.name
        );

        self.transition(report, SyncState::Committing)?;
        self.committer(config)
            .delete_all(&activities, report, self.progress_reporter.as_ref())
            .await
    }
}
