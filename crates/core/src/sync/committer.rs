//! Chunked submission of the delta, deletions and the balance refresh.

use std::collections::HashMap;
use std::sync::Arc;

use log::{error, info, warn};

use super::progress::{ChunkProgress, SyncProgressReporter};
use super::sync_report::{FailureStage, SyncReport};
use super::sync_traits::{BatchItemResult, DestinationLedger, SourceActivityProvider};
use crate::activities::{CanonicalTransaction, DestinationAccount, DestinationActivity};
use crate::errors::{Error, Result};
use crate::retry::RetryPolicy;

/// Submits transactions in fixed-size chunks.
///
/// Non-fatal chunk failures are recorded in the report and the next chunk
/// proceeds. Fatal errors (authentication, configuration) abort the
/// remaining work and are returned to the caller.
pub struct BatchCommitter {
    source: Arc<dyn SourceActivityProvider>,
    ledger: Arc<dyn DestinationLedger>,
    chunk_size: usize,
    retry: RetryPolicy,
}

impl BatchCommitter {
    pub fn new(
        source: Arc<dyn SourceActivityProvider>,
        ledger: Arc<dyn DestinationLedger>,
        chunk_size: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            source,
            ledger,
            chunk_size: chunk_size.max(1),
            retry,
        }
    }

    /// Imports `transactions` chunk by chunk, then pushes the source cash
    /// balance to `account`.
    ///
    /// The balance is pushed even when the delta is empty or some chunks
    /// failed.
    pub async fn commit(
        &self,
        transactions: &[CanonicalTransaction],
        account: &DestinationAccount,
        report: &mut SyncReport,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<()> {
        let total = transactions.len().div_ceil(self.chunk_size);
        if total > 0 {
            info!(
                "Importing {} transactions in {} chunks of up to {}",
                transactions.len(),
                total,
                self.chunk_size
            );
        } else {
            info!("No new transactions to import");
        }

        for (index, chunk) in transactions.chunks(self.chunk_size).enumerate() {
            let label = format!("Import chunk {}/{}", index + 1, total);
            let outcome = self
                .retry
                .run(&label, || self.ledger.import_batch(chunk))
                .await;

            let progress = ChunkProgress::new(index, total, chunk.len());
            match outcome {
                Ok(results) => {
                    let (succeeded, failed) = apply_import_results(chunk, results, index, report);
                    reporter.report_chunk(&progress.with_counts(succeeded, failed));
                }
                Err(err) if err.is_fatal() => {
                    error!("{} aborted the run: {}", label, err);
                    return Err(err);
                }
                Err(err) => {
                    warn!("{} failed: {}", label, err);
                    let ids = chunk.iter().map(|t| t.source_id().to_string()).collect();
                    report.record_failure(FailureStage::Chunk { index }, ids, &err);
                    reporter.report_chunk(
                        &progress
                            .with_counts(0, chunk.len())
                            .with_message(err.to_string()),
                    );
                }
            }
        }

        self.push_balance(account, report).await
    }

    async fn push_balance(&self, account: &DestinationAccount, report: &mut SyncReport) -> Result<()> {
        let outcome = async {
            let balance = self
                .retry
                .run("Fetch cash balance", || self.source.fetch_cash_balance(account))
                .await?;
            self.retry
                .run("Update account balance", || {
                    self.ledger.update_account_balance(account, balance)
                })
                .await?;
            Ok::<_, Error>(balance)
        }
        .await;

        match outcome {
            Ok(balance) => {
                info!("Account '{}' balance set to {}", account.name, balance);
                report.balance = Some(balance);
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!("Failed to update account balance: {}", err);
                report.record_failure(FailureStage::Balance, Vec::new(), &err);
                Ok(())
            }
        }
    }

    /// Deletes every given destination activity, chunk by chunk.
    ///
    /// Ids are submitted one at a time and each is announced to the reporter
    /// before its deletion, so a fatal error keeps the count of what was
    /// already removed.
    pub async fn delete_all(
        &self,
        activities: &[DestinationActivity],
        report: &mut SyncReport,
        reporter: &dyn SyncProgressReporter,
    ) -> Result<()> {
        let total = activities.len().div_ceil(self.chunk_size);

        for (index, chunk) in activities.chunks(self.chunk_size).enumerate() {
            let mut succeeded = 0;
            let mut failed = 0;
            let mut last_error = None;

            for activity in chunk {
                reporter.report_delete(activity);
                let ids = std::slice::from_ref(&activity.id);
                let label = format!("Delete activity {}", activity.id);
                let outcome = self
                    .retry
                    .run(&label, || self.ledger.delete_activities(ids))
                    .await;

                let error = match outcome {
                    Ok(results) => match results.into_iter().find(|r| r.id == activity.id) {
                        Some(BatchItemResult { error: None, .. }) => None,
                        Some(BatchItemResult {
                            error: Some(reason),
                            ..
                        }) => Some(Error::Validation(reason)),
                        None => Some(Error::Unexpected("No result reported for item".to_string())),
                    },
                    Err(err) if err.is_fatal() => {
                        error!("{} aborted the run: {}", label, err);
                        info!("Removed {} activities before the abort", report.removed);
                        return Err(err);
                    }
                    Err(err) => Some(err),
                };

                match error {
                    None => {
                        report.removed += 1;
                        succeeded += 1;
                    }
                    Some(err) => {
                        warn!("Failed to delete activity {}: {}", activity.id, err);
                        report.record_failure(
                            FailureStage::Delete,
                            vec![activity.id.clone()],
                            &err,
                        );
                        last_error = Some(err.to_string());
                        failed += 1;
                    }
                }
            }

            let progress =
                ChunkProgress::new(index, total, chunk.len()).with_counts(succeeded, failed);
            match last_error {
                Some(message) => reporter.report_chunk(&progress.with_message(message)),
                None => reporter.report_chunk(&progress),
            }
        }

        info!("Removed {} activities", report.removed);
        Ok(())
    }
}

/// Applies per-item results of one import chunk to the report.
///
/// Items the destination did not report on are counted as failed.
fn apply_import_results(
    chunk: &[CanonicalTransaction],
    results: Vec<BatchItemResult>,
    index: usize,
    report: &mut SyncReport,
) -> (usize, usize) {
    let mut by_id: HashMap<String, Option<String>> = results
        .into_iter()
        .map(|r| (r.id, r.error))
        .collect();

    let mut succeeded = 0;
    let mut failed = 0;
    for transaction in chunk {
        let id = transaction.source_id();
        match by_id.remove(id) {
            Some(None) => {
                report.imported += 1;
                succeeded += 1;
            }
            Some(Some(reason)) => {
                report.record_failure(
                    FailureStage::Chunk { index },
                    vec![id.to_string()],
                    &Error::Validation(reason),
                );
                failed += 1;
            }
            None => {
                report.record_failure(
                    FailureStage::Chunk { index },
                    vec![id.to_string()],
                    &Error::Unexpected("No result reported for item".to_string()),
                );
                failed += 1;
            }
        }
    }
    (succeeded, failed)
}
