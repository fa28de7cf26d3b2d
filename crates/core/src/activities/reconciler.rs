//! Delta computation against the fingerprint index.

use std::collections::HashSet;

use log::debug;

use super::activities_model::CanonicalTransaction;
use super::fingerprint::FingerprintIndex;

/// Result of reconciling one fetch against the destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Transactions to import, in fetch order.
    pub delta: Vec<CanonicalTransaction>,
    /// Source ids found in the destination already.
    pub already_imported: Vec<String>,
    /// Source ids seen more than once in this fetch (later copies dropped).
    pub repeated_in_batch: Vec<String>,
}

impl Reconciliation {
    /// Number of transactions dropped for either reason.
    pub fn skipped(&self) -> usize {
        self.already_imported.len() + self.repeated_in_batch.len()
    }
}

/// Keeps transactions whose source id is not in `index`.
///
/// Repeats inside the batch are collapsed first, keeping the first
/// occurrence, so each source id is submitted at most once per run.
pub fn reconcile(
    normalized: Vec<CanonicalTransaction>,
    index: &FingerprintIndex,
) -> Reconciliation {
    let mut seen: HashSet<String> = HashSet::with_capacity(normalized.len());
    let mut result = Reconciliation::default();

    for transaction in normalized {
        let source_id = transaction.source_id().to_string();
        if !seen.insert(source_id.clone()) {
            debug!("Dropping repeated source id {} in batch", source_id);
            result.repeated_in_batch.push(source_id);
            continue;
        }
        if index.contains(&source_id) {
            result.already_imported.push(source_id);
            continue;
        }
        result.delta.push(transaction);
    }

    debug!(
        "Reconciled: {} new, {} already imported, {} repeated",
        result.delta.len(),
        result.already_imported.len(),
        result.repeated_in_batch.len()
    );
    result
}
