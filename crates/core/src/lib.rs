//! brokersync core - domain models, sync engine, and capability traits.
//!
//! This crate owns the sync-and-deduplication engine: normalizing brokerage
//! activities, reconciling them against what the portfolio tracker already
//! holds, and committing the delta in bounded chunks. It performs no I/O of its
//! own; remote systems are reached through the traits in [`sync`], which are
//! implemented by the `connect` crate.

pub mod activities;
pub mod errors;
pub mod retry;
pub mod symbols;
pub mod sync;

pub use activities::{
    CanonicalTransaction, DataSource, DestinationAccount, DestinationActivity, SourceActivity,
    TransactionType,
};
pub use retry::{RetryClass, RetryPolicy};
pub use symbols::SymbolMap;
pub use sync::{
    BatchCommitter, BatchItemResult, DestinationLedger, LogProgressReporter, NoOpProgressReporter,
    OperationMode, SourceActivityProvider, SymbolMapSource, SyncConfig, SyncOrchestrator,
    SyncProgressReporter, SyncReport, SyncState,
};

// Re-export error types
pub use errors::{Error, ErrorKind};
pub use errors::Result;
