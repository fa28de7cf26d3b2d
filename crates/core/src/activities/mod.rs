//! Activities module - source/destination models, normalization and delta
//! reconciliation.

mod activities_constants;
mod activities_model;
mod fingerprint;
mod normalizer;
mod reconciler;


#[cfg(test)]
mod normalizer_tests;


pub use activities_constants::*;
pub use activities_model::{
    CanonicalTransaction, DataSource, DestinationAccount, DestinationActivity, SourceActivity,
    TransactionType,
};
pub use fingerprint::{
    build_index, extract_source_id, marker_comment, FingerprintIndex, SOURCE_ID_MARKER,
};
pub use normalizer::{classify, normalize, parse_timestamp, Normalized};
pub use reconciler::{reconcile, Reconciliation};
