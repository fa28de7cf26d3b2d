//! Sync engine: capability traits, run configuration, state machine,
//! batch committer and orchestrator.

mod committer;
mod orchestrator;
mod progress;
mod sync_config;
mod sync_report;
mod sync_traits;

pub use committer::BatchCommitter;
pub use orchestrator::SyncOrchestrator;
pub use progress::{ChunkProgress, LogProgressReporter, NoOpProgressReporter, SyncProgressReporter};
pub use sync_config::*;
pub use sync_report::*;
pub use sync_traits::*;
