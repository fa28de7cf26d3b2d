//! brokersync connect - HTTP adapters for the remote systems a sync run
//! talks to.
//!
//! [`AlpacaClient`] implements the source side, [`GhostfolioClient`] the
//! destination side and [`TomlSymbolMapFile`] loads the symbol map.

pub mod alpaca;
pub mod ghostfolio;
pub mod http;
pub mod symbol_map;

// Re-export commonly used types
pub use alpaca::{AlpacaClient, DEFAULT_ALPACA_BASE_URL};
pub use ghostfolio::{GhostfolioClient, DEFAULT_GHOSTFOLIO_HOST};
pub use http::{classify_status, DEFAULT_TIMEOUT_SECS};
pub use symbol_map::{TomlSymbolMapFile, DEFAULT_SYMBOL_MAPPING_FILE};
