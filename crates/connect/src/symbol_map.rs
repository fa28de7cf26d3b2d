//! Symbol map loaded from a TOML file.
//!
//! ```toml
//! [symbol_mapping]
//! "BTC/USD" = "BTCUSD"
//! "BRK.B" = "BRK-B"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Deserialize;

use brokersync_core::errors::{Error, Result};
use brokersync_core::symbols::SymbolMap;
use brokersync_core::sync::SymbolMapSource;

/// Default location of the mapping file, relative to the working directory.
pub const DEFAULT_SYMBOL_MAPPING_FILE: &str = "mapping.toml";

#[derive(Debug, Default, Deserialize)]
struct SymbolMappingFile {
    #[serde(default)]
    symbol_mapping: HashMap<String, String>,
}

/// Reads the `[symbol_mapping]` table of a TOML file.
///
/// A missing file yields an empty map. An unreadable or invalid file is a
/// configuration error.
#[derive(Debug, Clone)]
pub struct TomlSymbolMapFile {
    path: PathBuf,
}

impl TomlSymbolMapFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolMapSource for TomlSymbolMapFile {
    fn load(&self) -> Result<SymbolMap> {
        if !self.path.exists() {
            info!(
                "Symbol mapping file {} not found, no symbols will be remapped",
                self.path.display()
            );
            return Ok(SymbolMap::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let parsed: SymbolMappingFile = toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Invalid symbol mapping {}: {}", self.path.display(), e))
        })?;

        debug!(
            "Loaded {} symbol mappings from {}",
            parsed.symbol_mapping.len(),
            self.path.display()
        );
        Ok(SymbolMap::new(parsed.symbol_mapping))
    }
}
