//! Source → destination symbol mapping.

use std::collections::HashMap;

use log::debug;

/// Read-only symbol lookup, loaded once per run.
///
/// Symbols without an entry pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolMap {
    entries: HashMap<String, String>,
}

impl SymbolMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Resolve a raw source symbol to its destination form.
    pub fn resolve<'a>(&'a self, symbol: &'a str) -> &'a str {
        match self.entries.get(symbol) {
            Some(mapped) => {
                debug!("Mapped symbol: {} -> {}", symbol, mapped);
                mapped.as_str()
            }
            None => symbol,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for SymbolMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
