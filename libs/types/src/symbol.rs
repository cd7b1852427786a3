//! Instrument symbol type
//!
//! Symbols are the unique key for instruments in the registry, immutable
//! after creation. Uppercase ticker convention (e.g. "MSFT", "GOOG").

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol identifying a simulated instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol from a string
    ///
    /// # Panics
    /// Panics if the symbol is empty
    pub fn new(symbol: impl Into<String>) -> Self {
        let s = symbol.into();
        assert!(!s.is_empty(), "Symbol must not be empty");
        Self(s)
    }

    /// Try to create a Symbol, returning None if empty
    pub fn try_new(symbol: impl Into<String>) -> Option<Self> {
        let s = symbol.into();
        if s.is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the symbol string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new("MSFT");
        assert_eq!(symbol.as_str(), "MSFT");
    }

    #[test]
    fn test_symbol_try_new() {
        assert!(Symbol::try_new("GOOG").is_some());
        assert!(Symbol::try_new("").is_none());
    }

    #[test]
    #[should_panic(expected = "Symbol must not be empty")]
    fn test_symbol_empty_panics() {
        Symbol::new("");
    }

    #[test]
    fn test_symbol_ordering() {
        let mut symbols = vec![Symbol::new("MSFT"), Symbol::new("APPL"), Symbol::new("GOOG")];
        symbols.sort();
        assert_eq!(symbols[0].as_str(), "APPL");
        assert_eq!(symbols[2].as_str(), "MSFT");
    }

    #[test]
    fn test_symbol_serialization() {
        let symbol = Symbol::new("APPL");
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"APPL\"");

        let deserialized: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(symbol, deserialized);
    }
}
