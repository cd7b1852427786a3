//! Market lifecycle state
//!
//! One process-wide value owned by the engine. `Opening` and `Closing` are
//! short-lived transitional values observed only while a transition holds
//! the engine lock. A reset is broadcast as an event and leaves the durable
//! state at `Closed` — it is not a state of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current lifecycle state of the simulated market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketState {
    /// The update timer is being armed.
    Opening,
    /// The market is live; the update loop is running.
    Open,
    /// The update timer is being disarmed.
    Closing,
    /// The market is fully closed. Initial state.
    Closed,
}

impl MarketState {
    /// Get the state as a string label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            MarketState::Opening => "Opening",
            MarketState::Open => "Open",
            MarketState::Closing => "Closing",
            MarketState::Closed => "Closed",
        }
    }
}

impl fmt::Display for MarketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
