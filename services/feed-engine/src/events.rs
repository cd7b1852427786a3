//! Feed event definitions
//!
//! Events fanned out to subscribers by the broadcast sink. Tagged for
//! straightforward JSON delivery at whatever transport sits on the other
//! side of the channel.

use serde::{Deserialize, Serialize};
use types::instrument::Instrument;

/// A market-wide or per-instrument feed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum FeedEvent {
    /// The market opened and the update loop is running.
    MarketOpened,
    /// The market closed; no further update pass will start.
    MarketClosed,
    /// The registry was cleared and restored to the seed set.
    MarketReset,
    /// An instrument was repriced during an update pass.
    PriceUpdated { instrument: Instrument },
}

impl FeedEvent {
    /// Get the event type as a string label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            FeedEvent::MarketOpened => "MarketOpened",
            FeedEvent::MarketClosed => "MarketClosed",
            FeedEvent::MarketReset => "MarketReset",
            FeedEvent::PriceUpdated { .. } => "PriceUpdated",
        }
    }
}
