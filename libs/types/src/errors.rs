//! Error types for the feed simulator
//!
//! Single-kind taxonomy using thiserror. Every engine operation other than
//! reset is total: invalid calls are idempotent no-ops rather than errors.

use crate::market::MarketState;
use thiserror::Error;

/// Top-level feed error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("market must be closed to reset, current state: {actual}")]
    InvalidState { actual: MarketState },
}
