//! Fixed-point price type
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Feed prices carry two decimal places by convention; the rounding itself
//! happens where deltas are computed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument price in quote currency.
///
/// No lower bound is enforced here. The update algorithm's bounded
/// perturbation keeps simulated prices positive in practice, which the
/// tests assert rather than the type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal value
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Create a whole-number price
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
