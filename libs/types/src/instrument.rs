//! Simulated tradable instrument
//!
//! An instrument is owned by the registry and mutated in place only by the
//! engine's update pass. Every effective price write maintains the intraday
//! statistics (day open/low/high, last change); a write of the current price
//! is a no-op.

use crate::numeric::Price;
use crate::symbol::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places for the percent-change accessor.
const PERCENT_DP: u32 = 4;

/// A tradable instrument in the simulated feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    symbol: Symbol,
    price: Price,
    day_open: Price,
    day_low: Price,
    day_high: Price,
    last_change: Decimal,
}

impl Instrument {
    /// Create an instrument at its opening price.
    pub fn new(symbol: Symbol, price: Price) -> Self {
        Self {
            symbol,
            price,
            day_open: price,
            day_low: price,
            day_high: price,
            last_change: Decimal::ZERO,
        }
    }

    /// Unique registry key.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Current price.
    pub fn price(&self) -> Price {
        self.price
    }

    /// Price at creation (or last reseed).
    pub fn day_open(&self) -> Price {
        self.day_open
    }

    /// Lowest price seen today.
    pub fn day_low(&self) -> Price {
        self.day_low
    }

    /// Highest price seen today.
    pub fn day_high(&self) -> Price {
        self.day_high
    }

    /// Signed delta of the most recent effective price write.
    pub fn last_change(&self) -> Decimal {
        self.last_change
    }

    /// Write a new price, maintaining the intraday statistics.
    ///
    /// Writing the current price leaves everything untouched, including
    /// `last_change`.
    pub fn set_price(&mut self, price: Price) {
        if price == self.price {
            return;
        }
        self.last_change = price.as_decimal() - self.price.as_decimal();
        self.price = price;
        if price < self.day_low {
            self.day_low = price;
        }
        if price > self.day_high {
            self.day_high = price;
        }
    }

    /// Net change since day open.
    pub fn change(&self) -> Decimal {
        self.price.as_decimal() - self.day_open.as_decimal()
    }

    /// Net change as a fraction of the current price, rounded to 4 dp.
    pub fn percent_change(&self) -> Decimal {
        let price = self.price.as_decimal();
        if price.is_zero() {
            return Decimal::ZERO;
        }
        (self.change() / price).round_dp(PERCENT_DP)
    }
}
