//! Engine configuration
//!
//! Tunables for the simulated feed. Defaults match the reference setup:
//! a 250ms update cadence, roughly 10% of instruments repriced per pass,
//! moves bounded at 0.8% of price, 2-decimal prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::numeric::Price;
use types::symbol::Symbol;

/// One entry of the registry seed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedInstrument {
    pub symbol: Symbol,
    pub price: Price,
}

/// Configuration for the market feed engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Update pass cadence in milliseconds.
    pub update_interval_ms: u64,
    /// Probability that a given instrument is repriced in a pass (0.0 to 1.0).
    pub selection_probability: f64,
    /// Upper bound on a single move, as a fraction of the current price.
    pub range_percent: f64,
    /// Decimal places price deltas are rounded to.
    pub price_dp: u32,
    /// Fixed RNG seed for reproducible runs; None draws from OS entropy.
    pub rng_seed: Option<u64>,
    /// Instruments the registry is seeded with, at creation and on reset.
    pub seed_instruments: Vec<SeedInstrument>,
}

impl FeedConfig {
    /// Update pass cadence as a Duration.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 250,
            selection_probability: 0.10,
            range_percent: 0.008,
            price_dp: 2,
            rng_seed: None,
            seed_instruments: vec![
                SeedInstrument {
                    symbol: Symbol::new("MSFT"),
                    price: Price::new(Decimal::from_str_exact("26.31").unwrap()),
                },
                SeedInstrument {
                    symbol: Symbol::new("APPL"),
                    price: Price::new(Decimal::from_str_exact("404.18").unwrap()),
                },
                SeedInstrument {
                    symbol: Symbol::new("GOOG"),
                    price: Price::new(Decimal::from_str_exact("596.30").unwrap()),
                },
            ],
        }
    }
}
