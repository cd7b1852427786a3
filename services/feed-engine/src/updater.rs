//! Per-instrument price update algorithm
//!
//! Each pass makes per-instrument draws: a selection draw gating whether the
//! instrument moves at all, then a magnitude and a direction draw sizing the
//! move against the configured range. All draws come from one shared ChaCha8
//! generator, so a run is reproducible under a fixed seed.

use crate::config::FeedConfig;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use types::instrument::Instrument;
use types::numeric::Price;

/// Direction draws strictly above this raise the price; at or below, they
/// lower it. The resulting 0.49/0.51 split is a deliberate downward bias.
const DIRECTION_UP_THRESHOLD: f64 = 0.51;

/// Draws and applies price perturbations for the update pass.
pub struct PriceUpdater {
    rng: ChaCha8Rng,
    selection_probability: f64,
    range_percent: f64,
    price_dp: u32,
}

impl PriceUpdater {
    /// Create an updater from config. A fixed `rng_seed` makes the whole
    /// draw sequence reproducible.
    pub fn new(config: &FeedConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            selection_probability: config.selection_probability,
            range_percent: config.range_percent,
            price_dp: config.price_dp,
        }
    }

    /// Maybe reprice one instrument. Returns true if it was selected.
    pub fn try_update(&mut self, instrument: &mut Instrument) -> bool {
        let selection: f64 = self.rng.gen();
        let magnitude = if self.range_percent > 0.0 {
            self.rng.gen_range(0.0..self.range_percent)
        } else {
            0.0
        };
        let direction: f64 = self.rng.gen();
        self.apply(instrument, selection, magnitude, direction)
    }

    /// Apply one set of draws to an instrument.
    ///
    /// Split from [`try_update`](Self::try_update) so fixed draw values can
    /// be exercised directly: `selection` gates the update against the
    /// selection probability, `magnitude` scales the move, and a `direction`
    /// above [`DIRECTION_UP_THRESHOLD`] raises the price.
    ///
    /// An unselected instrument is never reported as changed; a selected one
    /// always is, even when its delta rounds to zero.
    pub fn apply(
        &self,
        instrument: &mut Instrument,
        selection: f64,
        magnitude: f64,
        direction: f64,
    ) -> bool {
        if selection > self.selection_probability {
            return false;
        }

        let factor = Decimal::from_f64(magnitude).unwrap_or(Decimal::ZERO);
        let mut delta = (instrument.price().as_decimal() * factor).round_dp(self.price_dp);
        if direction <= DIRECTION_UP_THRESHOLD {
            delta = -delta;
        }
        instrument.set_price(Price::new(instrument.price().as_decimal() + delta));
        true
    }
}
