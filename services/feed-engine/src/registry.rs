//! Concurrent instrument registry
//!
//! Symbol → Instrument map backed by DashMap. The map's internal sharding is
//! the only locking here; it does not give atomicity across keys, so the
//! clear + reseed sequence on reset is serialized by the engine's transition
//! lock, not by the registry.

use crate::config::SeedInstrument;
use dashmap::DashMap;
use std::sync::Arc;
use types::instrument::Instrument;
use types::symbol::Symbol;

/// Shared handle to the concurrent instrument map.
#[derive(Clone, Default)]
pub struct InstrumentRegistry {
    instruments: Arc<DashMap<Symbol, Instrument>>,
}

impl InstrumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            instruments: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace an instrument.
    pub fn insert(&self, instrument: Instrument) {
        self.instruments
            .insert(instrument.symbol().clone(), instrument);
    }

    /// Point lookup by symbol.
    pub fn get(&self, symbol: &Symbol) -> Option<Instrument> {
        self.instruments.get(symbol).map(|entry| entry.value().clone())
    }

    /// Remove every instrument.
    pub fn clear(&self) {
        self.instruments.clear();
    }

    /// Number of registered instruments.
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Snapshot of all instruments, sorted by symbol for stable output.
    pub fn snapshot(&self) -> Vec<Instrument> {
        let mut all: Vec<Instrument> = self
            .instruments
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        all
    }

    /// Visit every instrument exactly once with mutable access.
    pub fn for_each_mut<F>(&self, mut f: F)
    where
        F: FnMut(&mut Instrument),
    {
        for mut entry in self.instruments.iter_mut() {
            f(entry.value_mut());
        }
    }

    /// Drop all instruments and repopulate from the seed set.
    pub fn reseed(&self, seeds: &[SeedInstrument]) {
        self.instruments.clear();
        for seed in seeds {
            self.insert(Instrument::new(seed.symbol.clone(), seed.price));
        }
    }
}
