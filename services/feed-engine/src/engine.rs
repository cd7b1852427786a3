//! Market engine: state machine and update loop
//!
//! One long-lived engine instance owns the market state, the repeating
//! update task, and the registry. Transitions (open/close/reset) may arrive
//! from any thread; a single mutex serializes them, with a lock-free state
//! mirror gating the fast paths. The update pass is separately guarded by a
//! test-and-set flag so overlapping timer ticks drop instead of queueing.

use crate::config::FeedConfig;
use crate::registry::InstrumentRegistry;
use crate::sink::NotificationSink;
use crate::updater::PriceUpdater;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use types::errors::FeedError;
use types::instrument::Instrument;
use types::market::MarketState;

/// State and timer handle, guarded together by the transition mutex.
struct EngineInner {
    state: MarketState,
    ticker: Option<JoinHandle<()>>,
}

/// The market feed engine.
///
/// Construct once and share as `Arc<MarketEngine>`; there is no implicit
/// global instance. [`open`](Self::open) spawns the update task onto the
/// ambient tokio runtime, so transitions must be issued from within one.
pub struct MarketEngine {
    config: FeedConfig,
    registry: InstrumentRegistry,
    sink: Arc<dyn NotificationSink>,
    pass: UpdatePass,
    /// Transition lock: serializes open/close/reset against each other.
    inner: Mutex<EngineInner>,
    /// Lock-free mirror of `inner.state` for fast-path checks and `state()`.
    state_cell: AtomicU8,
}

impl MarketEngine {
    /// Create a closed engine, seeded with the configured instruments.
    pub fn new(config: FeedConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let registry = InstrumentRegistry::new();
        registry.reseed(&config.seed_instruments);

        let pass = UpdatePass {
            registry: registry.clone(),
            sink: Arc::clone(&sink),
            updater: Arc::new(Mutex::new(PriceUpdater::new(&config))),
            updating: Arc::new(AtomicBool::new(false)),
        };

        Self {
            config,
            registry,
            sink,
            pass,
            inner: Mutex::new(EngineInner {
                state: MarketState::Closed,
                ticker: None,
            }),
            state_cell: AtomicU8::new(state_to_u8(MarketState::Closed)),
        }
    }

    /// Current market state, readable without the transition lock.
    pub fn state(&self) -> MarketState {
        state_from_u8(self.state_cell.load(Ordering::Acquire))
    }

    /// Snapshot of all instruments, callable in any state.
    pub fn all_instruments(&self) -> Vec<Instrument> {
        self.registry.snapshot()
    }

    /// Open the market and arm the repeating update task.
    ///
    /// No-op if already open or opening, so at most one timer is ever armed.
    /// The announcement goes out after the transition lock is released and
    /// can therefore never block other transitions on a slow subscriber.
    pub fn open(&self) {
        if matches!(self.state(), MarketState::Open | MarketState::Opening) {
            return;
        }
        {
            let mut inner = self.inner.lock().unwrap();
            // Re-check under the lock: a racing open may have won.
            if matches!(inner.state, MarketState::Open | MarketState::Opening) {
                return;
            }
            self.set_state(&mut inner, MarketState::Opening);
            inner.ticker = Some(self.spawn_ticker());
            self.set_state(&mut inner, MarketState::Open);
        }
        tracing::info!(
            interval_ms = self.config.update_interval_ms,
            "market opened"
        );
        self.sink.announce_open();
    }

    /// Close the market and disarm the update task.
    ///
    /// No-op if already closed or closing. No new update pass starts after
    /// this returns; a pass already executing runs to completion.
    pub fn close(&self) {
        if matches!(self.state(), MarketState::Closed | MarketState::Closing) {
            return;
        }
        {
            let mut inner = self.inner.lock().unwrap();
            if matches!(inner.state, MarketState::Closed | MarketState::Closing) {
                return;
            }
            self.set_state(&mut inner, MarketState::Closing);
            if let Some(ticker) = inner.ticker.take() {
                ticker.abort();
            }
            self.set_state(&mut inner, MarketState::Closed);
        }
        tracing::info!("market closed");
        self.sink.announce_closed();
    }

    /// Clear the registry and restore the seed set.
    ///
    /// Only valid while the market is fully closed. The clear + reseed runs
    /// under the transition lock, so a concurrent open cannot observe a
    /// half-cleared registry. The durable state stays `Closed`.
    pub fn reset(&self) -> Result<(), FeedError> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.state != MarketState::Closed {
                return Err(FeedError::InvalidState { actual: inner.state });
            }
            self.registry.reseed(&self.config.seed_instruments);
        }
        tracing::info!(
            instruments = self.config.seed_instruments.len(),
            "market reset"
        );
        self.sink.announce_reset();
        Ok(())
    }

    /// Run one update pass over the registry.
    ///
    /// Re-entrancy-safe: if a pass is already running, the call returns
    /// immediately without blocking. Driven by the timer while the market is
    /// open; exposed so hosts and tests can also drive passes directly.
    pub fn run_update_pass(&self) {
        self.pass.run();
    }

    fn set_state(&self, inner: &mut EngineInner, state: MarketState) {
        inner.state = state;
        self.state_cell.store(state_to_u8(state), Ordering::Release);
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let pass = self.pass.clone();
        let period = self.config.update_interval();
        tokio::spawn(async move {
            let mut ticks = time::interval(period);
            // Overlap is already handled by the pass guard; after a stall,
            // resume the cadence instead of burst-firing.
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                pass.run();
            }
        })
    }
}

/// The shared parts of the update pass, cloned into the timer task.
#[derive(Clone)]
struct UpdatePass {
    registry: InstrumentRegistry,
    sink: Arc<dyn NotificationSink>,
    updater: Arc<Mutex<PriceUpdater>>,
    updating: Arc<AtomicBool>,
}

impl UpdatePass {
    fn run(&self) {
        // Cheap unsynchronized read first: the common contended case is
        // "previous pass still running", which must not touch any lock.
        if self.updating.load(Ordering::Relaxed) {
            return;
        }
        if self
            .updating
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        // Cleared on every exit path, panics included. A flag left set
        // would silently drop all future passes.
        let _in_progress = ClearOnDrop(&self.updating);

        let mut updater = match self.updater.lock() {
            Ok(guard) => guard,
            // A panic mid-pass poisons the lock; the RNG state is still
            // sound, so recover it rather than killing every later pass.
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut visited = 0usize;
        let mut changed = 0usize;
        self.registry.for_each_mut(|instrument| {
            visited += 1;
            if updater.try_update(instrument) {
                changed += 1;
                self.sink.publish_price(instrument);
            }
        });
        tracing::debug!(visited, changed, "update pass complete");
    }
}

/// Clears the update-in-progress flag when dropped.
struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn state_to_u8(state: MarketState) -> u8 {
    match state {
        MarketState::Opening => 0,
        MarketState::Open => 1,
        MarketState::Closing => 2,
        MarketState::Closed => 3,
    }
}

fn state_from_u8(raw: u8) -> MarketState {
    match raw {
        0 => MarketState::Opening,
        1 => MarketState::Open,
        2 => MarketState::Closing,
        _ => MarketState::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use rust_decimal::Decimal;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    /// Always-select config with a fixed seed and a quick cadence.
    fn test_config() -> FeedConfig {
        FeedConfig {
            update_interval_ms: 250,
            selection_probability: 1.0,
            rng_seed: Some(42),
            ..FeedConfig::default()
        }
    }

    fn test_engine(config: FeedConfig) -> (Arc<MarketEngine>, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let engine = Arc::new(MarketEngine::new(config, sink.clone()));
        (engine, sink)
    }

    #[tokio::test]
    async fn test_initial_state_is_closed() {
        let (engine, sink) = test_engine(test_config());
        assert_eq!(engine.state(), MarketState::Closed);
        assert!(sink.events().is_empty());
        assert_eq!(engine.all_instruments().len(), 3);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        assert_eq!(engine.state(), MarketState::Open);
        engine.open();

        assert_eq!(sink.count("MarketOpened"), 1);
        engine.close();
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let (engine, sink) = test_engine(test_config());

        engine.close();
        engine.close();

        assert_eq!(engine.state(), MarketState::Closed);
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_open_close_broadcasts_once_each() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        engine.close();
        engine.close();

        assert_eq!(sink.count("MarketOpened"), 1);
        assert_eq!(sink.count("MarketClosed"), 1);
        assert_eq!(engine.state(), MarketState::Closed);
    }

    #[tokio::test]
    async fn test_reset_fails_while_open() {
        let (engine, sink) = test_engine(test_config());
        engine.open();
        let before = engine.all_instruments();

        let err = engine.reset().unwrap_err();
        assert_eq!(
            err,
            FeedError::InvalidState {
                actual: MarketState::Open
            }
        );
        assert_eq!(engine.all_instruments(), before);
        assert_eq!(sink.count("MarketReset"), 0);

        engine.close();
    }

    #[tokio::test]
    async fn test_reset_restores_seed_set() {
        let (engine, sink) = test_engine(test_config());

        // Drift the prices away from the seed values.
        engine.run_update_pass();
        engine.run_update_pass();

        engine.reset().unwrap();

        let snapshot = engine.all_instruments();
        let expected = FeedConfig::default();
        assert_eq!(snapshot.len(), 3);
        for (inst, seed) in snapshot.iter().zip({
            let mut seeds = expected.seed_instruments.clone();
            seeds.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            seeds
        }) {
            assert_eq!(inst.symbol(), &seed.symbol);
            assert_eq!(inst.price(), seed.price);
            assert_eq!(inst.change(), Decimal::ZERO);
        }
        assert_eq!(sink.count("MarketReset"), 1);
    }

    #[tokio::test]
    async fn test_reset_on_fresh_engine() {
        let (engine, sink) = test_engine(test_config());

        engine.reset().unwrap();

        assert_eq!(engine.all_instruments().len(), 3);
        assert_eq!(sink.count("MarketReset"), 1);
        assert_eq!(engine.state(), MarketState::Closed);
    }

    #[tokio::test]
    async fn test_update_pass_publishes_selected_instruments() {
        let (engine, sink) = test_engine(test_config());

        // selection_probability 1.0 selects every instrument.
        engine.run_update_pass();

        assert_eq!(sink.count("PriceUpdated"), 3);
    }

    #[tokio::test]
    async fn test_sequential_passes_both_run() {
        let (engine, sink) = test_engine(test_config());

        engine.run_update_pass();
        engine.run_update_pass();

        assert_eq!(sink.count("PriceUpdated"), 6);
    }

    /// Blocks inside publish_price until released, to hold a pass open.
    struct BlockingSink {
        publishes: AtomicUsize,
        entered_tx: Mutex<mpsc::Sender<()>>,
        release_rx: Mutex<mpsc::Receiver<()>>,
    }

    impl NotificationSink for BlockingSink {
        fn announce_open(&self) {}
        fn announce_closed(&self) {}
        fn announce_reset(&self) {}
        fn publish_price(&self, _instrument: &Instrument) {
            self.publishes.fetch_add(1, Ordering::SeqCst);
            self.entered_tx.lock().unwrap().send(()).unwrap();
            self.release_rx.lock().unwrap().recv().unwrap();
        }
    }

    #[test]
    fn test_overlapping_passes_drop_the_loser() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let sink = Arc::new(BlockingSink {
            publishes: AtomicUsize::new(0),
            entered_tx: Mutex::new(entered_tx),
            release_rx: Mutex::new(release_rx),
        });

        let config = FeedConfig {
            selection_probability: 1.0,
            rng_seed: Some(42),
            seed_instruments: vec![FeedConfig::default().seed_instruments[0].clone()],
            ..FeedConfig::default()
        };
        let engine = Arc::new(MarketEngine::new(config, sink.clone()));

        let worker = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.run_update_pass())
        };
        // First pass is now parked inside the sink.
        entered_rx.recv().unwrap();

        // Overlapping invocation must return immediately, without entering
        // the pass body.
        engine.run_update_pass();
        assert_eq!(sink.publishes.load(Ordering::SeqCst), 1);

        release_tx.send(()).unwrap();
        worker.join().unwrap();

        // Flag cleared: the next pass runs again.
        release_tx.send(()).unwrap();
        engine.run_update_pass();
        assert_eq!(sink.publishes.load(Ordering::SeqCst), 2);
    }

    /// Panics on publish while armed.
    struct PanickySink {
        armed: AtomicBool,
        publishes: AtomicUsize,
    }

    impl NotificationSink for PanickySink {
        fn announce_open(&self) {}
        fn announce_closed(&self) {}
        fn announce_reset(&self) {}
        fn publish_price(&self, _instrument: &Instrument) {
            if self.armed.load(Ordering::SeqCst) {
                panic!("subscriber delivery failed");
            }
            self.publishes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_update_pass_survives_sink_panic() {
        let sink = Arc::new(PanickySink {
            armed: AtomicBool::new(true),
            publishes: AtomicUsize::new(0),
        });
        let engine = Arc::new(MarketEngine::new(test_config(), sink.clone()));

        let result =
            std::panic::catch_unwind(AssertUnwindSafe(|| engine.run_update_pass()));
        assert!(result.is_err());

        // The in-progress flag must not stay set after the panic.
        sink.armed.store(false, Ordering::SeqCst);
        engine.run_update_pass();
        assert_eq!(sink.publishes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_arms_the_update_timer() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        // Ticks land at 0, 250, 500, 750 and 1000ms: five passes over the
        // three always-selected instruments.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        engine.close();

        assert_eq!(sink.count("PriceUpdated"), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_open_arms_no_second_timer() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        engine.open();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        engine.close();

        // A duplicate timer would double this.
        assert_eq!(sink.count("PriceUpdated"), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_stops_the_timer() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        tokio::time::sleep(Duration::from_millis(600)).await;
        engine.close();
        let after_close = sink.count("PriceUpdated");

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(sink.count("PriceUpdated"), after_close);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_close() {
        let (engine, sink) = test_engine(test_config());

        engine.open();
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.close();
        engine.open();
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.close();

        assert_eq!(sink.count("MarketOpened"), 2);
        assert_eq!(sink.count("MarketClosed"), 2);
        // Each open fires the immediate first tick.
        assert!(sink.count("PriceUpdated") >= 6);
    }
}
