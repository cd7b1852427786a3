//! Market Feed Engine
//!
//! Simulates a live market feed: one long-lived engine owns a set of
//! tradable instruments, periodically perturbs their prices, and notifies
//! subscribers of price changes and market-wide transitions
//! (open/closed/reset).
//!
//! # Architecture
//!
//! ```text
//!  Operator commands         Tokio interval task
//!  (open/close/reset)           (every 250ms)
//!        │                           │
//!   ┌────▼─────────┐         ┌───────▼──────┐
//!   │ MarketEngine │────────▶│ Update pass  │
//!   │ state machine│  arms   │ (re-entrant- │
//!   └────┬─────────┘         │    safe)     │
//!        │                   └───┬──────┬───┘
//!        │                       │      │
//!   ┌────▼─────────┐   ┌─────────▼──┐ ┌─▼────────────┐
//!   │   Registry   │◀──│PriceUpdater│ │ Notification │
//!   │  (DashMap)   │   │  (ChaCha8) │ │     Sink     │
//!   └──────────────┘   └────────────┘ └──────────────┘
//! ```
//!
//! The notification sink is an opaque collaborator: announcements and price
//! publications are fire-and-forget, and a slow subscriber can never corrupt
//! engine state — overlapping timer ticks are dropped, not queued.

pub mod config;
pub mod engine;
pub mod events;
pub mod registry;
pub mod sink;
pub mod updater;

pub use config::{FeedConfig, SeedInstrument};
pub use engine::MarketEngine;
pub use events::FeedEvent;
pub use registry::InstrumentRegistry;
pub use sink::{BroadcastSink, NotificationSink, NullSink, RecordingSink};

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
