//! Notification sink boundary
//!
//! The engine treats subscriber delivery as an opaque collaborator: three
//! market-wide announcements plus per-instrument price publication, all
//! fire-and-forget. Failures never propagate back into the engine.

use crate::events::FeedEvent;
use std::sync::Mutex;
use tokio::sync::broadcast;
use types::instrument::Instrument;

/// Receives market-wide announcements and per-instrument price updates.
///
/// Implementations must be cheap and non-blocking: they are invoked from
/// transition bodies and from inside the update pass.
pub trait NotificationSink: Send + Sync {
    fn announce_open(&self);
    fn announce_closed(&self);
    fn announce_reset(&self);
    fn publish_price(&self, instrument: &Instrument);
}

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 256;

/// Fans feed events out over a tokio broadcast channel.
///
/// Slow receivers lag and lose events rather than block the engine.
pub struct BroadcastSink {
    tx: broadcast::Sender<FeedEvent>,
}

impl BroadcastSink {
    /// Create a sink with an explicit channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the feed.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    /// Number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, event: FeedEvent) {
        // Err only means nobody is listening right now; the feed keeps going.
        let _ = self.tx.send(event);
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl NotificationSink for BroadcastSink {
    fn announce_open(&self) {
        self.send(FeedEvent::MarketOpened);
    }

    fn announce_closed(&self) {
        self.send(FeedEvent::MarketClosed);
    }

    fn announce_reset(&self) {
        self.send(FeedEvent::MarketReset);
    }

    fn publish_price(&self, instrument: &Instrument) {
        self.send(FeedEvent::PriceUpdated {
            instrument: instrument.clone(),
        });
    }
}

/// Records every event in memory, in arrival order. Used by tests and
/// offline tooling.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<FeedEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<FeedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded events with the given label.
    pub fn count(&self, label: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.label() == label)
            .count()
    }

    fn record(&self, event: FeedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl NotificationSink for RecordingSink {
    fn announce_open(&self) {
        self.record(FeedEvent::MarketOpened);
    }

    fn announce_closed(&self) {
        self.record(FeedEvent::MarketClosed);
    }

    fn announce_reset(&self) {
        self.record(FeedEvent::MarketReset);
    }

    fn publish_price(&self, instrument: &Instrument) {
        self.record(FeedEvent::PriceUpdated {
            instrument: instrument.clone(),
        });
    }
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn announce_open(&self) {}
    fn announce_closed(&self) {}
    fn announce_reset(&self) {}
    fn publish_price(&self, _instrument: &Instrument) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::numeric::Price;
    use types::symbol::Symbol;

    fn msft() -> Instrument {
        Instrument::new(
            Symbol::new("MSFT"),
            Price::new(Decimal::from_str_exact("26.31").unwrap()),
        )
    }

    #[test]
    fn test_broadcast_delivers_to_subscriber() {
        let sink = BroadcastSink::default();
        let mut rx = sink.subscribe();

        sink.announce_open();
        sink.publish_price(&msft());

        assert_eq!(rx.try_recv().unwrap(), FeedEvent::MarketOpened);
        match rx.try_recv().unwrap() {
            FeedEvent::PriceUpdated { instrument } => {
                assert_eq!(instrument.symbol().as_str(), "MSFT");
            }
            other => panic!("expected PriceUpdated, got {}", other.label()),
        }
    }

    #[test]
    fn test_broadcast_without_receivers_is_silent() {
        let sink = BroadcastSink::default();
        assert_eq!(sink.receiver_count(), 0);

        // Must not panic or error out.
        sink.announce_open();
        sink.announce_closed();
        sink.announce_reset();
        sink.publish_price(&msft());
    }

    #[test]
    fn test_recording_sink_counts_by_label() {
        let sink = RecordingSink::new();
        sink.announce_open();
        sink.publish_price(&msft());
        sink.publish_price(&msft());
        sink.announce_closed();

        assert_eq!(sink.count("MarketOpened"), 1);
        assert_eq!(sink.count("PriceUpdated"), 2);
        assert_eq!(sink.count("MarketClosed"), 1);
        assert_eq!(sink.count("MarketReset"), 0);
        assert_eq!(sink.events().len(), 4);
    }
}
