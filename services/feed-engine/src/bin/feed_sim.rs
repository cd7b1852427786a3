//! Feed simulator demo
//!
//! Constructs the singleton engine wired to a broadcast sink, opens the
//! market, logs a few seconds of feed events, then closes and resets.

use feed_engine::{BroadcastSink, FeedConfig, FeedEvent, MarketEngine};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = FeedConfig::default();
    let sink = Arc::new(BroadcastSink::default());
    let mut feed = sink.subscribe();
    let engine = Arc::new(MarketEngine::new(config, sink.clone()));

    tracing::info!("starting feed simulator");
    for instrument in engine.all_instruments() {
        tracing::info!(
            symbol = %instrument.symbol(),
            price = %instrument.price(),
            "seeded instrument"
        );
    }

    engine.open();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => break,
            event = feed.recv() => match event {
                Ok(FeedEvent::PriceUpdated { instrument }) => {
                    tracing::info!(
                        symbol = %instrument.symbol(),
                        price = %instrument.price(),
                        change = %instrument.change(),
                        percent = %instrument.percent_change(),
                        "price update"
                    );
                }
                Ok(event) => {
                    tracing::info!(event = event.label(), "market event");
                }
                Err(err) => {
                    tracing::warn!(%err, "feed receiver lagged");
                }
            },
        }
    }

    engine.close();
    engine.reset()?;
    tracing::info!("feed simulator stopped");
    Ok(())
}
