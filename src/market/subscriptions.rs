use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::StrategyEvent;
use crate::market::MarketDataClient;
use crate::market::market_source::MarketDataSource;
use crate::types::instrument::InstrumentId;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Keeps one reconnecting feed task per subscribed instrument.
pub struct FeedSubscriptions {
    source: Arc<dyn MarketDataSource>,
    events: mpsc::Sender<StrategyEvent>,
    tasks: HashMap<InstrumentId, JoinHandle<()>>,
}

impl FeedSubscriptions {
    pub fn new(source: Arc<dyn MarketDataSource>, events: mpsc::Sender<StrategyEvent>) -> Self {
        Self {
            source,
            events,
            tasks: HashMap::new(),
        }
    }
}

impl MarketDataClient for FeedSubscriptions {
    fn subscribe_book_deltas(&mut self, instrument_id: &InstrumentId, depth: u32) -> Result<()> {
        if self.tasks.contains_key(instrument_id) {
            bail!("already subscribed to book deltas for {instrument_id}");
        }

        let source = self.source.clone();
        let events = self.events.clone();
        let id = instrument_id.clone();

        let task = tokio::spawn(async move {
            loop {
                if let Err(error) = source.subscribe_book(&id, depth, events.clone()).await {
                    tracing::error!(instrument = %id, "book feed stopped with error: {error:?}");
                }

                if events.is_closed() {
                    break;
                }

                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });

        tracing::info!(instrument = %instrument_id, depth, "subscribed to book deltas");
        self.tasks.insert(instrument_id.clone(), task);

        Ok(())
    }

    fn unsubscribe_book_deltas(&mut self, instrument_id: &InstrumentId) {
        if let Some(task) = self.tasks.remove(instrument_id) {
            task.abort();
            tracing::info!(instrument = %instrument_id, "unsubscribed from book deltas");
        }
    }
}

impl Drop for FeedSubscriptions {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::market::book_delta::BookDeltas;

    struct OneShotSource {
        connects: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for OneShotSource {
        async fn subscribe_book(
            &self,
            instrument_id: &InstrumentId,
            _depth: u32,
            channel: mpsc::Sender<StrategyEvent>,
        ) -> Result<()> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let deltas = BookDeltas {
                instrument_id: instrument_id.clone(),
                deltas: Vec::new(),
                timestamp_ms: 1,
            };
            let _ = channel.send(StrategyEvent::BookDeltas(deltas)).await;
            bail!("connection dropped")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnects_after_feed_error() {
        let source = Arc::new(OneShotSource {
            connects: AtomicUsize::new(0),
        });
        let (tx, mut rx) = mpsc::channel(8);
        let mut feeds = FeedSubscriptions::new(source.clone(), tx);
        let id = InstrumentId::new("XBT/USD", "KRAKEN");

        feeds.subscribe_book_deltas(&id, 25).unwrap();

        assert!(matches!(rx.recv().await, Some(StrategyEvent::BookDeltas(_))));
        assert!(matches!(rx.recv().await, Some(StrategyEvent::BookDeltas(_))));
        assert!(source.connects.load(Ordering::SeqCst) >= 2);

        feeds.unsubscribe_book_deltas(&id);
        assert!(feeds.subscribe_book_deltas(&id, 25).is_ok());
        assert!(feeds.subscribe_book_deltas(&id, 25).is_err());
    }
}
