use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::events::StrategyEvent;
use crate::strategy::Strategy;

/// Starts the strategy and feeds it events one at a time until `shutdown`
/// resolves or the event channel closes, then stops it.
pub async fn run<S, F>(
    strategy: &mut S,
    events: &mut mpsc::Receiver<StrategyEvent>,
    shutdown: F,
) -> Result<()>
where
    S: Strategy,
    F: Future<Output = ()>,
{
    strategy.start()?;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }

            event = events.recv() => match event {
                Some(event) => strategy.on_event(&event),
                None => {
                    warn!("event channel closed");
                    break;
                }
            }
        }
    }

    strategy.stop();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio::sync::watch;

    use crate::clock::tokio_timers::TokioTimers;
    use crate::config::strategy_config::StrategyConfig;
    use crate::execution::order_action::{OrderAction, Side};
    use crate::execution::order_gateway::OrderGateway;
    use crate::instruments::instrument_cache::InstrumentCache;
    use crate::market::MarketDataClient;
    use crate::market::book_delta::{BookDelta, BookDeltas, BookSide};
    use crate::position::WatchedPosition;
    use crate::strategy::quote_cycle_controller::QuoteCycleController;
    use crate::strategy::strategy_context::StrategyContext;
    use crate::strategy::strategy_state::StrategyState;
    use crate::types::instrument::InstrumentId;
    use crate::types::price::Price;

    /// Replays a fixed snapshot into the event channel on subscribe.
    struct SnapshotFeed {
        events: mpsc::Sender<StrategyEvent>,
        snapshot: Option<(Decimal, Decimal)>,
    }

    impl MarketDataClient for SnapshotFeed {
        fn subscribe_book_deltas(&mut self, instrument_id: &InstrumentId, _depth: u32) -> Result<()> {
            if let Some((bid, ask)) = self.snapshot {
                self.events.try_send(StrategyEvent::BookDeltas(BookDeltas {
                    instrument_id: instrument_id.clone(),
                    deltas: vec![
                        BookDelta::Clear,
                        BookDelta::level(BookSide::Bid, Price::new(bid), dec!(2)),
                        BookDelta::level(BookSide::Ask, Price::new(ask), dec!(3)),
                    ],
                    timestamp_ms: 0,
                }))?;
            }
            Ok(())
        }

        fn unsubscribe_book_deltas(&mut self, _instrument_id: &InstrumentId) {}
    }

    struct Run {
        actions: Vec<OrderAction>,
        state: StrategyState,
    }

    async fn run_for(snapshot: Option<(Decimal, Decimal)>, elapsed: Duration) -> Run {
        let instrument_id = InstrumentId::new("XBT/USD", "KRAKEN");
        let instruments = InstrumentCache::from_yaml(
            r#"
instruments:
  "XBT/USD.KRAKEN":
    price_precision: 1
    quantity_precision: 8
"#,
        )
        .unwrap();
        let config =
            StrategyConfig::new(instrument_id.clone(), dec!(0.01), dec!(0.01), dec!(5), 5, true, 25)
                .unwrap();

        let (events_tx, mut events_rx) = mpsc::channel(64);
        let (orders, mut actions_rx) = OrderGateway::channel();
        let (_position_tx, position_rx) = watch::channel(None);

        let ctx = StrategyContext {
            instruments: Box::new(instruments),
            market_data: Box::new(SnapshotFeed {
                events: events_tx.clone(),
                snapshot,
            }),
            positions: Box::new(WatchedPosition::new(instrument_id, position_rx)),
            timers: Box::new(TokioTimers::new(events_tx)),
            orders,
        };

        let mut controller = QuoteCycleController::new(config, ctx);
        run(&mut controller, &mut events_rx, tokio::time::sleep(elapsed))
            .await
            .unwrap();

        let mut actions = Vec::new();
        while let Ok(action) = actions_rx.try_recv() {
            actions.push(action);
        }

        Run {
            actions,
            state: controller.state(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quotes_once_per_tick() {
        let run = run_for(Some((dec!(99), dec!(101))), Duration::from_secs(12)).await;

        // two cycles at 5s and 10s, then the cancel on stop
        assert_eq!(run.actions.len(), 7);
        for cycle in run.actions[..6].chunks(3) {
            assert!(matches!(cycle[0], OrderAction::CancelAll { .. }));
            assert!(matches!(
                &cycle[1],
                OrderAction::Place(order)
                    if order.side == Side::Buy
                        && order.limit_price() == Some(Price::new(dec!(99.5)))
            ));
            assert!(matches!(
                &cycle[2],
                OrderAction::Place(order)
                    if order.side == Side::Sell
                        && order.limit_price() == Some(Price::new(dec!(100.5)))
            ));
        }
        assert!(matches!(run.actions[6], OrderAction::CancelAll { .. }));
        assert_eq!(run.state, StrategyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_without_book_do_nothing() {
        let run = run_for(None, Duration::from_secs(26)).await;

        assert_eq!(run.actions.len(), 1);
        assert!(matches!(run.actions[0], OrderAction::CancelAll { .. }));
        assert_eq!(run.state, StrategyState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_interval() {
        let run = run_for(Some((dec!(99), dec!(101))), Duration::from_secs(4)).await;

        assert_eq!(run.actions.len(), 1);
    }
}
