use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::{
    execution::{
        DynamicPositionSource, ExecutionVenue, ReportSender,
        order_action::{Order, OrderAction, OrderType},
        order_report::OrderReport,
    },
    kraken::{
        kraken_client::KrakenClient, kraken_config::KrakenConfig,
        kraken_positions::KrakenPositions,
    },
    types::instrument::InstrumentId,
};

/// Limit orders accepted by the venue and not yet cancelled, keyed by instrument.
#[derive(Debug, Default)]
struct OpenOrders {
    by_instrument: Mutex<HashMap<InstrumentId, Vec<Order>>>,
}

impl OpenOrders {
    fn record(&self, order: &Order) -> Result<()> {
        if !matches!(order.order_type, OrderType::Limit { .. }) {
            return Ok(());
        }

        self.by_instrument
            .lock()
            .map_err(|_| anyhow!("kraken open orders lock poisoned"))?
            .entry(order.instrument_id.clone())
            .or_default()
            .push(order.clone());

        Ok(())
    }

    fn take(&self, instrument_id: &InstrumentId) -> Result<Vec<Order>> {
        let orders = self
            .by_instrument
            .lock()
            .map_err(|_| anyhow!("kraken open orders lock poisoned"))?
            .remove(instrument_id)
            .unwrap_or_default();

        Ok(orders)
    }
}

#[derive(Clone)]
pub struct KrakenExecutionVenue {
    config: KrakenConfig,
    client: KrakenClient,
    on_report: ReportSender,
    open_orders: Arc<OpenOrders>,
}

impl KrakenExecutionVenue {
    pub fn new(config: KrakenConfig, on_report: ReportSender) -> Self {
        Self {
            client: KrakenClient::new(config.clone()),
            config,
            on_report,
            open_orders: Arc::new(OpenOrders::default()),
        }
    }

    fn emit(&self, report: OrderReport) {
        let _ = self.on_report.send(report);
    }

    /// Cancels by client order id only the orders this venue placed for `instrument_id`.
    async fn cancel_all(&self, instrument_id: &InstrumentId) -> Result<()> {
        let orders = self.open_orders.take(instrument_id)?;
        tracing::info!(instrument = %instrument_id, orders = orders.len(), "cancelling instrument orders");

        let mut cancelled = 0;
        for order in orders {
            match self.client.cancel_order(&order.client_order_id).await {
                Ok(_) => {}
                // Already filled or expired on the venue.
                Err(e) if e.to_string().contains("Unknown order") => {
                    tracing::debug!(client_order_id = %order.client_order_id, "order already gone");
                }
                Err(e) => {
                    tracing::error!(client_order_id = %order.client_order_id, error = %e, "cancel order failed");
                    self.emit(OrderReport::CancelFailed {
                        instrument_id: instrument_id.clone(),
                        reason: e.to_string(),
                    });
                    self.open_orders.record(&order)?;
                    continue;
                }
            }

            cancelled += 1;
            self.emit(OrderReport::Cancelled {
                order_id: order.client_order_id.clone(),
                instrument_id: order.instrument_id.clone(),
                side: order.side,
            });
        }

        self.emit(OrderReport::CancelledAll {
            instrument_id: instrument_id.clone(),
            count: cancelled,
        });

        Ok(())
    }

    async fn place(&self, order: &Order) -> Result<()> {
        let report = match self.client.add_order(order).await {
            Ok(_) => {
                self.open_orders.record(order)?;
                OrderReport::Accepted {
                    order_id: order.client_order_id.clone(),
                    instrument_id: order.instrument_id.clone(),
                    side: order.side,
                    price: order.limit_price(),
                    quantity: order.quantity,
                }
            }
            Err(error) => OrderReport::Rejected {
                order_id: order.client_order_id.clone(),
                instrument_id: order.instrument_id.clone(),
                side: order.side,
                reason: error.to_string(),
            },
        };

        self.emit(report);

        Ok(())
    }
}

#[async_trait]
impl ExecutionVenue for KrakenExecutionVenue {
    async fn spawn_positions(&self, instrument_id: &InstrumentId) -> Result<DynamicPositionSource> {
        let positions = KrakenPositions::spawn(&self.config, instrument_id).await?;

        Ok(Box::new(positions))
    }

    async fn execute(&self, actions: &[OrderAction]) -> Result<()> {
        for action in actions {
            match action {
                OrderAction::CancelAll { instrument_id } => self.cancel_all(instrument_id).await?,
                OrderAction::Place(order) => self.place(order).await?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::execution::order_action::Side;
    use crate::types::price::Price;

    fn ids(orders: &[Order]) -> Vec<String> {
        orders.iter().map(|o| o.client_order_id.clone()).collect()
    }

    #[test]
    fn test_cancel_targets_only_the_instrument() {
        let open = OpenOrders::default();
        let xbt = InstrumentId::new("XBT/USD", "KRAKEN");
        let eth = InstrumentId::new("ETH/USD", "KRAKEN");

        let xbt_orders = vec![
            Order::limit(&xbt, Side::Buy, Price::new(dec!(37000)), dec!(0.01)),
            Order::limit(&xbt, Side::Sell, Price::new(dec!(37100)), dec!(0.01)),
        ];
        let eth_orders = vec![
            Order::limit(&eth, Side::Buy, Price::new(dec!(2000)), dec!(0.1)),
            Order::limit(&eth, Side::Sell, Price::new(dec!(2010)), dec!(0.1)),
        ];
        for order in xbt_orders.iter().chain(&eth_orders) {
            open.record(order).unwrap();
        }

        let taken = open.take(&eth).unwrap();
        assert_eq!(ids(&taken), ids(&eth_orders));
        assert!(taken.iter().all(|o| o.instrument_id == eth));

        assert!(open.take(&eth).unwrap().is_empty());
        assert_eq!(ids(&open.take(&xbt).unwrap()), ids(&xbt_orders));
    }

    #[test]
    fn test_market_orders_are_not_tracked() {
        let open = OpenOrders::default();
        let xbt = InstrumentId::new("XBT/USD", "KRAKEN");

        open.record(&Order::closing(&xbt, Side::Sell, dec!(0.5))).unwrap();

        assert!(open.take(&xbt).unwrap().is_empty());
    }
}
