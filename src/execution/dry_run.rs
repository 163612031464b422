use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::info;

use crate::{
    execution::{
        DynamicPositionSource, ExecutionVenue, ReportSender,
        order_action::{Order, OrderAction, OrderType},
        order_report::OrderReport,
    },
    position::WatchedPosition,
    types::instrument::InstrumentId,
};

/// Paper venue: limit orders rest until cancelled, with a small chance of an
/// immediate fill or rejection. Market orders always fill, clamped to the open
/// position when reduce-only.
#[derive(Debug)]
pub struct DryRunExecutionVenue {
    on_report: ReportSender,
    position: watch::Sender<Option<Decimal>>,
    resting: Mutex<HashMap<String, Order>>,
    reject_probability: f64,
    fill_probability: f64,
}

impl DryRunExecutionVenue {
    pub fn new(on_report: ReportSender) -> Self {
        Self::with_probabilities(on_report, 0.05, 0.10)
    }

    pub fn with_probabilities(
        on_report: ReportSender,
        reject_probability: f64,
        fill_probability: f64,
    ) -> Self {
        let (position, _) = watch::channel(None);

        Self {
            on_report,
            position,
            resting: Mutex::new(HashMap::new()),
            reject_probability: reject_probability.clamp(0.0, 1.0),
            fill_probability: fill_probability.clamp(0.0, 1.0),
        }
    }

    fn emit(&self, report: OrderReport) {
        info!(?report);
        let _ = self.on_report.send(report);
    }

    fn apply_fill(&self, order: &Order) {
        let signed = order.side.sign() * order.quantity;
        self.position
            .send_modify(|position| *position = Some(position.unwrap_or_default() + signed));

        self.emit(OrderReport::Filled {
            order_id: order.client_order_id.clone(),
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            price: order.limit_price(),
            quantity: order.quantity,
        });
    }

    fn cancel_all(&self, instrument_id: &InstrumentId) -> Result<()> {
        let cancelled: Vec<Order> = {
            let mut resting = self
                .resting
                .lock()
                .map_err(|_| anyhow!("dry run order book lock poisoned"))?;

            let ids: Vec<String> = resting
                .iter()
                .filter(|(_, order)| order.instrument_id == *instrument_id)
                .map(|(id, _)| id.clone())
                .collect();

            ids.iter().filter_map(|id| resting.remove(id)).collect()
        };

        for order in &cancelled {
            self.emit(OrderReport::Cancelled {
                order_id: order.client_order_id.clone(),
                instrument_id: order.instrument_id.clone(),
                side: order.side,
            });
        }

        self.emit(OrderReport::CancelledAll {
            instrument_id: instrument_id.clone(),
            count: cancelled.len() as i64,
        });

        Ok(())
    }

    /// Clamps a reduce-only order to the open position. `None` when it cannot reduce anything.
    fn reducing_quantity(&self, order: &Order) -> Option<Decimal> {
        let position = (*self.position.borrow()).unwrap_or_default();

        if position.is_zero() || position.is_sign_positive() == (order.side.sign() > Decimal::ZERO) {
            return None;
        }

        Some(order.quantity.min(position.abs()))
    }

    fn place(&self, order: &Order) -> Result<()> {
        if order.reduce_only {
            let Some(quantity) = self.reducing_quantity(order) else {
                self.emit(OrderReport::Rejected {
                    order_id: order.client_order_id.clone(),
                    instrument_id: order.instrument_id.clone(),
                    side: order.side,
                    reason: "reduce-only order would increase position".to_string(),
                });
                return Ok(());
            };

            if order.order_type == OrderType::Market {
                self.apply_fill(&Order {
                    quantity,
                    ..order.clone()
                });
                return Ok(());
            }
        }

        if order.order_type == OrderType::Market {
            self.apply_fill(order);
            return Ok(());
        }

        let (reject, fill) = {
            let mut rng = rand::rng();
            (
                rng.random_bool(self.reject_probability),
                rng.random_bool(self.fill_probability),
            )
        };

        if reject {
            self.emit(OrderReport::Rejected {
                order_id: order.client_order_id.clone(),
                instrument_id: order.instrument_id.clone(),
                side: order.side,
                reason: "simulated rejection".to_string(),
            });
            return Ok(());
        }

        self.emit(OrderReport::Accepted {
            order_id: order.client_order_id.clone(),
            instrument_id: order.instrument_id.clone(),
            side: order.side,
            price: order.limit_price(),
            quantity: order.quantity,
        });

        if fill {
            self.apply_fill(order);
            return Ok(());
        }

        self.resting
            .lock()
            .map_err(|_| anyhow!("dry run order book lock poisoned"))?
            .insert(order.client_order_id.clone(), order.clone());

        Ok(())
    }

    pub fn resting_orders(&self) -> usize {
        self.resting.lock().map(|resting| resting.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ExecutionVenue for DryRunExecutionVenue {
    async fn spawn_positions(&self, instrument_id: &InstrumentId) -> Result<DynamicPositionSource> {
        Ok(Box::new(WatchedPosition::new(
            instrument_id.clone(),
            self.position.subscribe(),
        )))
    }

    async fn execute(&self, actions: &[OrderAction]) -> Result<()> {
        for action in actions {
            match action {
                OrderAction::CancelAll { instrument_id } => {
                    info!(instrument = %instrument_id, "cancelling all orders");
                    self.cancel_all(instrument_id)?;
                }
                OrderAction::Place(order) => self.place(order)?,
            }
        }

        info!(resting = self.resting_orders(), "dry run book");

        Ok(())
    }
}
