use tokio::sync::mpsc;

use crate::execution::DynamicVenue;
use crate::execution::order_action::{Order, OrderAction};
use crate::types::instrument::InstrumentId;

/// Non-blocking handle the strategy uses to request order actions.
///
/// Actions are queued in submission order and executed by [`run_execution`].
#[derive(Debug, Clone)]
pub struct OrderGateway {
    sender: mpsc::UnboundedSender<OrderAction>,
}

impl OrderGateway {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrderAction>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn submit(&self, order: Order) {
        self.send(OrderAction::Place(order));
    }

    pub fn cancel_all(&self, instrument_id: &InstrumentId) {
        self.send(OrderAction::CancelAll {
            instrument_id: instrument_id.clone(),
        });
    }

    fn send(&self, action: OrderAction) {
        if let Err(error) = self.sender.send(action) {
            tracing::error!(action = ?error.0, "execution channel closed; action dropped");
        }
    }
}

/// Drains queued actions into the venue until every gateway handle is dropped.
pub async fn run_execution(
    venue: DynamicVenue,
    mut actions: mpsc::UnboundedReceiver<OrderAction>,
) {
    let mut batch = Vec::new();

    while let Some(action) = actions.recv().await {
        batch.push(action);
        while let Ok(next) = actions.try_recv() {
            batch.push(next);
        }

        if let Err(error) = venue.execute(&batch).await {
            tracing::error!(count = batch.len(), "failed to execute actions: {error:?}");
        }

        batch.clear();
    }

    tracing::info!("execution queue drained");
}
