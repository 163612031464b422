pub mod dry_run;
pub mod order_action;
pub mod order_gateway;
pub mod order_report;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::execution::order_action::OrderAction;
use crate::execution::order_report::OrderReport;
use crate::position::PositionSource;
use crate::types::instrument::InstrumentId;

pub type ReportSender = broadcast::Sender<OrderReport>;

pub type DynamicPositionSource = Box<dyn PositionSource + Send + Sync>;

pub type DynamicVenue = Arc<dyn ExecutionVenue + Send + Sync>;

#[async_trait]
pub trait ExecutionVenue {
    /// Executes actions in order. Venue failures are reported, not returned.
    async fn execute(&self, actions: &[OrderAction]) -> Result<()>;
    async fn spawn_positions(&self, instrument_id: &InstrumentId) -> Result<DynamicPositionSource>;
}
