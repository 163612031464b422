use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

use crate::events::StrategyEvent;
use crate::types::instrument::InstrumentId;

/// A venue feed of order book deltas. `subscribe_book` runs until the
/// connection drops or the channel closes.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn subscribe_book(
        &self,
        instrument_id: &InstrumentId,
        depth: u32,
        channel: Sender<StrategyEvent>,
    ) -> Result<()>;
}
