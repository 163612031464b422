pub mod book_delta;
pub mod market_source;
pub mod mid_price_tracker;
pub mod order_book;
pub mod subscriptions;

use anyhow::Result;

use crate::types::instrument::InstrumentId;

/// Subscription control the strategy uses at start and stop.
pub trait MarketDataClient: Send {
    fn subscribe_book_deltas(&mut self, instrument_id: &InstrumentId, depth: u32) -> Result<()>;
    fn unsubscribe_book_deltas(&mut self, instrument_id: &InstrumentId);
}
