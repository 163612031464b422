use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::types::instrument::InstrumentId;

pub trait PositionSource: Send + Sync {
    /// Signed position (positive long, negative short). `None` when flat or unknown.
    fn position(&self, instrument_id: &InstrumentId) -> Option<Decimal>;
}

/// Position published by a venue task through a watch channel.
#[derive(Debug, Clone)]
pub struct WatchedPosition {
    instrument_id: InstrumentId,
    receiver: watch::Receiver<Option<Decimal>>,
}

impl WatchedPosition {
    pub fn new(instrument_id: InstrumentId, receiver: watch::Receiver<Option<Decimal>>) -> Self {
        Self {
            instrument_id,
            receiver,
        }
    }
}

impl PositionSource for WatchedPosition {
    fn position(&self, instrument_id: &InstrumentId) -> Option<Decimal> {
        if *instrument_id != self.instrument_id {
            return None;
        }

        (*self.receiver.borrow()).filter(|quantity| !quantity.is_zero())
    }
}
