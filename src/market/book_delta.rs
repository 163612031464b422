use rust_decimal::Decimal;

use crate::types::{instrument::InstrumentId, price::Price};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

/// One change to a price level. A zero size is treated as a delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BookDelta {
    /// Drops every level on both sides; precedes a snapshot.
    Clear,
    Set {
        side: BookSide,
        price: Price,
        size: Decimal,
    },
    Delete {
        side: BookSide,
        price: Price,
    },
}

impl BookDelta {
    pub fn level(side: BookSide, price: Price, size: Decimal) -> Self {
        if size.is_zero() {
            BookDelta::Delete { side, price }
        } else {
            BookDelta::Set { side, price, size }
        }
    }
}

/// A batch of deltas for one instrument, applied atomically.
#[derive(Debug, Clone)]
pub struct BookDeltas {
    pub instrument_id: InstrumentId,
    pub deltas: Vec<BookDelta>,
    pub timestamp_ms: u64,
}

impl BookDeltas {
    pub fn is_snapshot(&self) -> bool {
        matches!(self.deltas.first(), Some(BookDelta::Clear))
    }
}
