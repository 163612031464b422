use rust_decimal::Decimal;

use crate::execution::order_action::Side;
use crate::types::instrument::InstrumentId;
use crate::types::price::Price;

/// Venue acknowledgements. Published for logging; the quoting logic never waits on them.
#[derive(Debug, Clone)]
pub enum OrderReport {
    Accepted {
        order_id: String,
        instrument_id: InstrumentId,
        side: Side,
        price: Option<Price>,
        quantity: Decimal,
    },

    Rejected {
        order_id: String,
        instrument_id: InstrumentId,
        side: Side,
        reason: String,
    },

    Filled {
        order_id: String,
        instrument_id: InstrumentId,
        side: Side,
        price: Option<Price>,
        quantity: Decimal,
    },

    Cancelled {
        order_id: String,
        instrument_id: InstrumentId,
        side: Side,
    },

    CancelledAll {
        instrument_id: InstrumentId,
        count: i64,
    },

    CancelFailed {
        instrument_id: InstrumentId,
        reason: String,
    },
}
