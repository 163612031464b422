use std::fmt;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{instrument::InstrumentId, price::Price};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Signed multiplier applied to fill quantities.
    pub fn sign(self) -> Decimal {
        match self {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OrderType {
    Limit { price: Price },
    Market,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub client_order_id: String,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub reduce_only: bool,
}

impl Order {
    pub fn limit(instrument_id: &InstrumentId, side: Side, price: Price, quantity: Decimal) -> Self {
        Self {
            client_order_id: new_client_order_id(),
            instrument_id: instrument_id.clone(),
            side,
            order_type: OrderType::Limit { price },
            quantity,
            reduce_only: false,
        }
    }

    /// Market order that may only reduce an existing position.
    pub fn closing(instrument_id: &InstrumentId, side: Side, quantity: Decimal) -> Self {
        Self {
            client_order_id: new_client_order_id(),
            instrument_id: instrument_id.clone(),
            side,
            order_type: OrderType::Market,
            quantity,
            reduce_only: true,
        }
    }

    pub fn limit_price(&self) -> Option<Price> {
        match self.order_type {
            OrderType::Limit { price } => Some(price),
            OrderType::Market => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    CancelAll { instrument_id: InstrumentId },
    Place(Order),
}

fn new_client_order_id() -> String {
    Uuid::new_v4().to_string()
}
