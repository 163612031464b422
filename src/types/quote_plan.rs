use rust_decimal::Decimal;

/// Prices and spreads produced for a single quote cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePlan {
    pub bid_price: Decimal,
    pub ask_price: Decimal,
    pub bid_spread_fraction: Decimal,
    pub ask_spread_fraction: Decimal,
    pub skew_fraction: Decimal,
}
