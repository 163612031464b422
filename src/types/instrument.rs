use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::price::Price;

/// Venue-qualified instrument identifier, written `SYMBOL.VENUE` (e.g. `XBT/USD.KRAKEN`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InstrumentId {
    symbol: String,
    venue: String,
}

impl InstrumentId {
    pub fn new(symbol: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            venue: venue.into().to_uppercase(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }
}

impl FromStr for InstrumentId {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.rsplit_once('.') {
            Some((symbol, venue)) if !symbol.is_empty() && !venue.is_empty() => {
                Ok(Self::new(symbol, venue))
            }
            _ => Err(anyhow!("invalid instrument id \"{value}\", expected SYMBOL.VENUE")),
        }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}.{}", self.symbol, self.venue)
    }
}

impl fmt::Debug for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstrumentId({})", self)
    }
}

/// Instrument metadata needed at order submission time.
#[derive(Clone, PartialEq, Eq)]
pub struct Instrument {
    id: InstrumentId,
    price_precision: u32,
    quantity_precision: u32,
}

impl Instrument {
    pub fn new(id: InstrumentId, price_precision: u32, quantity_precision: u32) -> Self {
        Self {
            id,
            price_precision,
            quantity_precision,
        }
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn price_precision(&self) -> u32 {
        self.price_precision
    }

    pub fn quantity_precision(&self) -> u32 {
        self.quantity_precision
    }

    /// Bids round down so rounding never moves a buy towards the mid.
    pub fn make_bid_price(&self, value: Decimal) -> Price {
        let rounded =
            value.round_dp_with_strategy(self.price_precision, RoundingStrategy::ToNegativeInfinity);
        Price::new(rounded.max(Decimal::ZERO))
    }

    /// Asks round up so rounding never moves a sell towards the mid.
    pub fn make_ask_price(&self, value: Decimal) -> Price {
        Price::new(
            value.round_dp_with_strategy(self.price_precision, RoundingStrategy::ToPositiveInfinity),
        )
    }

    pub fn make_qty(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.quantity_precision, RoundingStrategy::ToZero)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.id)
    }
}

impl fmt::Debug for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Instrument({}, price_precision={}, quantity_precision={})",
            self.id, self.price_precision, self.quantity_precision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc_usd() -> Instrument {
        Instrument::new(InstrumentId::new("XBT/USD", "KRAKEN"), 1, 8)
    }

    #[test]
    fn test_parse_instrument_id() {
        let id: InstrumentId = "xbt/usd.kraken".parse().unwrap();
        assert_eq!(id.symbol(), "XBT/USD");
        assert_eq!(id.venue(), "KRAKEN");
        assert_eq!(id.to_string(), "XBT/USD.KRAKEN");
    }

    #[test]
    fn test_parse_splits_on_last_dot() {
        let id: InstrumentId = "BTCUSDT-LINEAR.BYBIT".parse().unwrap();
        assert_eq!(id.symbol(), "BTCUSDT-LINEAR");
        assert_eq!(id.venue(), "BYBIT");
    }

    #[test]
    fn test_parse_rejects_missing_venue() {
        assert!("XBTUSD".parse::<InstrumentId>().is_err());
        assert!("XBTUSD.".parse::<InstrumentId>().is_err());
        assert!(".KRAKEN".parse::<InstrumentId>().is_err());
    }

    #[test]
    fn test_bid_rounds_down_ask_rounds_up() {
        let instrument = btc_usd();
        assert_eq!(instrument.make_bid_price(dec!(99.58)).as_decimal(), dec!(99.5));
        assert_eq!(instrument.make_ask_price(dec!(100.32)).as_decimal(), dec!(100.4));
    }

    #[test]
    fn test_representable_prices_are_unchanged() {
        let instrument = btc_usd();
        assert_eq!(instrument.make_bid_price(dec!(99.5)).as_decimal(), dec!(99.5));
        assert_eq!(instrument.make_ask_price(dec!(100.0)).as_decimal(), dec!(100.0));
    }

    #[test]
    fn test_quantity_truncates() {
        let instrument = Instrument::new(InstrumentId::new("XBT/USD", "KRAKEN"), 1, 3);
        assert_eq!(instrument.make_qty(dec!(0.01999)), dec!(0.019));
        assert_eq!(instrument.make_qty(dec!(0.0009)), dec!(0));
    }
}
