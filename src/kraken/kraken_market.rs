use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info};

use crate::events::StrategyEvent;
use crate::market::book_delta::{BookDelta, BookDeltas, BookSide};
use crate::market::market_source::MarketDataSource;
use crate::types::instrument::InstrumentId;
use crate::types::price::Price;

/// Public websocket `book` channel feed.
#[derive(Debug)]
pub struct KrakenMarket {
    websocket_url: String,
}

impl Default for KrakenMarket {
    fn default() -> Self {
        Self::new("wss://ws.kraken.com")
    }
}

impl KrakenMarket {
    pub fn new(websocket_url: impl Into<String>) -> Self {
        Self {
            websocket_url: websocket_url.into(),
        }
    }

    fn subscription_for_book(instrument_id: &InstrumentId, depth: u32) -> Value {
        json!({
            "event": "subscribe",
            "pair": [instrument_id.symbol()],
            "subscription": { "name": "book", "depth": depth }
        })
    }

    fn parse_book_deltas_from_text(instrument_id: &InstrumentId, text: &str) -> Option<BookDeltas> {
        let parsed: Value = serde_json::from_str(text).ok()?;

        /* Ignore object messages like subscriptionStatus, systemStatus, heartbeat */
        if parsed.is_object() {
            return None;
        }

        /* [channel_id, payload.., channel_name, pair]; updates touching both sides carry two payloads */
        let array = parsed.as_array()?;
        if array.len() < 4 {
            return None;
        }

        let channel_name = array[array.len() - 2].as_str()?;
        if !channel_name.starts_with("book") {
            error!("Kraken websocket received unknown channel: {channel_name}");
            return None;
        }

        let mut deltas = Vec::new();
        let mut timestamp_ms = 0;

        for payload in &array[1..array.len() - 2] {
            let payload = payload.as_object()?;

            if payload.contains_key("as") || payload.contains_key("bs") {
                deltas.push(BookDelta::Clear);
                Self::parse_levels(payload, "bs", BookSide::Bid, &mut deltas, &mut timestamp_ms)?;
                Self::parse_levels(payload, "as", BookSide::Ask, &mut deltas, &mut timestamp_ms)?;
            } else {
                Self::parse_levels(payload, "b", BookSide::Bid, &mut deltas, &mut timestamp_ms)?;
                Self::parse_levels(payload, "a", BookSide::Ask, &mut deltas, &mut timestamp_ms)?;
            }
        }

        if deltas.is_empty() {
            return None;
        }

        Some(BookDeltas {
            instrument_id: instrument_id.clone(),
            deltas,
            timestamp_ms,
        })
    }

    /// Levels are `[price, volume, timestamp(, "r")]`; zero volume removes the level.
    fn parse_levels(
        payload: &Map<String, Value>,
        key: &str,
        side: BookSide,
        deltas: &mut Vec<BookDelta>,
        timestamp_ms: &mut u64,
    ) -> Option<()> {
        let Some(levels) = payload.get(key) else {
            return Some(());
        };

        for level in levels.as_array()? {
            let fields = level.as_array()?;

            let price: Decimal = fields.first()?.as_str()?.parse().ok()?;
            let size: Decimal = fields.get(1)?.as_str()?.parse().ok()?;

            if let Some(ms) = fields
                .get(2)
                .and_then(Value::as_str)
                .and_then(|seconds| seconds.parse::<Decimal>().ok())
                .and_then(|seconds| (seconds * Decimal::ONE_THOUSAND).to_u64())
            {
                *timestamp_ms = (*timestamp_ms).max(ms);
            }

            deltas.push(BookDelta::level(side, Price::try_new(price)?, size));
        }

        Some(())
    }
}

#[async_trait]
impl MarketDataSource for KrakenMarket {
    async fn subscribe_book(
        &self,
        instrument_id: &InstrumentId,
        depth: u32,
        channel: Sender<StrategyEvent>,
    ) -> Result<()> {
        let (stream, _http_response) = connect_async(&self.websocket_url).await?;
        let (mut writer, mut reader) = stream.split();

        let subscription = Self::subscription_for_book(instrument_id, depth);
        writer.send(Message::Text(subscription.to_string())).await?;

        info!(instrument = %instrument_id, depth, "Kraken book websocket connected");

        while let Some(message) = reader.next().await {
            let message_text: Option<String> = match message? {
                Message::Text(text) => Some(text),
                Message::Binary(binary) => String::from_utf8(binary).ok(),
                Message::Ping(_) | Message::Pong(_) => None,
                Message::Close(frame) => {
                    error!("Kraken websocket closed: {:?}", frame);
                    break;
                }
                _ => None,
            };

            let Some(text) = message_text else {
                continue;
            };

            match Self::parse_book_deltas_from_text(instrument_id, &text) {
                Some(deltas) => {
                    if channel.send(StrategyEvent::BookDeltas(deltas)).await.is_err() {
                        error!("Failed to send book deltas");

                        break;
                    }
                }
                None => debug!(%text, "ignored websocket message"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn instrument_id() -> InstrumentId {
        InstrumentId::new("XBT/USD", "KRAKEN")
    }

    fn parse(text: &str) -> Option<BookDeltas> {
        KrakenMarket::parse_book_deltas_from_text(&instrument_id(), text)
    }

    #[test]
    fn test_subscription_message() {
        let message = KrakenMarket::subscription_for_book(&instrument_id(), 25);

        assert_eq!(message["event"], "subscribe");
        assert_eq!(message["pair"][0], "XBT/USD");
        assert_eq!(message["subscription"]["name"], "book");
        assert_eq!(message["subscription"]["depth"], 25);
    }

    #[test]
    fn test_parse_snapshot() {
        let text = r#"[0,{"as":[["5541.30000","2.50700000","1534614248.123678"],["5541.80000","0.33000000","1534614098.345543"]],"bs":[["5541.20000","1.52900000","1534614248.765567"]]},"book-25","XBT/USD"]"#;
        let book = parse(text).unwrap();

        assert!(book.is_snapshot());
        assert_eq!(book.deltas.len(), 4);
        assert_eq!(
            book.deltas[1],
            BookDelta::level(BookSide::Bid, Price::new(dec!(5541.2)), dec!(1.529))
        );
        assert_eq!(
            book.deltas[2],
            BookDelta::level(BookSide::Ask, Price::new(dec!(5541.3)), dec!(2.507))
        );
        assert_eq!(book.timestamp_ms, 1534614248765);
    }

    #[test]
    fn test_parse_update_with_both_sides() {
        let text = r#"[1234,{"a":[["5541.30000","0.00000000","1534614335.345903"]]},{"b":[["5541.30000","0.00000000","1534614335.345903"],["5540.00000","1.00000000","1534614335.345903","r"]],"c":"974942666"},"book-10","XBT/USD"]"#;
        let book = parse(text).unwrap();

        assert!(!book.is_snapshot());
        assert_eq!(
            book.deltas,
            vec![
                BookDelta::Delete {
                    side: BookSide::Ask,
                    price: Price::new(dec!(5541.3)),
                },
                BookDelta::Delete {
                    side: BookSide::Bid,
                    price: Price::new(dec!(5541.3)),
                },
                BookDelta::level(BookSide::Bid, Price::new(dec!(5540)), dec!(1)),
            ]
        );
    }

    #[test]
    fn test_ignores_status_and_other_channels() {
        assert!(parse(r#"{"event":"heartbeat"}"#).is_none());
        assert!(parse(r#"{"event":"subscriptionStatus","status":"subscribed"}"#).is_none());
        assert!(parse(r#"[0,["5698.4","5700.0","1542057299.545897"],"spread","XBT/USD"]"#).is_none());
        assert!(parse("not json").is_none());
    }

    #[test]
    fn test_rejects_malformed_levels() {
        assert!(parse(r#"[0,{"a":[["abc","1.0","1534614335.3"]]},"book-25","XBT/USD"]"#).is_none());
        assert!(parse(r#"[0,{"a":[["-1.0","1.0","1534614335.3"]]},"book-25","XBT/USD"]"#).is_none());
    }
}
