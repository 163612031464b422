use std::fmt;

use rust_decimal::Decimal;

use crate::market::book_delta::BookDeltas;
use crate::market::order_book::OrderBook;
use crate::types::price::Price;

/// Tracks top of book and the mid derived from it.
///
/// Once a mid has been observed it is kept even if a later update leaves the
/// book one-sided; quoting continues against the last two-sided mid.
#[derive(Clone)]
pub struct MidPriceTracker {
    book: OrderBook,
    best_bid: Option<Price>,
    best_ask: Option<Price>,
    mid: Option<Decimal>,
}

impl MidPriceTracker {
    pub fn new(depth: usize) -> Self {
        Self {
            book: OrderBook::new(depth),
            best_bid: None,
            best_ask: None,
            mid: None,
        }
    }

    pub fn apply_update(&mut self, update: &BookDeltas) {
        self.book.apply_deltas(&update.deltas);

        self.best_bid = self.book.best_bid();
        self.best_ask = self.book.best_ask();

        tracing::debug!(
            bid = ?self.best_bid,
            ask = ?self.best_ask,
            snapshot = update.is_snapshot(),
            venue_ts_ms = update.timestamp_ms,
            bid_levels = self.book.bid_levels(),
            ask_levels = self.book.ask_levels(),
            "book updated"
        );

        if let (Some(bid), Some(ask)) = (self.best_bid, self.best_ask) {
            self.mid = Some((bid.as_decimal() + ask.as_decimal()) / Decimal::TWO);
        }
    }

    pub fn current_mid(&self) -> Option<Decimal> {
        self.mid
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.best_bid
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.best_ask
    }

    /// True when a mid exists but the book currently lacks a bid or an ask.
    pub fn is_one_sided(&self) -> bool {
        self.mid.is_some() && (self.best_bid.is_none() || self.best_ask.is_none())
    }
}

impl fmt::Debug for MidPriceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MidPriceTracker")
            .field("best_bid", &self.best_bid)
            .field("mid", &self.mid)
            .field("best_ask", &self.best_ask)
            .field("is_one_sided", &self.is_one_sided())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::book_delta::{BookDelta, BookSide};
    use crate::types::instrument::InstrumentId;
    use rust_decimal_macros::dec;

    fn batch(deltas: Vec<BookDelta>) -> BookDeltas {
        BookDeltas {
            instrument_id: InstrumentId::new("XBT/USD", "KRAKEN"),
            deltas,
            timestamp_ms: 0,
        }
    }

    fn bid(price: Decimal, size: Decimal) -> BookDelta {
        BookDelta::level(BookSide::Bid, Price::new(price), size)
    }

    fn ask(price: Decimal, size: Decimal) -> BookDelta {
        BookDelta::level(BookSide::Ask, Price::new(price), size)
    }

    #[test]
    fn test_no_mid_before_any_update() {
        let tracker = MidPriceTracker::new(25);
        assert_eq!(tracker.current_mid(), None);
        assert!(!tracker.is_one_sided());
    }

    #[test]
    fn test_mid_from_best_bid_and_ask() {
        let mut tracker = MidPriceTracker::new(25);
        tracker.apply_update(&batch(vec![bid(dec!(99), dec!(1)), ask(dec!(101), dec!(1))]));

        assert_eq!(tracker.current_mid(), Some(dec!(100)));
        assert_eq!(tracker.best_bid(), Some(Price::new(dec!(99))));
        assert_eq!(tracker.best_ask(), Some(Price::new(dec!(101))));
    }

    #[test]
    fn test_one_sided_book_has_no_mid() {
        let mut tracker = MidPriceTracker::new(25);
        tracker.apply_update(&batch(vec![bid(dec!(99), dec!(1))]));

        assert_eq!(tracker.current_mid(), None);
        assert!(!tracker.is_one_sided());
    }

    #[test]
    fn test_removing_one_side_keeps_previous_mid() {
        let mut tracker = MidPriceTracker::new(25);
        tracker.apply_update(&batch(vec![bid(dec!(99), dec!(1)), ask(dec!(101), dec!(1))]));
        tracker.apply_update(&batch(vec![ask(dec!(101), dec!(0))]));

        assert_eq!(tracker.best_ask(), None);
        assert_eq!(tracker.current_mid(), Some(dec!(100)));
        assert!(tracker.is_one_sided());
    }

    #[test]
    fn test_mid_follows_top_of_book() {
        let mut tracker = MidPriceTracker::new(25);
        tracker.apply_update(&batch(vec![bid(dec!(99), dec!(1)), ask(dec!(101), dec!(1))]));
        tracker.apply_update(&batch(vec![bid(dec!(100), dec!(2))]));

        assert_eq!(tracker.current_mid(), Some(dec!(100.5)));
    }

    #[test]
    fn test_snapshot_replaces_book() {
        let mut tracker = MidPriceTracker::new(25);
        tracker.apply_update(&batch(vec![bid(dec!(99), dec!(1)), ask(dec!(101), dec!(1))]));
        tracker.apply_update(&batch(vec![
            BookDelta::Clear,
            bid(dec!(199), dec!(1)),
            ask(dec!(201), dec!(1)),
        ]));

        assert_eq!(tracker.current_mid(), Some(dec!(200)));
    }
}
