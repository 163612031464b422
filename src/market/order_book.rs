use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::market::book_delta::{BookDelta, BookSide};
use crate::types::price::Price;

/// Price-level ladder kept only deep enough to expose the best bid and ask.
#[derive(Debug, Clone)]
pub struct OrderBook {
    depth: usize,
    bids: BTreeMap<Price, Decimal>,
    asks: BTreeMap<Price, Decimal>,
}

impl OrderBook {
    pub fn new(depth: usize) -> Self {
        Self {
            depth: depth.max(1),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn apply_deltas(&mut self, deltas: &[BookDelta]) {
        for delta in deltas {
            self.apply(delta);
        }

        self.truncate();
    }

    fn apply(&mut self, delta: &BookDelta) {
        match *delta {
            BookDelta::Clear => {
                self.bids.clear();
                self.asks.clear();
            }
            BookDelta::Set { side, price, size } if size > Decimal::ZERO => {
                self.side_mut(side).insert(price, size);
            }
            BookDelta::Set { side, price, .. } | BookDelta::Delete { side, price } => {
                self.side_mut(side).remove(&price);
            }
        }
    }

    /* levels past the subscribed depth are no longer maintained by the venue */
    fn truncate(&mut self) {
        while self.bids.len() > self.depth {
            self.bids.pop_first();
        }
        while self.asks.len() > self.depth {
            self.asks.pop_last();
        }
    }

    fn side_mut(&mut self, side: BookSide) -> &mut BTreeMap<Price, Decimal> {
        match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        }
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn px(value: Decimal) -> Price {
        Price::new(value)
    }

    #[test]
    fn test_best_levels() {
        let mut book = OrderBook::new(10);
        book.apply_deltas(&[
            BookDelta::level(BookSide::Bid, px(dec!(98)), dec!(1)),
            BookDelta::level(BookSide::Bid, px(dec!(99)), dec!(2)),
            BookDelta::level(BookSide::Ask, px(dec!(102)), dec!(1)),
            BookDelta::level(BookSide::Ask, px(dec!(101)), dec!(3)),
        ]);

        assert_eq!(book.best_bid(), Some(px(dec!(99))));
        assert_eq!(book.best_ask(), Some(px(dec!(101))));
    }

    #[test]
    fn test_delete_exposes_next_level() {
        let mut book = OrderBook::new(10);
        book.apply_deltas(&[
            BookDelta::level(BookSide::Bid, px(dec!(98)), dec!(1)),
            BookDelta::level(BookSide::Bid, px(dec!(99)), dec!(2)),
        ]);
        book.apply_deltas(&[BookDelta::level(BookSide::Bid, px(dec!(99)), dec!(0))]);

        assert_eq!(book.best_bid(), Some(px(dec!(98))));
        assert_eq!(book.bid_levels(), 1);
    }

    #[test]
    fn test_clear_then_snapshot() {
        let mut book = OrderBook::new(10);
        book.apply_deltas(&[BookDelta::level(BookSide::Ask, px(dec!(120)), dec!(1))]);
        book.apply_deltas(&[
            BookDelta::Clear,
            BookDelta::level(BookSide::Ask, px(dec!(101)), dec!(1)),
        ]);

        assert_eq!(book.best_ask(), Some(px(dec!(101))));
        assert_eq!(book.ask_levels(), 1);
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn test_truncates_worst_levels() {
        let mut book = OrderBook::new(2);
        book.apply_deltas(&[
            BookDelta::level(BookSide::Bid, px(dec!(97)), dec!(1)),
            BookDelta::level(BookSide::Bid, px(dec!(98)), dec!(1)),
            BookDelta::level(BookSide::Bid, px(dec!(99)), dec!(1)),
            BookDelta::level(BookSide::Ask, px(dec!(101)), dec!(1)),
            BookDelta::level(BookSide::Ask, px(dec!(102)), dec!(1)),
            BookDelta::level(BookSide::Ask, px(dec!(103)), dec!(1)),
        ]);

        assert_eq!(book.bid_levels(), 2);
        assert_eq!(book.ask_levels(), 2);
        assert_eq!(book.best_bid(), Some(px(dec!(99))));
        assert_eq!(book.best_ask(), Some(px(dec!(101))));
    }
}
