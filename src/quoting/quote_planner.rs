use rust_decimal::Decimal;

use crate::config::strategy_config::StrategyConfig;
use crate::quoting::skew::skew_fraction;
use crate::types::quote_plan::QuotePlan;

/// Computes the bid and ask for one cycle.
///
/// Each side starts at half of `spread_pct`. When long, the ask half-spread is
/// tightened by the skew fraction; when short, the bid. Spreads are floored at
/// zero, so for a positive mid `bid_price <= mid <= ask_price` always holds.
pub fn plan(mid: Decimal, position: Decimal, config: &StrategyConfig) -> QuotePlan {
    let half_spread = config.spread_pct() / Decimal::TWO;
    let skew = skew_fraction(position, config.inventory_threshold());
    let tightened = half_spread - half_spread * skew;

    let (bid_spread, ask_spread) = if position > Decimal::ZERO {
        (half_spread, tightened)
    } else if position < Decimal::ZERO {
        (tightened, half_spread)
    } else {
        (half_spread, half_spread)
    };

    let bid_spread = bid_spread.max(Decimal::ZERO);
    let ask_spread = ask_spread.max(Decimal::ZERO);

    QuotePlan {
        bid_price: mid * (Decimal::ONE - bid_spread),
        ask_price: mid * (Decimal::ONE + ask_spread),
        bid_spread_fraction: bid_spread,
        ask_spread_fraction: ask_spread,
        skew_fraction: skew,
    }
}
