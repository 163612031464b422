use anyhow::{Result, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, error, info, warn};

use crate::clock::TimerEvent;
use crate::config::strategy_config::StrategyConfig;
use crate::execution::order_action::{Order, Side};
use crate::market::book_delta::BookDeltas;
use crate::market::mid_price_tracker::MidPriceTracker;
use crate::quoting::plan;
use crate::strategy::Strategy;
use crate::strategy::strategy_context::StrategyContext;
use crate::strategy::strategy_state::StrategyState;
use crate::types::instrument::Instrument;
use crate::types::quote_plan::QuotePlan;

pub const QUOTE_TIMER: &str = "quote_timer";

const PERCENT: Decimal = dec!(100);

/// Timer-driven market maker for one instrument.
///
/// Book deltas only update the mid. Every quote timer tick cancels the
/// instrument's resting orders and submits a fresh bid and ask around the
/// latest mid, skewed by the current position.
pub struct QuoteCycleController {
    config: StrategyConfig,
    ctx: StrategyContext,
    state: StrategyState,
    instrument: Option<Instrument>,
    mid_tracker: MidPriceTracker,
}

impl QuoteCycleController {
    pub fn new(config: StrategyConfig, ctx: StrategyContext) -> Self {
        let mid_tracker = MidPriceTracker::new(config.book_depth() as usize);

        Self {
            config,
            ctx,
            state: StrategyState::Idle,
            instrument: None,
            mid_tracker,
        }
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn current_mid(&self) -> Option<Decimal> {
        self.mid_tracker.current_mid()
    }

    /// Signed position, with "no position" read as flat. Queried fresh every call.
    fn position(&self) -> Decimal {
        match self.ctx.positions.position(self.config.instrument_id()) {
            Some(quantity) => quantity,
            None => {
                debug!("no position found");
                Decimal::ZERO
            }
        }
    }

    fn run_quote_cycle(&mut self, instrument: &Instrument, mid: Decimal) {
        info!(%mid, "refreshing quotes");

        if self.mid_tracker.is_one_sided() {
            debug!(
                bid = ?self.mid_tracker.best_bid(),
                ask = ?self.mid_tracker.best_ask(),
                "book is one-sided; quoting against last two-sided mid"
            );
        }

        self.ctx.orders.cancel_all(instrument.id());

        let position = self.position();
        let quotes = plan(mid, position, &self.config);
        log_plan(position, &quotes);

        let quantity = instrument.make_qty(self.config.trade_size());
        let bid = instrument.make_bid_price(quotes.bid_price);
        let ask = instrument.make_ask_price(quotes.ask_price);

        info!(%bid, %quantity, "submitting buy order");
        self.ctx
            .orders
            .submit(Order::limit(instrument.id(), Side::Buy, bid, quantity));

        info!(%ask, %quantity, "submitting sell order");
        self.ctx
            .orders
            .submit(Order::limit(instrument.id(), Side::Sell, ask, quantity));
    }

    fn close_position(&self, instrument: &Instrument) {
        let position = self.position();
        let quantity = instrument.make_qty(position.abs());

        if quantity.is_zero() {
            return;
        }

        let held = if position > Decimal::ZERO {
            Side::Buy
        } else {
            Side::Sell
        };

        info!(%position, %quantity, side = %held.opposite(), "closing position");
        self.ctx
            .orders
            .submit(Order::closing(instrument.id(), held.opposite(), quantity));
    }
}

impl Strategy for QuoteCycleController {
    fn start(&mut self) -> Result<()> {
        if self.state != StrategyState::Idle {
            bail!("strategy already started ({})", self.state);
        }

        let instrument_id = self.config.instrument_id().clone();

        let Some(instrument) = self.ctx.instruments.instrument(&instrument_id) else {
            error!(instrument = %instrument_id, "could not find instrument");
            bail!("could not find instrument {instrument_id}");
        };

        debug!(
            instrument = %instrument,
            price_precision = instrument.price_precision(),
            quantity_precision = instrument.quantity_precision(),
            "instrument resolved"
        );

        if instrument.make_qty(self.config.trade_size()).is_zero() {
            bail!(
                "trade_size {} is below the quantity precision of {instrument_id}",
                self.config.trade_size()
            );
        }

        self.mid_tracker = MidPriceTracker::new(self.config.book_depth() as usize);

        self.ctx
            .market_data
            .subscribe_book_deltas(&instrument_id, self.config.book_depth())?;

        if let Err(error) = self
            .ctx
            .timers
            .set_timer(QUOTE_TIMER, self.config.quote_interval())
        {
            self.ctx.market_data.unsubscribe_book_deltas(&instrument_id);
            return Err(error);
        }

        self.instrument = Some(instrument);
        self.state = StrategyState::Active;

        info!(
            instrument = %instrument_id,
            spread_pct = %(self.config.spread_pct() * PERCENT).round_dp(2),
            max_position = %self.config.inventory_threshold(),
            refresh = ?self.config.quote_interval(),
            "market maker started"
        );

        Ok(())
    }

    fn stop(&mut self) {
        if self.state == StrategyState::Idle {
            return;
        }

        self.ctx.timers.cancel_timer(QUOTE_TIMER);

        if let Some(instrument) = self.instrument.take() {
            self.ctx
                .market_data
                .unsubscribe_book_deltas(instrument.id());
            self.ctx.orders.cancel_all(instrument.id());

            if self.config.close_positions_on_stop() {
                self.close_position(&instrument);
            }
        }

        self.mid_tracker = MidPriceTracker::new(self.config.book_depth() as usize);
        self.state = StrategyState::Idle;

        info!("market maker stopped");
    }

    fn on_book_delta(&mut self, deltas: &BookDeltas) {
        if self.state == StrategyState::Idle {
            return;
        }

        if deltas.instrument_id != *self.config.instrument_id() {
            debug!(instrument = %deltas.instrument_id, "ignoring deltas for other instrument");
            return;
        }

        self.mid_tracker.apply_update(deltas);
    }

    fn on_timer_tick(&mut self, event: &TimerEvent) {
        if event.name != QUOTE_TIMER {
            debug!(timer = %event.name, "ignoring unknown timer");
            return;
        }

        match self.state {
            StrategyState::Active => {}
            StrategyState::Idle => return,
            StrategyState::Quoting => {
                warn!("quote cycle already in progress; skipping tick");
                return;
            }
        }

        let Some(mid) = self.mid_tracker.current_mid() else {
            warn!("cannot quote - no mid price available");
            return;
        };

        let Some(instrument) = self.instrument.clone() else {
            return;
        };

        debug!(fired_at_ms = event.timestamp_ms, "quote timer fired");

        self.state = StrategyState::Quoting;
        self.run_quote_cycle(&instrument, mid);
        self.state = StrategyState::Active;
    }
}

fn log_plan(position: Decimal, quotes: &QuotePlan) {
    let skew_pct = (quotes.skew_fraction * PERCENT).round_dp(1);

    if position > Decimal::ZERO {
        info!(%position, %skew_pct, "long, tightening ask");
    } else if position < Decimal::ZERO {
        info!(%position, %skew_pct, "short, tightening bid");
    }

    info!(
        bid_spread_pct = %(quotes.bid_spread_fraction * PERCENT).round_dp(3),
        ask_spread_pct = %(quotes.ask_spread_fraction * PERCENT).round_dp(3),
        bid = %quotes.bid_price,
        ask = %quotes.ask_price,
        "final spreads"
    );
}
