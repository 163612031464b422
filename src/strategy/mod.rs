pub mod quote_cycle_controller;
pub mod strategy_context;
pub mod strategy_state;

use anyhow::Result;

use crate::clock::TimerEvent;
use crate::events::StrategyEvent;
use crate::market::book_delta::BookDeltas;

/// Lifecycle entry points and event handlers the engine drives.
pub trait Strategy {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
    fn on_book_delta(&mut self, deltas: &BookDeltas);
    fn on_timer_tick(&mut self, event: &TimerEvent);

    fn on_event(&mut self, event: &StrategyEvent) {
        match event {
            StrategyEvent::BookDeltas(deltas) => self.on_book_delta(deltas),
            StrategyEvent::Timer(timer) => self.on_timer_tick(timer),
        }
    }
}
