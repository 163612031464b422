use crate::clock::TimerEvent;
use crate::market::book_delta::BookDeltas;

/// Everything the strategy reacts to, delivered through one channel so that
/// handlers never interleave.
#[derive(Debug, Clone)]
pub enum StrategyEvent {
    BookDeltas(BookDeltas),
    Timer(TimerEvent),
}
