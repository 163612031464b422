use crate::clock::TimerService;
use crate::execution::order_gateway::OrderGateway;
use crate::instruments::InstrumentProvider;
use crate::market::MarketDataClient;
use crate::position::PositionSource;

/// Collaborators the strategy talks to. Owned exclusively by one strategy instance.
pub struct StrategyContext {
    pub instruments: Box<dyn InstrumentProvider>,
    pub market_data: Box<dyn MarketDataClient>,
    pub positions: Box<dyn PositionSource>,
    pub timers: Box<dyn TimerService>,
    pub orders: OrderGateway,
}
