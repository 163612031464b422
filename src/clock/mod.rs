pub mod tokio_timers;

use std::time::Duration;

use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    pub name: String,
    pub timestamp_ms: i64,
}

/// Named periodic timers. Ticks arrive as `StrategyEvent::Timer` on the
/// strategy's event channel.
pub trait TimerService: Send {
    /// Arms a timer whose first tick fires one `interval` from now.
    fn set_timer(&mut self, name: &str, interval: Duration) -> Result<()>;

    /// Cancels a timer by name. Unknown names are ignored.
    fn cancel_timer(&mut self, name: &str);
}
