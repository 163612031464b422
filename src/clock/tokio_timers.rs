use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clock::{TimerEvent, TimerService};
use crate::events::StrategyEvent;

/// One tokio task per named timer, each feeding the strategy event channel.
#[derive(Debug)]
pub struct TokioTimers {
    events: mpsc::Sender<StrategyEvent>,
    timers: HashMap<String, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(events: mpsc::Sender<StrategyEvent>) -> Self {
        Self {
            events,
            timers: HashMap::new(),
        }
    }
}

impl TimerService for TokioTimers {
    fn set_timer(&mut self, name: &str, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            bail!("timer {name} interval must be > 0");
        }
        if self.timers.contains_key(name) {
            bail!("timer {name} is already set");
        }

        let events = self.events.clone();
        let timer_name = name.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let event = TimerEvent {
                    name: timer_name.clone(),
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                };

                if events.send(StrategyEvent::Timer(event)).await.is_err() {
                    tracing::debug!(timer = %timer_name, "event channel closed; timer exiting");
                    break;
                }
            }
        });

        tracing::debug!(timer = %name, ?interval, "timer set");
        self.timers.insert(name.to_string(), task);

        Ok(())
    }

    fn cancel_timer(&mut self, name: &str) {
        if let Some(task) = self.timers.remove(name) {
            task.abort();
            tracing::debug!(timer = %name, "timer cancelled");
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
    }
}
