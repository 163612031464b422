use std::fmt;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum StrategyState {
    /// Not started, or stopped.
    #[default]
    Idle,
    /// Subscribed and the quote timer is armed.
    Active,
    /// Inside a quote cycle.
    Quoting,
}

impl fmt::Display for StrategyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Quoting => write!(f, "quoting"),
        }
    }
}
