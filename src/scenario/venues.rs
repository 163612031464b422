use std::fmt;

use clap::ValueEnum;

/// Where orders go. Market data always comes from the instrument's venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VenueKind {
    #[value(name = "dry-run", aliases = ["dryrun", "paper"])]
    DryRun,
    Kraken,
}

impl fmt::Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => write!(f, "dry-run"),
            Self::Kraken => write!(f, "kraken"),
        }
    }
}
