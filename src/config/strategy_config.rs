use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::instrument::InstrumentId;

const BOOK_DEPTHS: &[u32] = &[10, 25, 100, 500, 1000];

/// Validated strategy parameters. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    instrument_id: InstrumentId,
    trade_size: Decimal,
    spread_pct: Decimal,
    inventory_threshold: Decimal,
    quote_interval_seconds: u64,
    close_positions_on_stop: bool,
    book_depth: u32,
}

impl StrategyConfig {
    pub const DEFAULT_FILE_NAME: &'static str = "strategy.yml";

    pub fn new(
        instrument_id: InstrumentId,
        trade_size: Decimal,
        spread_pct: Decimal,
        inventory_threshold: Decimal,
        quote_interval_seconds: u64,
        close_positions_on_stop: bool,
        book_depth: u32,
    ) -> Result<Self> {
        if trade_size <= Decimal::ZERO {
            bail!("trade_size must be > 0");
        }
        if spread_pct <= Decimal::ZERO || spread_pct >= Decimal::ONE {
            bail!("spread_pct must be > 0 and < 1");
        }
        if inventory_threshold < Decimal::ZERO {
            bail!("inventory_threshold must be >= 0");
        }
        if inventory_threshold.is_zero() {
            tracing::warn!("inventory_threshold is 0; inventory skew is disabled");
        }
        if quote_interval_seconds == 0 {
            bail!("quote_interval_seconds must be > 0");
        }
        if !BOOK_DEPTHS.contains(&book_depth) {
            bail!("book_depth must be one of {BOOK_DEPTHS:?}");
        }

        Ok(Self {
            instrument_id,
            trade_size,
            spread_pct,
            inventory_threshold,
            quote_interval_seconds,
            close_positions_on_stop,
            book_depth,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read strategy config {}", path.display()))?;

        Self::from_yaml(&raw)
            .with_context(|| format!("invalid strategy config {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let file: StrategyConfigFile =
            serde_yaml::from_str(raw).context("failed to parse strategy config")?;

        Self::new(
            file.instrument_id.parse()?,
            file.trade_size,
            file.spread_pct,
            file.inventory_threshold,
            file.quote_interval_seconds,
            file.close_positions_on_stop,
            file.book_depth,
        )
    }

    pub fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    pub fn trade_size(&self) -> Decimal {
        self.trade_size
    }

    /// Total target spread as a fraction of mid.
    pub fn spread_pct(&self) -> Decimal {
        self.spread_pct
    }

    pub fn inventory_threshold(&self) -> Decimal {
        self.inventory_threshold
    }

    pub fn quote_interval(&self) -> Duration {
        Duration::from_secs(self.quote_interval_seconds)
    }

    pub fn close_positions_on_stop(&self) -> bool {
        self.close_positions_on_stop
    }

    pub fn book_depth(&self) -> u32 {
        self.book_depth
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrategyConfigFile {
    instrument_id: String,
    trade_size: Decimal,
    #[serde(default = "default_spread_pct")]
    spread_pct: Decimal,
    #[serde(default = "default_inventory_threshold")]
    inventory_threshold: Decimal,
    #[serde(default = "default_quote_interval_seconds")]
    quote_interval_seconds: u64,
    #[serde(default = "default_true")]
    close_positions_on_stop: bool,
    #[serde(default = "default_book_depth")]
    book_depth: u32,
}

fn default_spread_pct() -> Decimal {
    Decimal::new(1, 2) // 1% total, 0.5% each side
}
fn default_inventory_threshold() -> Decimal {
    Decimal::new(50, 1)
}
fn default_quote_interval_seconds() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_book_depth() -> u32 {
    25
}
