use std::sync::Arc;

use anyhow::{Result, bail};

use crate::{
    execution::{DynamicVenue, ReportSender, dry_run::DryRunExecutionVenue},
    kraken::{
        kraken_config::KrakenConfig, kraken_market::KrakenMarket,
        kraken_venue::KrakenExecutionVenue,
    },
    market::market_source::MarketDataSource,
    scenario::venues::VenueKind,
    types::instrument::InstrumentId,
};

pub struct Scenario;

impl Scenario {
    pub fn execution_venue(kind: VenueKind, on_report: ReportSender) -> Result<DynamicVenue> {
        tracing::info!(venue = %kind, "creating execution venue");

        let venue: DynamicVenue = match kind {
            VenueKind::DryRun => Arc::new(DryRunExecutionVenue::new(on_report)),
            VenueKind::Kraken => {
                let config = KrakenConfig::from_env()?;

                Arc::new(KrakenExecutionVenue::new(config, on_report))
            }
        };

        Ok(venue)
    }

    /// Public book feed for the instrument's venue. Paper trading quotes
    /// against the same live feed.
    pub fn market_source(instrument_id: &InstrumentId) -> Result<Arc<dyn MarketDataSource>> {
        match instrument_id.venue() {
            "KRAKEN" => Ok(Arc::new(KrakenMarket::default())),
            other => bail!("no market data source for venue {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast;

    #[test]
    fn test_market_source_by_venue() {
        assert!(Scenario::market_source(&InstrumentId::new("XBT/USD", "KRAKEN")).is_ok());
        assert!(Scenario::market_source(&InstrumentId::new("BTC-USD", "COINBASE")).is_err());
    }

    #[test]
    fn test_dry_run_venue_needs_no_credentials() {
        let (tx, _rx) = broadcast::channel(8);
        assert!(Scenario::execution_venue(VenueKind::DryRun, tx).is_ok());
    }
}
