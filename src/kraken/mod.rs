pub mod kraken_client;
pub mod kraken_config;
pub mod kraken_market;
pub mod kraken_positions;
pub mod kraken_venue;
pub mod utils;
