use std::env;
use std::fmt;

use anyhow::{Result, anyhow};

const REST_URL: &str = "https://api.kraken.com";
const AUTH_WEBSOCKET_URL: &str = "wss://ws-auth.kraken.com/v2";

/// Private API credentials and endpoints, read from the environment.
#[derive(Clone)]
pub struct KrakenConfig {
    pub api_key: String,
    pub api_secret: String,
    pub rest_url: String,
    pub auth_websocket_url: String,
}

impl KrakenConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("KRAKEN_API_KEY").map_err(|_| anyhow!("KRAKEN_API_KEY not set"))?;

        let api_secret =
            env::var("KRAKEN_API_SECRET").map_err(|_| anyhow!("KRAKEN_API_SECRET not set"))?;

        Ok(Self {
            api_key,
            api_secret,
            rest_url: env::var("KRAKEN_REST_URL").unwrap_or_else(|_| REST_URL.to_string()),
            auth_websocket_url: env::var("KRAKEN_AUTH_WS_URL")
                .unwrap_or_else(|_| AUTH_WEBSOCKET_URL.to_string()),
        })
    }
}

impl fmt::Debug for KrakenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KrakenConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("rest_url", &self.rest_url)
            .field("auth_websocket_url", &self.auth_websocket_url)
            .finish()
    }
}
