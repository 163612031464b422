use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::kraken::kraken_config::KrakenConfig;
use crate::kraken::utils::{base_asset, get_websocket_token};
use crate::position::{PositionSource, WatchedPosition};
use crate::types::instrument::InstrumentId;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Spot position read from the private `balances` channel. The position is the
/// base asset balance minus the balance seen in the first snapshot, so holdings
/// that predate the process are never quoted against or closed.
pub struct KrakenPositions {
    position: WatchedPosition,
    feed: Arc<BalanceFeed>,
    task: JoinHandle<()>,
}

impl KrakenPositions {
    pub async fn spawn(config: &KrakenConfig, instrument_id: &InstrumentId) -> Result<Self> {
        /* NOTE: the first token is fetched eagerly so bad credentials fail startup */
        let mut first_token = Some(get_websocket_token(config).await?);

        let (tx, rx) = watch::channel(None);
        let feed = Arc::new(BalanceFeed::new(tx));
        let base_codes = kraken_balance_codes(base_asset(instrument_id));

        let config = config.clone();
        let session_feed = feed.clone();
        let session = move || {
            let config = config.clone();
            let feed = session_feed.clone();
            let base_codes = base_codes.clone();
            let cached_token = first_token.take();

            async move {
                let ws_token = match cached_token {
                    Some(token) => token,
                    None => get_websocket_token(&config).await?,
                };

                run_once(&config.auth_websocket_url, &ws_token, &base_codes, &feed).await
            }
        };

        let task = tokio::spawn(supervise(feed.clone(), session));

        Ok(Self {
            position: WatchedPosition::new(instrument_id.clone(), rx),
            feed,
            task,
        })
    }
}

impl PositionSource for KrakenPositions {
    fn position(&self, instrument_id: &InstrumentId) -> Option<Decimal> {
        if !self.feed.is_healthy() {
            tracing::warn!(instrument = %instrument_id, "position feed is down; using last known position");
        }

        self.position.position(instrument_id)
    }
}

impl Drop for KrakenPositions {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Publishes balances relative to the first one received.
#[derive(Debug)]
struct BalanceFeed {
    sender: watch::Sender<Option<Decimal>>,
    baseline: OnceCell<Decimal>,
    healthy: AtomicBool,
}

impl BalanceFeed {
    fn new(sender: watch::Sender<Option<Decimal>>) -> Self {
        Self {
            sender,
            baseline: OnceCell::new(),
            healthy: AtomicBool::new(false),
        }
    }

    fn on_balance(&self, balance: Decimal) {
        let baseline = *self.baseline.get_or_init(|| {
            tracing::info!(%balance, "base balance baseline recorded");
            balance
        });

        let position = balance - baseline;
        tracing::debug!(%balance, %position, "base balance updated");

        self.healthy.store(true, Ordering::Relaxed);
        let _ = self.sender.send(Some(position));
    }

    fn mark_down(&self) {
        self.healthy.store(false, Ordering::Relaxed);
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Runs `session` until every position reader is gone, reconnecting after each failure.
async fn supervise<F, Fut>(feed: Arc<BalanceFeed>, mut session: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    loop {
        match session().await {
            Ok(()) => tracing::error!("kraken balances feed closed; position is stale until reconnect"),
            Err(error) => {
                tracing::error!("kraken balances feed failed; position is stale until reconnect: {error:?}")
            }
        }

        feed.mark_down();

        if feed.is_closed() {
            break;
        }

        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn run_once(url: &str, ws_token: &str, base_codes: &[String], feed: &BalanceFeed) -> Result<()> {
    let (mut ws, _) = connect_async(url)
        .await
        .with_context(|| format!("connect_async({url}) failed"))?;

    let sub = serde_json::json!({
        "method": "subscribe",
        "params": {
            "channel": "balances",
            "token": ws_token
        }
    });
    ws.send(Message::Text(sub.to_string())).await?;

    while let Some(msg) = ws.next().await {
        let msg = msg?;
        let Ok(text) = msg.into_text() else { continue };

        if let Some(balance) = parse_base_balance(&text, base_codes) {
            feed.on_balance(balance);
        }
    }

    Ok(())
}

fn parse_base_balance(text: &str, base_codes: &[String]) -> Option<Decimal> {
    /* NOTE: ignore non-frame messages */
    let frame: WsFrame = serde_json::from_str(text).ok()?;

    if frame.channel.as_deref() != Some("balances") {
        return None;
    }

    pick_balance(&frame.data?, base_codes)
}

#[derive(Debug, Deserialize)]
struct WsFrame {
    #[serde(default)]
    channel: Option<String>,

    #[serde(default)]
    data: Option<Vec<BalanceEntry>>,
}

#[derive(Debug, Deserialize)]
struct BalanceEntry {
    asset: String,

    #[serde(default)]
    balance: Decimal,

    #[serde(default)]
    wallets: Vec<WalletBalance>,
}

#[derive(Debug, Deserialize)]
struct WalletBalance {
    #[serde(default)]
    r#type: String, // "spot"
    #[serde(default)]
    id: String, // "main"
    #[serde(default)]
    balance: Decimal,
}

fn kraken_balance_codes(asset: &str) -> Vec<String> {
    let s = asset.to_uppercase();
    match s.as_str() {
        "BTC" | "XBT" => vec!["XBT".into(), "XXBT".into(), "BTC".into()],
        "ETH" => vec!["ETH".into(), "XETH".into()],
        _ => vec![s],
    }
}

fn pick_balance(entries: &[BalanceEntry], codes: &[String]) -> Option<Decimal> {
    for code in codes {
        if let Some(e) = entries.iter().find(|e| e.asset.eq_ignore_ascii_case(code)) {
            if let Some(w) = e
                .wallets
                .iter()
                .find(|w| w.r#type == "spot" && w.id == "main")
            {
                return Some(w.balance);
            }
            return Some(e.balance);
        }
    }

    None
}
