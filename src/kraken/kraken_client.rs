use anyhow::{Context, Result, anyhow};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

use crate::execution::order_action::{Order, OrderType, Side};
use crate::kraken::kraken_config::KrakenConfig;
use crate::kraken::utils::{rest_pair, sign_request};

#[derive(Clone)]
pub struct KrakenClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret_b64: String,
    last_nonce: Arc<AtomicU64>,
}

impl KrakenClient {
    pub fn new(config: KrakenConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.rest_url,
            api_key: config.api_key,
            api_secret_b64: config.api_secret,
            last_nonce: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn add_order(&self, order: &Order) -> Result<AddOrderResult> {
        let uri_path = "/0/private/AddOrder";
        let params = add_order_params(order);

        let result: AddOrderResult = self.private_post_form(uri_path, &params).await?;

        tracing::debug!(
            client_order_id = %order.client_order_id,
            txid = ?result.txid,
            descr = %result.descr.order,
            "order added"
        );

        Ok(result)
    }

    pub async fn cancel_order(&self, client_order_id: &str) -> Result<CancelOrderResult> {
        let uri_path = "/0/private/CancelOrder";

        let params = vec![("cl_ord_id".to_string(), client_order_id.to_string())];

        let result: CancelOrderResult = self.private_post_form(uri_path, &params).await?;

        tracing::info!(client_order_id = %client_order_id, count = result.count, "cancel order result");

        Ok(result)
    }

    async fn private_post_form<T: DeserializeOwned>(
        &self,
        uri_path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let nonce = self.next_nonce();
        let mut all_params: Vec<(String, String)> = Vec::with_capacity(params.len() + 1);
        all_params.push(("nonce".to_string(), nonce.to_string()));
        all_params.extend_from_slice(params);

        let encoded_payload = encode_form(&all_params);
        let headers = self.signed_headers(uri_path, nonce, &encoded_payload)?;

        let resp = self
            .http
            .post(format!("{}{}", self.base_url, uri_path))
            .headers(headers)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(encoded_payload)
            .send()
            .await
            .context("kraken private POST failed")?;

        let status = resp.status();
        let text = resp.text().await.context("read response body failed")?;

        if !status.is_success() {
            anyhow::bail!("kraken http error {status}: {text}");
        }

        parse_response(&text)
    }

    fn signed_headers(
        &self,
        uri_path: &str,
        nonce: u64,
        encoded_payload: &str,
    ) -> Result<HeaderMap> {
        let api_sign = sign_request(
            uri_path,
            encoded_payload,
            &nonce.to_string(),
            &self.api_secret_b64,
        )?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "API-Key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| anyhow!("invalid API key header value"))?,
        );
        headers.insert(
            "API-Sign",
            HeaderValue::from_str(&api_sign)
                .map_err(|_| anyhow!("invalid API sign header value"))?,
        );

        Ok(headers)
    }

    fn next_nonce(&self) -> u64 {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        loop {
            let prev = self.last_nonce.load(Ordering::Relaxed);
            let next = if now_ms > prev { now_ms } else { prev + 1 };
            if self
                .last_nonce
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct KrakenResponse<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct AddOrderResult {
    #[serde(default)]
    pub txid: Vec<String>,
    pub descr: AddOrderDescr,
}

#[derive(Debug, Deserialize)]
pub struct AddOrderDescr {
    pub order: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelOrderResult {
    pub count: i64,
}

fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    let parsed: KrakenResponse<T> = match serde_json::from_str(text) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, %text, "failed to parse kraken JSON response");
            anyhow::bail!("parse kraken response JSON failed: {e}; raw={text}");
        }
    };

    if !parsed.error.is_empty() {
        anyhow::bail!("kraken api error: {:?}", parsed.error);
    }

    match parsed.result {
        Some(result) => Ok(result),
        None => {
            anyhow::bail!("kraken response missing `result` but `error` was empty; raw={text}")
        }
    }
}

fn add_order_params(order: &Order) -> Vec<(String, String)> {
    let side = match order.side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    };

    let mut params = vec![
        ("type".to_string(), side.to_string()),
        ("pair".to_string(), rest_pair(&order.instrument_id)),
        ("volume".to_string(), format_decimal(order.quantity)),
        ("cl_ord_id".to_string(), order.client_order_id.clone()),
    ];

    match order.order_type {
        OrderType::Limit { price } => {
            params.push(("ordertype".to_string(), "limit".to_string()));
            params.push(("price".to_string(), format_decimal(price.as_decimal())));
            params.push(("oflags".to_string(), "post".to_string()));
        }
        OrderType::Market => {
            params.push(("ordertype".to_string(), "market".to_string()));
        }
    }

    params
}

fn encode_form(params: &[(String, String)]) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (k, v) in params {
        ser.append_pair(k, v);
    }
    ser.finish()
}

fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}
