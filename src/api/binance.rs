use super::ExchangeGateway;
use crate::error::BotError;
use crate::models::TradeSide;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const BINANCE_API_BASE: &str = "https://api.binance.com";
pub const BINANCE_TESTNET_BASE: &str = "https://testnet.binance.vision";

type HmacSha256 = Hmac<Sha256>;

// Type alias for the rate limiter to simplify signatures
type BinanceRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Binance spot REST client
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
    rate_limiter: Arc<BinanceRateLimiter>,
}

/// Error body returned by Binance, e.g. `{"code":-2010,"msg":"..."}`
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    free: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewOrderResponse {
    order_id: u64,
    status: Option<String>,
}

impl BinanceClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: String,
        api_secret: String,
        max_requests_per_second: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BotError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let quota = Quota::per_second(NonZeroU32::new(max_requests_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// REST base URL for the spot testnet or production
    pub fn base_url_for(testnet: bool) -> &'static str {
        if testnet {
            BINANCE_TESTNET_BASE
        } else {
            BINANCE_API_BASE
        }
    }

    fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Send a request and decode the body, turning Binance error bodies into messages
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> std::result::Result<T, String> {
        self.rate_limiter.until_ready().await;

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let text = response.text().await.map_err(|e| e.to_string())?;

        if status.is_success() {
            serde_json::from_str::<T>(&text)
                .map_err(|e| format!("Failed to parse response: {} (body: {})", e, text))
        } else {
            match serde_json::from_str::<ApiErrorResponse>(&text) {
                Ok(api_error) => Err(format!(
                    "Binance error {} ({}): {}",
                    api_error.code, status, api_error.msg
                )),
                Err(_) => Err(format!("HTTP {}: {}", status, text)),
            }
        }
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        mut params: Vec<(&str, String)>,
    ) -> std::result::Result<T, String> {
        if !self.has_credentials() {
            return Err("API key and secret are required for signed endpoints".to_string());
        }

        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        let query_string = serde_urlencoded::to_string(&params).map_err(|e| e.to_string())?;
        let signature = sign_query(&self.api_secret, &query_string)?;
        let url = format!(
            "{}{}?{}&signature={}",
            self.base_url, endpoint, query_string, signature
        );

        let request = self
            .client
            .request(method, &url)
            .header("X-MBX-APIKEY", &self.api_key);

        self.send(request).await
    }
}

/// HMAC-SHA256 signature of a query string, hex encoded
pub fn sign_query(secret: &str, query_string: &str) -> std::result::Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("Invalid secret key: {}", e))?;
    mac.update(query_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn parse_decimal(raw: &str, what: &str) -> std::result::Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|e| format!("Invalid {} '{}': {}", what, raw, e))
}

#[async_trait]
impl ExchangeGateway for BinanceClient {
    async fn get_price(&self, pair: &str) -> Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let request = self.client.get(&url).query(&[("symbol", pair)]);

        let ticker: TickerPrice = self
            .send(request)
            .await
            .map_err(BotError::MarketDataUnavailable)?;

        parse_decimal(&ticker.price, "price").map_err(BotError::MarketDataUnavailable)
    }

    async fn get_candles(&self, pair: &str, interval: &str, limit: usize) -> Result<Vec<Decimal>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit = limit.to_string();
        let request = self.client.get(&url).query(&[
            ("symbol", pair),
            ("interval", interval),
            ("limit", limit.as_str()),
        ]);

        // Each kline is a heterogeneous array; the close is at index 4
        let klines: Vec<Vec<serde_json::Value>> = self
            .send(request)
            .await
            .map_err(BotError::MarketDataUnavailable)?;

        klines
            .iter()
            .map(|kline| {
                let close = kline
                    .get(4)
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| BotError::MarketDataUnavailable("Malformed kline".to_string()))?;
                parse_decimal(close, "close").map_err(BotError::MarketDataUnavailable)
            })
            .collect()
    }

    async fn get_account_balances(&self) -> Result<HashMap<String, Decimal>> {
        let account: AccountInfo = self
            .send_signed(Method::GET, "/api/v3/account", vec![])
            .await
            .map_err(BotError::MarketDataUnavailable)?;

        let mut balances = HashMap::new();
        for balance in account.balances {
            let free = parse_decimal(&balance.free, "balance")
                .map_err(BotError::MarketDataUnavailable)?;
            if free > Decimal::ZERO {
                balances.insert(balance.asset, free);
            }
        }

        Ok(balances)
    }

    async fn place_market_order(
        &self,
        pair: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<String> {
        let params = vec![
            ("symbol", pair.to_string()),
            ("side", side.as_str().to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", quantity.normalize().to_string()),
        ];

        tracing::info!("🚀 Sending order: {} {} {}", side.as_str(), quantity, pair);

        let response: NewOrderResponse = self
            .send_signed(Method::POST, "/api/v3/order", params)
            .await
            .map_err(BotError::OrderRejected)?;

        tracing::debug!(
            "Order {} accepted with status {:?}",
            response.order_id,
            response.status
        );

        Ok(response.order_id.to_string())
    }
}
