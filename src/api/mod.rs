pub mod binance;

pub use binance::BinanceClient;

use crate::models::TradeSide;
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Exchange operations the bot depends on
///
/// Read failures surface as `MarketDataUnavailable`, order failures as
/// `OrderRejected`. Callers bound every call with a timeout.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Last traded price for the pair
    async fn get_price(&self, pair: &str) -> Result<Decimal>;

    /// Closing prices, oldest first; may be shorter than `limit`
    async fn get_candles(&self, pair: &str, interval: &str, limit: usize) -> Result<Vec<Decimal>>;

    /// Free balance per asset (real mode only)
    async fn get_account_balances(&self) -> Result<HashMap<String, Decimal>>;

    /// Submit an immediate market order, returning the exchange order id
    async fn place_market_order(
        &self,
        pair: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<String>;
}
