#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use spotbot::api::ExchangeGateway;
use spotbot::config::StrategyConfig;
use spotbot::execution::{BalanceLedger, PositionQueue, TradingContext};
use spotbot::models::{BalanceState, Position, TradeSide};
use spotbot::persistence::PersistenceStore;
use spotbot::scheduler::{SchedulerLoop, SchedulerSettings};
use spotbot::{BotError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Exchange double with scripted prices and an order log
#[derive(Default)]
pub struct ScriptedExchange {
    pub price: Mutex<Decimal>,
    pub closes: Mutex<Vec<Decimal>>,
    pub account: Mutex<HashMap<String, Decimal>>,
    pub reject_with: Mutex<Option<String>>,
    pub orders: Mutex<Vec<(TradeSide, Decimal)>>,
}

impl ScriptedExchange {
    pub fn at(price: Decimal) -> Arc<Self> {
        let exchange = Self::default();
        *exchange.price.lock().unwrap() = price;
        Arc::new(exchange)
    }

    pub fn set_price(&self, price: Decimal) {
        *self.price.lock().unwrap() = price;
    }

    pub fn set_closes(&self, closes: Vec<Decimal>) {
        *self.closes.lock().unwrap() = closes;
    }

    pub fn orders(&self) -> Vec<(TradeSide, Decimal)> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeGateway for ScriptedExchange {
    async fn get_price(&self, _pair: &str) -> Result<Decimal> {
        Ok(*self.price.lock().unwrap())
    }

    async fn get_candles(&self, _pair: &str, _interval: &str, limit: usize) -> Result<Vec<Decimal>> {
        let closes = self.closes.lock().unwrap();
        Ok(closes[closes.len().saturating_sub(limit)..].to_vec())
    }

    async fn get_account_balances(&self) -> Result<HashMap<String, Decimal>> {
        Ok(self.account.lock().unwrap().clone())
    }

    async fn place_market_order(&self, _pair: &str, side: TradeSide, quantity: Decimal) -> Result<String> {
        if let Some(reason) = self.reject_with.lock().unwrap().clone() {
            return Err(BotError::OrderRejected(reason));
        }
        self.orders.lock().unwrap().push((side, quantity));
        Ok(format!("{}", self.orders.lock().unwrap().len()))
    }
}

/// Store double; `broken` makes every save fail
#[derive(Default)]
pub struct InMemoryStore {
    pub positions: Mutex<Vec<Position>>,
    pub balances: Mutex<BalanceState>,
    pub broken: Mutex<bool>,
}

impl InMemoryStore {
    pub fn holding(balances: BalanceState) -> Arc<Self> {
        let store = Self::default();
        *store.balances.lock().unwrap() = balances;
        Arc::new(store)
    }

    pub fn break_saves(&self, broken: bool) {
        *self.broken.lock().unwrap() = broken;
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.lock().unwrap().clone()
    }

    pub fn balances(&self) -> BalanceState {
        *self.balances.lock().unwrap()
    }

    fn check(&self) -> Result<()> {
        if *self.broken.lock().unwrap() {
            return Err(BotError::Persistence("read-only file system".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn load_positions(&self) -> Result<Vec<Position>> {
        Ok(self.positions())
    }

    async fn save_positions(&self, positions: &[Position]) -> Result<()> {
        self.check()?;
        *self.positions.lock().unwrap() = positions.to_vec();
        Ok(())
    }

    async fn load_simulated_balances(&self) -> Result<BalanceState> {
        Ok(self.balances())
    }

    async fn save_simulated_balances(&self, balances: &BalanceState) -> Result<()> {
        self.check()?;
        *self.balances.lock().unwrap() = *balances;
        Ok(())
    }
}

pub fn settings() -> SchedulerSettings {
    SchedulerSettings {
        loop_interval: Duration::from_millis(5),
        post_trade_delay: Duration::from_millis(5),
        request_timeout: Duration::from_secs(1),
        candle_interval: "1h".to_string(),
        maintenance_window: None,
        maintenance_pause: Duration::from_millis(5),
        base_asset: "BTC".to_string(),
        quote_asset: "USDT".to_string(),
    }
}

pub fn position(entry: Decimal, amount: Decimal, config: &StrategyConfig) -> Position {
    Position::open(entry, amount, config.profit_threshold, Utc::now())
}

/// Build a loop whose ledger starts from the store's (or account's) balances
pub fn bot(
    exchange: Arc<ScriptedExchange>,
    store: Arc<dyn PersistenceStore>,
    config: StrategyConfig,
    balances: BalanceState,
    positions: Vec<Position>,
) -> SchedulerLoop {
    let context = TradingContext::new(
        BalanceLedger::new(balances, config.budget_limit),
        PositionQueue::with_positions(positions),
    );
    SchedulerLoop::new(exchange, store, context, config, settings())
}
