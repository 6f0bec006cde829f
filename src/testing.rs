// In-memory gateway and store fakes for unit tests
use crate::api::ExchangeGateway;
use crate::error::BotError;
use crate::models::{BalanceState, Position, TradeSide};
use crate::persistence::PersistenceStore;
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeGateway {
    pub price: Mutex<Decimal>,
    pub closes: Mutex<Vec<Decimal>>,
    pub account: Mutex<HashMap<String, Decimal>>,
    pub price_error: Mutex<Option<BotError>>,
    pub order_error: Mutex<Option<BotError>>,
    pub orders: Mutex<Vec<(TradeSide, Decimal)>>,
    /// Applied to price and order calls to simulate a hung exchange
    pub delay: Mutex<Option<Duration>>,
}

impl FakeGateway {
    pub fn with_price(price: Decimal) -> Self {
        let gateway = Self::default();
        *gateway.price.lock().unwrap() = price;
        gateway
    }

    pub fn set_price(&self, price: Decimal) {
        *self.price.lock().unwrap() = price;
    }

    pub fn reject_orders(&self, reason: &str) {
        *self.order_error.lock().unwrap() = Some(BotError::OrderRejected(reason.to_string()));
    }

    pub fn stall_for(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn stall(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl ExchangeGateway for FakeGateway {
    async fn get_price(&self, _pair: &str) -> Result<Decimal> {
        self.stall().await;
        if let Some(err) = self.price_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(*self.price.lock().unwrap())
    }

    async fn get_candles(&self, _pair: &str, _interval: &str, limit: usize) -> Result<Vec<Decimal>> {
        let closes = self.closes.lock().unwrap();
        let start = closes.len().saturating_sub(limit);
        Ok(closes[start..].to_vec())
    }

    async fn get_account_balances(&self) -> Result<HashMap<String, Decimal>> {
        Ok(self.account.lock().unwrap().clone())
    }

    async fn place_market_order(
        &self,
        _pair: &str,
        side: TradeSide,
        quantity: Decimal,
    ) -> Result<String> {
        self.stall().await;
        if let Some(err) = self.order_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut orders = self.orders.lock().unwrap();
        orders.push((side, quantity));
        Ok(format!("ORDER-{}", orders.len()))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub positions: Mutex<Vec<Position>>,
    pub balances: Mutex<Option<BalanceState>>,
    pub fail_saves: AtomicBool,
    pub saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_balances(balances: BalanceState) -> Self {
        let store = Self::default();
        *store.balances.lock().unwrap() = Some(balances);
        store
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn saved_positions(&self) -> Vec<Position> {
        self.positions.lock().unwrap().clone()
    }

    pub fn saved_balances(&self) -> Option<BalanceState> {
        *self.balances.lock().unwrap()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(BotError::Persistence("disk full".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PersistenceStore for MemoryStore {
    async fn load_positions(&self) -> Result<Vec<Position>> {
        Ok(self.saved_positions())
    }

    async fn save_positions(&self, positions: &[Position]) -> Result<()> {
        self.check_writable()?;
        *self.positions.lock().unwrap() = positions.to_vec();
        Ok(())
    }

    async fn load_simulated_balances(&self) -> Result<BalanceState> {
        Ok(self.saved_balances().unwrap_or_default())
    }

    async fn save_simulated_balances(&self, balances: &BalanceState) -> Result<()> {
        self.check_writable()?;
        *self.balances.lock().unwrap() = Some(*balances);
        Ok(())
    }
}
