use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One open buy awaiting a matching sell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub entry_price: Decimal,
    pub amount: Decimal,
    pub target_price: Decimal, // entry_price * (1 + profit_threshold)
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Open a position and compute its sell target from the profit threshold
    pub fn open(
        entry_price: Decimal,
        amount: Decimal,
        profit_threshold: Decimal,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entry_price,
            amount,
            target_price: entry_price * (Decimal::ONE + profit_threshold),
            opened_at,
        }
    }

    /// Unrealized P&L at the given price
    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        (current_price - self.entry_price) * self.amount
    }
}

/// Fiat/crypto balance pair held by the ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BalanceState {
    #[serde(rename = "fiat")]
    pub fiat_balance: Decimal,
    #[serde(rename = "crypto")]
    pub crypto_balance: Decimal,
}

impl BalanceState {
    pub fn new(fiat_balance: Decimal, crypto_balance: Decimal) -> Self {
        Self {
            fiat_balance,
            crypto_balance,
        }
    }
}

/// Market data assembled once per tick
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub current_price: Decimal,
    /// Closing prices, oldest first. Empty when the strategy needs no candles.
    pub recent_closes: Vec<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(current_price: Decimal) -> Self {
        Self {
            current_price,
            recent_closes: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_closes(mut self, recent_closes: Vec<Decimal>) -> Self {
        self.recent_closes = recent_closes;
        self
    }

    /// A zero, negative or missing price is never traded on
    pub fn has_valid_price(&self) -> bool {
        self.current_price > Decimal::ZERO
    }
}

/// Outcome of a strategy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy(Decimal),
    SellAt(usize, Decimal),
    Hold,
}

impl Decision {
    pub fn is_hold(&self) -> bool {
        matches!(self, Decision::Hold)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Wire representation used by the exchange
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// Result of a successfully executed decision
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    pub side: TradeSide,
    pub order_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub simulated: bool,
}
