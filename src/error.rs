use rust_decimal::Decimal;
use thiserror::Error;

/// Every failure the trading loop can observe
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BotError {
    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),

    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    #[error("Insufficient holdings: need {required}, have {available}")]
    InsufficientHoldings {
        required: Decimal,
        available: Decimal,
    },

    #[error("Budget limit breach: {remaining} would remain, floor is {limit}")]
    BudgetLimitBreach { remaining: Decimal, limit: Decimal },

    #[error("Position index {index} out of range (queue length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fatal: {0}")]
    Fatal(String),
}

impl BotError {
    /// Fatal errors stop the loop; everything else is retried on the next tick
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Fatal(_) | BotError::Config(_))
    }

    /// Decision rejected before any durable state changed
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BotError::InsufficientFunds { .. }
                | BotError::InsufficientHoldings { .. }
                | BotError::BudgetLimitBreach { .. }
                | BotError::IndexOutOfRange { .. }
                | BotError::OrderRejected(_)
        )
    }
}

impl From<std::io::Error> for BotError {
    fn from(e: std::io::Error) -> Self {
        BotError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(e: serde_json::Error) -> Self {
        BotError::Persistence(e.to_string())
    }
}

impl From<config::ConfigError> for BotError {
    fn from(e: config::ConfigError) -> Self {
        BotError::Config(e.to_string())
    }
}
