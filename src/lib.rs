// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod scheduler;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use api::{BinanceClient, ExchangeGateway};
pub use config::{BotConfig, StrategyConfig, StrategyVariant};
pub use error::BotError;
pub use models::*;
pub use persistence::{JsonFileStore, PersistenceStore};
pub use scheduler::{RunState, SchedulerLoop, SchedulerSettings, TickOutcome};
pub use strategy::{Strategy, StrategyEngine};

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;

/// Bound an external call; an elapsed deadline becomes `BotError::Timeout`
pub async fn with_timeout<T, F>(operation: &str, limit: std::time::Duration, call: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(BotError::Timeout {
            operation: operation.to_string(),
            seconds: limit.as_secs(),
        }),
    }
}
