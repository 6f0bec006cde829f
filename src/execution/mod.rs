// Balances, open positions and order execution
pub mod context;
pub mod executor;
pub mod ledger;
pub mod position_queue;

pub use context::TradingContext;
pub use executor::OrderExecutor;
pub use ledger::BalanceLedger;
pub use position_queue::PositionQueue;
