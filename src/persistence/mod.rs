// Durable state for positions and simulated balances
pub mod json_store;

pub use json_store::JsonFileStore;

use crate::models::{BalanceState, Position};
use crate::Result;
use async_trait::async_trait;

/// Backing store for the position queue and simulated balances
///
/// Saves must be crash-atomic: a reader never observes a partially
/// written list or balance file.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Ordered positions, oldest first; empty if nothing was saved yet
    async fn load_positions(&self) -> Result<Vec<Position>>;

    async fn save_positions(&self, positions: &[Position]) -> Result<()>;

    /// Simulated balances, initialized to the starting balance if absent
    async fn load_simulated_balances(&self) -> Result<BalanceState>;

    async fn save_simulated_balances(&self, balances: &BalanceState) -> Result<()>;
}
