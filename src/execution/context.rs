use super::{BalanceLedger, PositionQueue};
use crate::models::{BalanceState, Position};
use rust_decimal::Decimal;

/// Mutable run state for one bot instance
///
/// Owned by the scheduler and lent to the executor for each decision.
#[derive(Debug, Clone)]
pub struct TradingContext {
    pub ledger: BalanceLedger,
    pub queue: PositionQueue,
}

impl TradingContext {
    pub fn new(ledger: BalanceLedger, queue: PositionQueue) -> Self {
        Self { ledger, queue }
    }

    pub fn balances(&self) -> BalanceState {
        self.ledger.snapshot()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.queue.all()
    }

    /// Unrealized P&L of all open positions at `price`
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.queue
            .all()
            .iter()
            .map(|p| p.unrealized_pnl(price))
            .sum()
    }
}
