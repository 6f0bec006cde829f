use crate::error::BotError;
use crate::models::BalanceState;
use crate::Result;
use rust_decimal::Decimal;

/// Authoritative in-memory fiat/crypto balances
///
/// Every mutation checks its preconditions first and then applies both legs,
/// so a failed call leaves the balances untouched.
#[derive(Debug, Clone)]
pub struct BalanceLedger {
    state: BalanceState,
    budget_limit: Decimal,
}

impl BalanceLedger {
    pub fn new(state: BalanceState, budget_limit: Decimal) -> Self {
        Self {
            state,
            budget_limit,
        }
    }

    /// Spend `cost` fiat for `qty` crypto
    pub fn apply_buy(&mut self, cost: Decimal, qty: Decimal) -> Result<()> {
        if self.state.fiat_balance < cost {
            return Err(BotError::InsufficientFunds {
                required: cost,
                available: self.state.fiat_balance,
            });
        }

        let remaining = self.state.fiat_balance - cost;
        if self.budget_limit > Decimal::ZERO && remaining < self.budget_limit {
            return Err(BotError::BudgetLimitBreach {
                remaining,
                limit: self.budget_limit,
            });
        }

        self.state.fiat_balance = remaining;
        self.state.crypto_balance += qty;
        Ok(())
    }

    /// Receive `proceeds` fiat for `qty` crypto
    pub fn apply_sell(&mut self, proceeds: Decimal, qty: Decimal) -> Result<()> {
        if self.state.crypto_balance < qty {
            return Err(BotError::InsufficientHoldings {
                required: qty,
                available: self.state.crypto_balance,
            });
        }

        self.state.crypto_balance -= qty;
        self.state.fiat_balance += proceeds;
        Ok(())
    }

    pub fn snapshot(&self) -> BalanceState {
        self.state
    }

    /// Replace balances wholesale (refresh from the backing source, or rollback)
    pub fn restore(&mut self, state: BalanceState) {
        self.state = state;
    }

    pub fn budget_limit(&self) -> Decimal {
        self.budget_limit
    }
}
