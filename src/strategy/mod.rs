// Trading strategy module
pub mod basic;
pub mod breakout;
pub mod dca;
pub mod rsi;
pub mod sma_crossover;

pub use basic::BasicStrategy;
pub use breakout::BreakoutStrategy;
pub use dca::DcaStrategy;
pub use rsi::RsiStrategy;
pub use sma_crossover::SmaCrossoverStrategy;

use crate::config::{StrategyConfig, StrategyVariant};
use crate::models::{BalanceState, Decision, MarketSnapshot, Position};

/// Everything a strategy may look at for one decision
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub snapshot: &'a MarketSnapshot,
    pub positions: &'a [Position],
    pub balances: &'a BalanceState,
    pub config: &'a StrategyConfig,
}

/// Base trait for all trading strategies
///
/// Implementations are pure: the same context always yields the same decision.
pub trait Strategy: Send + Sync {
    /// Decide what to do this tick
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Closing prices the strategy wants in the snapshot (0 = price only)
    fn candles_required(&self) -> usize {
        0
    }
}

/// The configured strategy, selected once at startup
#[derive(Debug, Clone)]
pub enum StrategyEngine {
    Basic(BasicStrategy),
    Breakout(BreakoutStrategy),
    Sma(SmaCrossoverStrategy),
    Rsi(RsiStrategy),
    Dca(DcaStrategy),
}

impl StrategyEngine {
    pub fn from_config(config: &StrategyConfig) -> Self {
        match config.strategy_variant {
            StrategyVariant::Basic => StrategyEngine::Basic(BasicStrategy),
            StrategyVariant::Breakout => {
                StrategyEngine::Breakout(BreakoutStrategy::new(config.breakout_lookback))
            }
            StrategyVariant::Sma => StrategyEngine::Sma(SmaCrossoverStrategy::new(config.sma_period)),
            StrategyVariant::Rsi => StrategyEngine::Rsi(RsiStrategy::new(
                config.rsi_period,
                config.rsi_buy_level,
                config.rsi_sell_level,
            )),
            StrategyVariant::Dca => StrategyEngine::Dca(DcaStrategy),
        }
    }

    fn strategy(&self) -> &dyn Strategy {
        match self {
            StrategyEngine::Basic(s) => s,
            StrategyEngine::Breakout(s) => s,
            StrategyEngine::Sma(s) => s,
            StrategyEngine::Rsi(s) => s,
            StrategyEngine::Dca(s) => s,
        }
    }

    /// Evaluate the active strategy; an invalid current price always holds
    pub fn decide(
        &self,
        snapshot: &MarketSnapshot,
        positions: &[Position],
        balances: &BalanceState,
        config: &StrategyConfig,
    ) -> Decision {
        if !snapshot.has_valid_price() {
            tracing::warn!(
                "Invalid current price {}, holding",
                snapshot.current_price
            );
            return Decision::Hold;
        }

        let ctx = DecisionContext {
            snapshot,
            positions,
            balances,
            config,
        };
        let decision = self.strategy().decide(&ctx);
        tracing::debug!("🔍 {}: {:?}", self.name(), decision);
        decision
    }

    pub fn name(&self) -> &str {
        self.strategy().name()
    }

    pub fn candles_required(&self) -> usize {
        self.strategy().candles_required()
    }
}
