use super::{DecisionContext, Strategy};
use crate::indicators::calculate_sma;
use crate::models::Decision;

pub const DEFAULT_PERIOD: usize = 30;

/// Price / SMA crossover strategy
///
/// Takes the last `period + 1` closes. The SMA is computed over the oldest
/// `period` of them; the last two closes are compared against it to detect
/// an upward (buy) or downward (sell oldest) cross.
#[derive(Debug, Clone, Copy)]
pub struct SmaCrossoverStrategy {
    period: usize,
}

impl SmaCrossoverStrategy {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Default for SmaCrossoverStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let closes = &ctx.snapshot.recent_closes;
        let needed = self.period + 1;
        if self.period == 0 || closes.len() < needed {
            return Decision::Hold;
        }

        let window = &closes[closes.len() - needed..];
        let Some(sma) = calculate_sma(&window[..self.period], self.period) else {
            return Decision::Hold;
        };
        let prev = window[self.period - 1];
        let current = window[self.period];

        tracing::debug!("🔍 SMA: prev={} current={} sma={}", prev, current, sma);

        // Fiat must cover at least one trade unit
        let can_afford = ctx.balances.fiat_balance >= current * ctx.config.trade_amount;

        if prev <= sma && current > sma && can_afford {
            return Decision::Buy(current);
        }
        if prev >= sma && current < sma && !ctx.positions.is_empty() {
            return Decision::SellAt(0, current);
        }

        Decision::Hold
    }

    fn name(&self) -> &str {
        "SMA-Crossover"
    }

    fn candles_required(&self) -> usize {
        self.period + 1
    }
}
