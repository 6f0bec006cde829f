use super::{DecisionContext, Strategy};
use crate::indicators::calculate_rsi;
use crate::models::Decision;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const DEFAULT_PERIOD: usize = 14;

/// Oversold/overbought strategy on the classic RSI
///
/// Buys at or below `buy_level`, sells the oldest open position at or
/// above `sell_level`. Orders are priced at the live quote.
#[derive(Debug, Clone, Copy)]
pub struct RsiStrategy {
    period: usize,
    buy_level: Decimal,
    sell_level: Decimal,
}

impl RsiStrategy {
    pub fn new(period: usize, buy_level: Decimal, sell_level: Decimal) -> Self {
        Self {
            period,
            buy_level,
            sell_level,
        }
    }
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, dec!(30), dec!(70))
    }
}

impl Strategy for RsiStrategy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let Some(rsi) = calculate_rsi(&ctx.snapshot.recent_closes, self.period) else {
            return Decision::Hold;
        };
        let price = ctx.snapshot.current_price;

        tracing::debug!("🔍 RSI({}): {:.2}", self.period, rsi);

        if rsi <= self.buy_level {
            return Decision::Buy(price);
        }
        if rsi >= self.sell_level && !ctx.positions.is_empty() {
            return Decision::SellAt(0, price);
        }

        Decision::Hold
    }

    fn name(&self) -> &str {
        "RSI"
    }

    fn candles_required(&self) -> usize {
        self.period + 1
    }
}
