use super::{DecisionContext, Strategy};
use crate::indicators::calculate_channel;
use crate::models::Decision;
use rust_decimal::Decimal;

pub const DEFAULT_LOOKBACK: usize = 21;

/// Channel breakout strategy
///
/// Splits the last `lookback` closes into the latest close and the preceding
/// window. A close above the window's high buys; a close below its low sells
/// the oldest open position.
#[derive(Debug, Clone, Copy)]
pub struct BreakoutStrategy {
    lookback: usize,
}

impl BreakoutStrategy {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }
}

impl Default for BreakoutStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl Strategy for BreakoutStrategy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let closes = &ctx.snapshot.recent_closes;
        if closes.len() < 2 {
            return Decision::Hold;
        }

        let window = &closes[closes.len().saturating_sub(self.lookback)..];
        let Some((&current, preceding)) = window.split_last() else {
            return Decision::Hold;
        };
        let Some(channel) = calculate_channel(preceding) else {
            return Decision::Hold;
        };

        if current <= Decimal::ZERO {
            return Decision::Hold;
        }

        tracing::debug!(
            "🔍 Breakout: close={} top={} bottom={}",
            current,
            channel.top,
            channel.bottom
        );

        if current > channel.top {
            return Decision::Buy(current);
        }
        if current < channel.bottom && !ctx.positions.is_empty() {
            return Decision::SellAt(0, current);
        }

        Decision::Hold
    }

    fn name(&self) -> &str {
        "Breakout"
    }

    fn candles_required(&self) -> usize {
        self.lookback
    }
}
