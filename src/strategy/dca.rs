use super::{DecisionContext, Strategy};
use crate::models::Decision;
use rust_decimal::Decimal;

/// Dollar Cost Averaging (DCA) strategy
///
/// Scales into drops relative to the most recent entry and takes profit
/// when price clears the same entry by `profit_threshold`.
///
/// Strategy:
/// - Nothing open: buy (seed)
/// - Price <= last entry * (1 - drop_threshold): buy more
/// - Price >= last entry * (1 + profit_threshold): sell the *oldest* position
///
/// The sell compares against the newest entry but closes index 0; this
/// mirrors the trading rules this bot has always run with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DcaStrategy;

impl Strategy for DcaStrategy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let price = ctx.snapshot.current_price;

        let Some(last) = ctx.positions.last() else {
            tracing::debug!("🔍 DCA: no open position, seeding");
            return Decision::Buy(price);
        };

        let scale_in_price = last.entry_price * (Decimal::ONE - ctx.config.drop_threshold);
        let take_profit_price = last.entry_price * (Decimal::ONE + ctx.config.profit_threshold);

        tracing::debug!(
            "🔍 DCA: price={} last_entry={} scale_in<={} take_profit>={}",
            price,
            last.entry_price,
            scale_in_price,
            take_profit_price
        );

        // Buy is evaluated first and wins if both conditions hold
        if price <= scale_in_price {
            return Decision::Buy(price);
        }
        if price >= take_profit_price {
            return Decision::SellAt(0, price);
        }

        Decision::Hold
    }

    fn name(&self) -> &str {
        "DCA"
    }
}
