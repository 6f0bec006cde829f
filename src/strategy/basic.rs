use super::{DecisionContext, Strategy};
use crate::models::Decision;
use rust_decimal::Decimal;

/// Ladder strategy over the open-position queue
///
/// - Sells the oldest position whose target has been reached
/// - Otherwise buys when price has dropped `drop_threshold` below any entry
/// - Seeds a first buy when nothing is open
///
/// At most one action per tick; ties go to the oldest position.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStrategy;

impl Strategy for BasicStrategy {
    fn decide(&self, ctx: &DecisionContext<'_>) -> Decision {
        let price = ctx.snapshot.current_price;

        if ctx.positions.is_empty() {
            tracing::debug!("🔍 Basic: queue empty, seeding first position");
            return Decision::Buy(price);
        }

        if let Some(index) = ctx.positions.iter().position(|p| p.target_price <= price) {
            return Decision::SellAt(index, price);
        }

        let drop_factor = Decimal::ONE - ctx.config.drop_threshold;
        if ctx
            .positions
            .iter()
            .any(|p| p.entry_price * drop_factor >= price)
        {
            return Decision::Buy(price);
        }

        Decision::Hold
    }

    fn name(&self) -> &str {
        "Basic"
    }
}
