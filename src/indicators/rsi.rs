use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Calculate Relative Strength Index (RSI)
///
/// Uses simple averages of gains and losses over the trailing `period`
/// price changes, so `period + 1` prices are required.
///
/// Values:
/// - RSI >= 70: Overbought
/// - RSI <= 30: Oversold
///
/// Always within [0, 100]. A window with no losses is 100.
pub fn calculate_rsi(prices: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - (period + 1)..];

    let mut total_gain = Decimal::ZERO;
    let mut total_loss = Decimal::ZERO;

    for pair in window.windows(2) {
        let change = pair[1].saturating_sub(pair[0]);
        if change > Decimal::ZERO {
            total_gain = total_gain.saturating_add(change);
        } else {
            total_loss = total_loss.saturating_add(change.abs());
        }
    }

    let periods = Decimal::from(period);
    let avg_gain = total_gain / periods;
    let avg_loss = total_loss / periods;

    if avg_loss.is_zero() {
        return Some(dec!(100));
    }

    // 100 - 100 / (1 + gain/loss), rearranged so the ratio stays within [0, 1]
    let total = avg_gain.saturating_add(avg_loss);
    let rsi = avg_gain / total * dec!(100);

    Some(rsi.max(Decimal::ZERO).min(dec!(100)))
}
