use rust_decimal::Decimal;

/// Highest and lowest close of a lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceChannel {
    pub top: Decimal,
    pub bottom: Decimal,
}

/// Channel over `prices`; `None` when empty
pub fn calculate_channel(prices: &[Decimal]) -> Option<PriceChannel> {
    let first = *prices.first()?;

    let channel = prices.iter().fold(
        PriceChannel {
            top: first,
            bottom: first,
        },
        |acc, &price| PriceChannel {
            top: acc.top.max(price),
            bottom: acc.bottom.min(price),
        },
    );

    Some(channel)
}
