// Technical indicators module
// Decimal implementations of SMA, RSI and the breakout price channel

pub mod channel;
pub mod moving_average;
pub mod rsi;

pub use channel::{calculate_channel, PriceChannel};
pub use moving_average::calculate_sma;
pub use rsi::calculate_rsi;
