use crate::error::BotError;
use crate::Result;
use chrono::{NaiveTime, Timelike};
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "spotbot";
const ENV_PREFIX: &str = "SPOTBOT";

/// Quote assets recognised when splitting a pair like `BTCUSDT`
const KNOWN_QUOTES: &[&str] = &["USDT", "BUSD", "USDC", "FDUSD", "BTC", "ETH", "BNB"];

/// Decision policy selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyVariant {
    #[default]
    Basic,
    Breakout,
    Sma,
    Rsi,
    Dca,
}

impl StrategyVariant {
    /// Resolve a configured name; unknown names fall back to Basic with a warning
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "basic" => StrategyVariant::Basic,
            "breakout" => StrategyVariant::Breakout,
            "sma" | "sma-crossover" | "sma_crossover" => StrategyVariant::Sma,
            "rsi" => StrategyVariant::Rsi,
            "dca" => StrategyVariant::Dca,
            other => {
                tracing::warn!("Unknown strategy variant '{}', falling back to basic", other);
                StrategyVariant::Basic
            }
        }
    }
}

impl fmt::Display for StrategyVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyVariant::Basic => "basic",
            StrategyVariant::Breakout => "breakout",
            StrategyVariant::Sma => "sma",
            StrategyVariant::Rsi => "rsi",
            StrategyVariant::Dca => "dca",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for StrategyVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(StrategyVariant::from_name(&name))
    }
}

/// Local-time window during which no ticks are evaluated
///
/// A window whose end is before its start wraps past midnight (e.g. 22:30 - 01:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MaintenanceWindow {
    #[serde(deserialize_with = "deserialize_clock_time")]
    pub start: NaiveTime,
    #[serde(deserialize_with = "deserialize_clock_time")]
    pub end: NaiveTime,
}

impl MaintenanceWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        // Compare at minute-of-day granularity
        let t = time.hour() * 60 + time.minute();
        let start = self.start.hour() * 60 + self.start.minute();
        let end = self.end.hour() * 60 + self.end.minute();

        if start <= end {
            t >= start && t < end
        } else {
            t >= start || t < end
        }
    }
}

fn deserialize_clock_time<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_clock_time(&raw).map_err(serde::de::Error::custom)
}

/// Parse `HH:MM` or `HH:MM:SS`
pub fn parse_clock_time(raw: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("invalid time '{}': {}", raw, e))
}

/// Immutable per-run parameters handed to strategies and the executor
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub trade_pair: String,
    pub profit_threshold: Decimal,
    pub drop_threshold: Decimal,
    pub trade_amount: Decimal,
    pub budget_limit: Decimal, // 0 = disabled
    pub strategy_variant: StrategyVariant,
    pub simulated: bool,
    pub breakout_lookback: usize,
    pub sma_period: usize,
    pub rsi_period: usize,
    pub rsi_buy_level: Decimal,
    pub rsi_sell_level: Decimal,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        BotConfig::default().strategy_config()
    }
}

/// Full application configuration
///
/// Layered as: built-in defaults, optional `spotbot.toml`, then `SPOTBOT_*`
/// environment variables. CLI overrides are applied by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub trade_pair: String,
    pub base_asset: Option<String>,
    pub quote_asset: Option<String>,
    pub profit_threshold: Decimal,
    pub drop_threshold: Decimal,
    pub trade_amount: Decimal,
    pub budget_limit: Decimal,
    pub strategy_variant: StrategyVariant,
    pub simulated: bool,

    pub breakout_lookback: usize,
    pub sma_period: usize,
    pub rsi_period: usize,
    pub rsi_buy_level: Decimal,
    pub rsi_sell_level: Decimal,
    pub candle_interval: String,

    pub loop_interval_seconds: u64,
    pub post_trade_delay_seconds: u64,
    pub request_timeout_seconds: u64,
    pub maintenance_window: Option<MaintenanceWindow>,
    pub maintenance_pause_seconds: u64,

    pub initial_fiat_balance: Decimal,
    pub initial_crypto_balance: Decimal,
    pub data_dir: PathBuf,
    pub log_file: Option<PathBuf>,

    pub testnet: bool,
    pub base_url: Option<String>,
    pub max_requests_per_second: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trade_pair: "BTCUSDT".to_string(),
            base_asset: None,
            quote_asset: None,
            profit_threshold: dec!(0.005),
            drop_threshold: dec!(0.02),
            trade_amount: dec!(0.0001),
            budget_limit: Decimal::ZERO,
            strategy_variant: StrategyVariant::Basic,
            simulated: true,
            breakout_lookback: 21,
            sma_period: 30,
            rsi_period: 14,
            rsi_buy_level: dec!(30),
            rsi_sell_level: dec!(70),
            candle_interval: "1h".to_string(),
            loop_interval_seconds: 10,
            post_trade_delay_seconds: 2,
            request_timeout_seconds: 10,
            maintenance_window: None,
            maintenance_pause_seconds: 60,
            initial_fiat_balance: dec!(1000),
            initial_crypto_balance: Decimal::ZERO,
            data_dir: PathBuf::from("data"),
            log_file: None,
            testnet: true,
            base_url: None,
            max_requests_per_second: 10,
        }
    }
}

impl BotConfig {
    /// Load configuration from an optional file plus the environment
    ///
    /// When `path` is `None`, `spotbot.toml` in the working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: BotConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.trade_pair.trim().is_empty() {
            return Err(BotError::Config("trade_pair must not be empty".to_string()));
        }
        if !self.trade_pair.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BotError::Config(format!(
                "trade_pair must be an ASCII symbol like BTCUSDT, got '{}'",
                self.trade_pair
            )));
        }
        for (name, value) in [
            ("profit_threshold", self.profit_threshold),
            ("drop_threshold", self.drop_threshold),
        ] {
            if value < Decimal::ZERO || value >= Decimal::ONE {
                return Err(BotError::Config(format!(
                    "{} must be in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if self.trade_amount <= Decimal::ZERO {
            return Err(BotError::Config(format!(
                "trade_amount must be positive, got {}",
                self.trade_amount
            )));
        }
        if self.budget_limit < Decimal::ZERO {
            return Err(BotError::Config(format!(
                "budget_limit must not be negative, got {}",
                self.budget_limit
            )));
        }
        if self.breakout_lookback < 2 || self.sma_period == 0 || self.rsi_period == 0 {
            return Err(BotError::Config(
                "breakout_lookback must be >= 2 and indicator periods >= 1".to_string(),
            ));
        }
        if self.rsi_buy_level < Decimal::ZERO
            || self.rsi_sell_level > dec!(100)
            || self.rsi_buy_level >= self.rsi_sell_level
        {
            return Err(BotError::Config(format!(
                "rsi levels must satisfy 0 <= buy < sell <= 100, got {} / {}",
                self.rsi_buy_level, self.rsi_sell_level
            )));
        }
        if self.loop_interval_seconds == 0 || self.request_timeout_seconds == 0 {
            return Err(BotError::Config(
                "loop_interval_seconds and request_timeout_seconds must be >= 1".to_string(),
            ));
        }
        if self.max_requests_per_second == 0 {
            return Err(BotError::Config(
                "max_requests_per_second must be >= 1".to_string(),
            ));
        }
        if self.initial_fiat_balance < Decimal::ZERO || self.initial_crypto_balance < Decimal::ZERO {
            return Err(BotError::Config(
                "initial simulated balances must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            trade_pair: self.trade_pair.clone(),
            profit_threshold: self.profit_threshold,
            drop_threshold: self.drop_threshold,
            trade_amount: self.trade_amount,
            budget_limit: self.budget_limit,
            strategy_variant: self.strategy_variant,
            simulated: self.simulated,
            breakout_lookback: self.breakout_lookback,
            sma_period: self.sma_period,
            rsi_period: self.rsi_period,
            rsi_buy_level: self.rsi_buy_level,
            rsi_sell_level: self.rsi_sell_level,
        }
    }

    /// Base and quote assets, explicit values winning over inference from the pair
    pub fn assets(&self) -> (String, String) {
        let (base, quote) = split_pair(&self.trade_pair);
        (
            self.base_asset.clone().unwrap_or(base),
            self.quote_asset.clone().unwrap_or(quote),
        )
    }

    pub fn positions_file(&self) -> PathBuf {
        self.data_dir.join("positions.json")
    }

    pub fn balances_file(&self) -> PathBuf {
        self.data_dir.join("simulated_balances.json")
    }
}

/// Split an exchange symbol into (base, quote) using known quote suffixes
pub fn split_pair(pair: &str) -> (String, String) {
    let pair = pair.trim().to_ascii_uppercase();
    for quote in KNOWN_QUOTES {
        if let Some(base) = pair.strip_suffix(quote) {
            if !base.is_empty() {
                return (base.to_string(), quote.to_string());
            }
        }
    }
    // Unknown quote: assume a 3-letter quote currency
    let split = pair
        .char_indices()
        .rev()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(0);
    (pair[..split].to_string(), pair[split..].to_string())
}
