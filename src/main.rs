use anyhow::Context;
use clap::Parser;
use spotbot::api::{BinanceClient, ExchangeGateway};
use spotbot::config::{BotConfig, StrategyVariant};
use spotbot::execution::{BalanceLedger, PositionQueue, TradingContext};
use spotbot::models::BalanceState;
use spotbot::persistence::{JsonFileStore, PersistenceStore};
use spotbot::scheduler::{SchedulerLoop, SchedulerSettings};
use spotbot::{with_timeout, BotError};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Spot trading bot for a single Binance pair
#[derive(Parser)]
#[command(name = "spotbot", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./spotbot.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy variant: basic, breakout, sma, rsi or dca
    #[arg(long)]
    strategy: Option<String>,

    /// Trade against the real account instead of simulated balances
    #[arg(long)]
    live: bool,

    /// Seconds between ticks
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loaded = BotConfig::load(cli.config.as_deref());
    setup_logging(loaded.as_ref().ok().and_then(|c| c.log_file.as_deref()));
    let mut config = loaded.context("Failed to load configuration")?;

    if let Some(name) = &cli.strategy {
        config.strategy_variant = StrategyVariant::from_name(name);
    }
    if cli.live {
        config.simulated = false;
    }
    if let Some(interval) = cli.interval {
        config.loop_interval_seconds = interval;
    }
    config.validate().context("Invalid configuration")?;

    let api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
    let api_secret = std::env::var("BINANCE_API_SECRET").unwrap_or_default();
    if !config.simulated && (api_key.is_empty() || api_secret.is_empty()) {
        anyhow::bail!("Live trading requires BINANCE_API_KEY and BINANCE_API_SECRET");
    }

    log_banner(&config);

    let request_timeout = Duration::from_secs(config.request_timeout_seconds);
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| BinanceClient::base_url_for(config.testnet).to_string());
    let gateway: Arc<dyn ExchangeGateway> = Arc::new(BinanceClient::new(
        base_url,
        api_key,
        api_secret,
        config.max_requests_per_second,
        request_timeout,
    )?);
    let store: Arc<dyn PersistenceStore> = Arc::new(JsonFileStore::new(
        config.positions_file(),
        config.balances_file(),
        BalanceState::new(config.initial_fiat_balance, config.initial_crypto_balance),
    ));

    let context = initialize_context(&config, gateway.as_ref(), store.as_ref(), request_timeout)
        .await
        .map_err(|e| {
            tracing::error!("❌ {}", e);
            e
        })?;

    let mut bot = SchedulerLoop::new(
        gateway,
        store,
        context,
        config.strategy_config(),
        SchedulerSettings::from_config(&config),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⚠️  Received Ctrl+C, stopping after the current tick...");
            shutdown_tx.send(true).ok();
        }
    });

    tracing::info!("Press Ctrl+C to stop...");
    bot.run(shutdown_rx).await?;

    Ok(())
}

fn setup_logging(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spotbot=info"));

    let file_layer = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(fmt::layer().with_ansi(false).with_writer(Arc::new(file))),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

fn log_banner(config: &BotConfig) {
    let (base, quote) = config.assets();

    tracing::info!("🚀 Spot bot starting");
    tracing::info!("  📈 Pair: {} ({} / {})", config.trade_pair, base, quote);
    tracing::info!(
        "  🧪 Mode: {}{}",
        if config.simulated { "SIMULATED" } else { "LIVE" },
        if config.testnet { " (testnet)" } else { "" }
    );
    tracing::info!("  🧠 Strategy: {}", config.strategy_variant);
    tracing::info!(
        "  🎯 Profit {} | Drop {} | Amount {} | Budget floor {}",
        config.profit_threshold,
        config.drop_threshold,
        config.trade_amount,
        config.budget_limit
    );
    tracing::info!(
        "  ⏱️  Every {}s (+{}s after trades)",
        config.loop_interval_seconds,
        config.post_trade_delay_seconds
    );
    if let Some(window) = config.maintenance_window {
        tracing::info!(
            "  🌙 Maintenance window: {} - {}",
            window.start.format("%H:%M"),
            window.end.format("%H:%M")
        );
    }
}

/// Restore positions and balances; any failure here is fatal
async fn initialize_context(
    config: &BotConfig,
    gateway: &dyn ExchangeGateway,
    store: &dyn PersistenceStore,
    timeout: Duration,
) -> Result<TradingContext, BotError> {
    let positions = with_timeout("load positions", timeout, store.load_positions())
        .await
        .map_err(|e| BotError::Fatal(format!("Could not load positions: {}", e)))?;

    let balances = if config.simulated {
        with_timeout(
            "load simulated balances",
            timeout,
            store.load_simulated_balances(),
        )
        .await
        .map_err(|e| BotError::Fatal(format!("Could not initialize balances: {}", e)))?
    } else {
        let (base, quote) = config.assets();
        let account = with_timeout("fetch account balances", timeout, gateway.get_account_balances())
            .await
            .map_err(|e| BotError::Fatal(format!("Could not initialize balances: {}", e)))?;
        BalanceState::new(
            account.get(&quote).copied().unwrap_or_default(),
            account.get(&base).copied().unwrap_or_default(),
        )
    };

    tracing::info!(
        "💰 Balances: {} fiat, {} crypto",
        balances.fiat_balance,
        balances.crypto_balance
    );

    Ok(TradingContext::new(
        BalanceLedger::new(balances, config.budget_limit),
        PositionQueue::with_positions(positions),
    ))
}
