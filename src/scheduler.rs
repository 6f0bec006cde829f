use crate::api::ExchangeGateway;
use crate::config::{BotConfig, MaintenanceWindow, StrategyConfig};
use crate::execution::{OrderExecutor, TradingContext};
use crate::models::{BalanceState, ExecutionReport, MarketSnapshot};
use crate::persistence::PersistenceStore;
use crate::strategy::StrategyEngine;
use crate::{with_timeout, Result};
use chrono::{Local, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

/// What a single tick ended with
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Traded(ExecutionReport),
    Held,
    /// Inside the maintenance window, nothing fetched
    Paused,
}

/// Timing and market-data settings for the loop
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub loop_interval: Duration,
    pub post_trade_delay: Duration,
    pub request_timeout: Duration,
    pub candle_interval: String,
    pub maintenance_window: Option<MaintenanceWindow>,
    pub maintenance_pause: Duration,
    pub base_asset: String,
    pub quote_asset: String,
}

impl SchedulerSettings {
    pub fn from_config(config: &BotConfig) -> Self {
        let (base_asset, quote_asset) = config.assets();
        Self {
            loop_interval: Duration::from_secs(config.loop_interval_seconds),
            post_trade_delay: Duration::from_secs(config.post_trade_delay_seconds),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
            candle_interval: config.candle_interval.clone(),
            maintenance_window: config.maintenance_window,
            maintenance_pause: Duration::from_secs(config.maintenance_pause_seconds),
            base_asset,
            quote_asset,
        }
    }
}

/// Periodic trading loop
///
/// Each tick: snapshot -> refresh balances -> decide -> execute -> report.
/// Ticks never overlap and cancellation is only observed between ticks.
pub struct SchedulerLoop {
    gateway: Arc<dyn ExchangeGateway>,
    store: Arc<dyn PersistenceStore>,
    engine: StrategyEngine,
    executor: OrderExecutor,
    context: TradingContext,
    config: StrategyConfig,
    settings: SchedulerSettings,
    state: RunState,
}

impl SchedulerLoop {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        store: Arc<dyn PersistenceStore>,
        context: TradingContext,
        config: StrategyConfig,
        settings: SchedulerSettings,
    ) -> Self {
        let engine = StrategyEngine::from_config(&config);
        let executor = OrderExecutor::new(gateway.clone(), store.clone(), settings.request_timeout);

        Self {
            gateway,
            store,
            engine,
            executor,
            context,
            config,
            settings,
            state: RunState::Stopped,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn context(&self) -> &TradingContext {
        &self.context
    }

    pub fn strategy_name(&self) -> &str {
        self.engine.name()
    }

    /// Run until `shutdown` flips to true or a fatal error occurs
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.state = RunState::Running;
        tracing::info!(
            "▶️  Trading loop started ({} strategy, every {}s)",
            self.engine.name(),
            self.settings.loop_interval.as_secs()
        );

        while !*shutdown.borrow() {
            let delay = match self.tick().await {
                Ok(TickOutcome::Traded(_)) => self.settings.loop_interval + self.settings.post_trade_delay,
                Ok(TickOutcome::Held) => self.settings.loop_interval,
                Ok(TickOutcome::Paused) => self.settings.maintenance_pause,
                Err(e) if e.is_fatal() => {
                    tracing::error!("❌ Fatal error, stopping: {}", e);
                    self.stop().await;
                    return Err(e);
                }
                Err(e) if e.is_rejection() => {
                    tracing::warn!("⚠️  Decision rejected: {}", e);
                    self.settings.loop_interval
                }
                Err(e) => {
                    tracing::warn!("⚠️  Tick aborted: {}", e);
                    self.settings.loop_interval
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Sender gone: nobody can stop us cleanly any more
                        break;
                    }
                }
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Run one full tick
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        if self.in_maintenance(Local::now().time()) {
            tracing::info!("🌙 Inside maintenance window, skipping tick");
            return Ok(TickOutcome::Paused);
        }

        let snapshot = self.fetch_snapshot().await?;
        self.refresh_balances().await?;

        let positions = self.context.positions();
        let balances = self.context.balances();
        let decision = self
            .engine
            .decide(&snapshot, &positions, &balances, &self.config);
        tracing::debug!("Decision: {:?}", decision);

        let result = self
            .executor
            .execute(&mut self.context, decision, &self.config)
            .await;

        self.report_status(&snapshot);

        match result? {
            Some(report) => Ok(TickOutcome::Traded(report)),
            None => Ok(TickOutcome::Held),
        }
    }

    fn in_maintenance(&self, now: NaiveTime) -> bool {
        self.settings
            .maintenance_window
            .map(|window| window.contains(now))
            .unwrap_or(false)
    }

    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let pair = &self.config.trade_pair;
        let timeout = self.settings.request_timeout;

        let price = with_timeout("fetch price", timeout, self.gateway.get_price(pair)).await?;
        let mut snapshot = MarketSnapshot::new(price);

        let required = self.engine.candles_required();
        if required > 0 {
            let closes = with_timeout(
                "fetch candles",
                timeout,
                self.gateway
                    .get_candles(pair, &self.settings.candle_interval, required),
            )
            .await?;
            snapshot = snapshot.with_closes(closes);
        }

        Ok(snapshot)
    }

    /// Reload balances from the exchange account or the simulated store
    async fn refresh_balances(&mut self) -> Result<()> {
        let timeout = self.settings.request_timeout;

        let balances = if self.config.simulated {
            if self.executor.has_unsaved_state() {
                tracing::debug!("Unsaved state pending, keeping in-memory balances");
                return Ok(());
            }
            with_timeout(
                "load simulated balances",
                timeout,
                self.store.load_simulated_balances(),
            )
            .await?
        } else {
            let account = with_timeout(
                "fetch account balances",
                timeout,
                self.gateway.get_account_balances(),
            )
            .await?;
            BalanceState::new(
                account
                    .get(&self.settings.quote_asset)
                    .copied()
                    .unwrap_or_default(),
                account
                    .get(&self.settings.base_asset)
                    .copied()
                    .unwrap_or_default(),
            )
        };

        self.context.ledger.restore(balances);
        Ok(())
    }

    fn report_status(&self, snapshot: &MarketSnapshot) {
        let balances = self.context.balances();
        tracing::info!(
            "📊 {} {} | {} {} | price {} | open positions {} | unrealized P&L {}",
            balances.fiat_balance,
            self.settings.quote_asset,
            balances.crypto_balance,
            self.settings.base_asset,
            snapshot.current_price,
            self.context.queue.len(),
            self.context.unrealized_pnl(snapshot.current_price).round_dp(8)
        );
    }

    /// Best-effort final save, then mark the loop stopped
    async fn stop(&mut self) {
        if let Err(e) = self
            .executor
            .flush(&self.context, self.config.simulated)
            .await
        {
            tracing::warn!("⚠️  Final save failed: {}", e);
        }
        self.state = RunState::Stopped;
        tracing::info!("🛑 Bot stopped");
    }
}
