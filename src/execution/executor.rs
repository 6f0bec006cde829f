use super::TradingContext;
use crate::api::ExchangeGateway;
use crate::config::StrategyConfig;
use crate::error::BotError;
use crate::models::{Decision, ExecutionReport, Position, TradeSide};
use crate::persistence::PersistenceStore;
use crate::{with_timeout, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Turns strategy decisions into ledger, order and queue updates
///
/// One `execute` call is a unit: if the exchange refuses or times out, the
/// tentative ledger change is reverted before the error is returned. The
/// queue is only touched after the order went through.
pub struct OrderExecutor {
    gateway: Arc<dyn ExchangeGateway>,
    store: Arc<dyn PersistenceStore>,
    call_timeout: Duration,
    unsaved: bool,
}

impl OrderExecutor {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        store: Arc<dyn PersistenceStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            store,
            call_timeout,
            unsaved: false,
        }
    }

    /// True while the last save failed and memory is ahead of the store
    pub fn has_unsaved_state(&self) -> bool {
        self.unsaved
    }

    pub async fn execute(
        &mut self,
        ctx: &mut TradingContext,
        decision: Decision,
        config: &StrategyConfig,
    ) -> Result<Option<ExecutionReport>> {
        match decision {
            Decision::Hold => Ok(None),
            Decision::Buy(price) => self.buy(ctx, price, config).await.map(Some),
            Decision::SellAt(index, price) => self.sell(ctx, index, price, config).await.map(Some),
        }
    }

    async fn buy(
        &mut self,
        ctx: &mut TradingContext,
        price: Decimal,
        config: &StrategyConfig,
    ) -> Result<ExecutionReport> {
        ensure_tradeable(price)?;

        let quantity = config.trade_amount;
        let cost = price * quantity;
        let before = ctx.ledger.snapshot();

        ctx.ledger.apply_buy(cost, quantity)?;

        let order_id = match self.submit(config, TradeSide::Buy, quantity).await {
            Ok(id) => id,
            Err(e) => {
                ctx.ledger.restore(before);
                return Err(e);
            }
        };

        let position = Position::open(price, quantity, config.profit_threshold, Utc::now());
        tracing::info!(
            "🟢 BUY {} {} @ {} (cost {}, target {}) order={}",
            quantity,
            config.trade_pair,
            price,
            cost,
            position.target_price,
            order_id
        );
        ctx.queue.append(position);

        self.persist(ctx, config.simulated).await;

        Ok(ExecutionReport {
            side: TradeSide::Buy,
            order_id,
            price,
            quantity,
            simulated: config.simulated,
        })
    }

    async fn sell(
        &mut self,
        ctx: &mut TradingContext,
        index: usize,
        price: Decimal,
        config: &StrategyConfig,
    ) -> Result<ExecutionReport> {
        ensure_tradeable(price)?;

        let position = ctx.queue.get(index)?.clone();
        let held = ctx.ledger.snapshot().crypto_balance;
        if position.amount > held {
            return Err(BotError::InsufficientHoldings {
                required: position.amount,
                available: held,
            });
        }

        let proceeds = price * position.amount;
        let before = ctx.ledger.snapshot();

        ctx.ledger.apply_sell(proceeds, position.amount)?;

        let order_id = match self.submit(config, TradeSide::Sell, position.amount).await {
            Ok(id) => id,
            Err(e) => {
                ctx.ledger.restore(before);
                return Err(e);
            }
        };

        ctx.queue.remove_at(index)?;

        let profit = (price - position.entry_price) * position.amount;
        tracing::info!(
            "🔴 SELL {} {} @ {} (entry {}, P&L {}) order={}",
            position.amount,
            config.trade_pair,
            price,
            position.entry_price,
            profit,
            order_id
        );

        self.persist(ctx, config.simulated).await;

        Ok(ExecutionReport {
            side: TradeSide::Sell,
            order_id,
            price,
            quantity: position.amount,
            simulated: config.simulated,
        })
    }

    async fn submit(&self, config: &StrategyConfig, side: TradeSide, quantity: Decimal) -> Result<String> {
        if config.simulated {
            return Ok(format!("SIM-{}", uuid::Uuid::new_v4()));
        }

        with_timeout(
            "place market order",
            self.call_timeout,
            self.gateway
                .place_market_order(&config.trade_pair, side, quantity),
        )
        .await
    }

    /// Save positions and, when simulated, balances
    ///
    /// Both saves are attempted even if the first fails.
    pub async fn flush(&mut self, ctx: &TradingContext, simulated: bool) -> Result<()> {
        let positions = ctx.queue.all();
        let saved_positions = with_timeout(
            "save positions",
            self.call_timeout,
            self.store.save_positions(&positions),
        )
        .await;

        let saved_balances = if simulated {
            let balances = ctx.ledger.snapshot();
            with_timeout(
                "save simulated balances",
                self.call_timeout,
                self.store.save_simulated_balances(&balances),
            )
            .await
        } else {
            Ok(())
        };

        let result = saved_positions.and(saved_balances);
        self.unsaved = result.is_err();
        result
    }

    async fn persist(&mut self, ctx: &TradingContext, simulated: bool) {
        if let Err(e) = self.flush(ctx, simulated).await {
            tracing::warn!(
                "⚠️  Failed to persist state, keeping in-memory state and retrying on next trade: {}",
                e
            );
        }
    }
}

fn ensure_tradeable(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(BotError::MarketDataUnavailable(format!(
            "refusing to trade at price {}",
            price
        )));
    }
    Ok(())
}
