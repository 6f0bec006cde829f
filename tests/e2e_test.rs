mod common;

use common::{bot, position, InMemoryStore, ScriptedExchange};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spotbot::config::{StrategyConfig, StrategyVariant};
use spotbot::models::{BalanceState, TradeSide};
use spotbot::persistence::{JsonFileStore, PersistenceStore};
use spotbot::scheduler::{RunState, TickOutcome};
use spotbot::BotError;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

fn config(variant: StrategyVariant) -> StrategyConfig {
    StrategyConfig {
        strategy_variant: variant,
        trade_amount: dec!(0.001),
        ..StrategyConfig::default()
    }
}

#[tokio::test]
async fn test_basic_sells_position_at_target() {
    let config = config(StrategyVariant::Basic);
    let balances = BalanceState::new(dec!(10), dec!(0.001));
    let store = InMemoryStore::holding(balances);
    let exchange = ScriptedExchange::at(dec!(101));
    let mut bot = bot(
        exchange,
        store.clone(),
        config.clone(),
        balances,
        vec![position(dec!(100), dec!(0.001), &config)],
    );

    let outcome = assert_ok!(bot.tick().await);

    match outcome {
        TickOutcome::Traded(report) => {
            assert_eq!(report.side, TradeSide::Sell);
            assert_eq!(report.price, dec!(101));
        }
        other => panic!("expected a sell, got {:?}", other),
    }
    assert_eq!(bot.context().balances(), BalanceState::new(dec!(10.101), dec!(0)));
    assert!(bot.context().queue.is_empty());
    assert_eq!(store.balances(), BalanceState::new(dec!(10.101), dec!(0)));
    assert!(store.positions().is_empty());
}

#[tokio::test]
async fn test_basic_buys_on_drop() {
    let config = config(StrategyVariant::Basic);
    let balances = BalanceState::new(dec!(1000), dec!(0.001));
    let store = InMemoryStore::holding(balances);
    let exchange = ScriptedExchange::at(dec!(97));
    let mut bot = bot(
        exchange,
        store.clone(),
        config.clone(),
        balances,
        vec![position(dec!(100), dec!(0.001), &config)],
    );

    assert_ok!(bot.tick().await);

    let positions = bot.context().positions();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[1].entry_price, dec!(97));
    assert_eq!(positions[1].target_price, dec!(97) * (Decimal::ONE + config.profit_threshold));
    assert_eq!(store.positions(), positions);
}

#[tokio::test]
async fn test_breakout_buys_above_channel() {
    let config = StrategyConfig {
        breakout_lookback: 5,
        ..config(StrategyVariant::Breakout)
    };
    let balances = BalanceState::new(dec!(1000), dec!(0));
    let exchange = ScriptedExchange::at(dec!(12));
    exchange.set_closes(vec![dec!(10), dec!(11), dec!(9), dec!(10.5), dec!(12)]);
    let mut bot = bot(exchange, InMemoryStore::holding(balances), config, balances, vec![]);

    match assert_ok!(bot.tick().await) {
        TickOutcome::Traded(report) => {
            assert_eq!(report.side, TradeSide::Buy);
            assert_eq!(report.price, dec!(12));
        }
        other => panic!("expected a breakout buy, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dca_budget_floor_rejects_buy() {
    let config = StrategyConfig {
        trade_amount: dec!(1),
        budget_limit: dec!(40),
        ..config(StrategyVariant::Dca)
    };
    let balances = BalanceState::new(dec!(50), dec!(0));
    let store = InMemoryStore::holding(balances);
    let mut bot = bot(ScriptedExchange::at(dec!(15)), store.clone(), config, balances, vec![]);

    let err = assert_err!(bot.tick().await);

    assert_eq!(
        err,
        BotError::BudgetLimitBreach {
            remaining: dec!(35),
            limit: dec!(40)
        }
    );
    assert!(err.is_rejection());
    assert_eq!(bot.context().balances(), balances);
    assert!(bot.context().queue.is_empty());
    assert!(store.positions().is_empty());
}

#[tokio::test]
async fn test_empty_queue_never_sells() {
    let variants = [
        StrategyVariant::Basic,
        StrategyVariant::Breakout,
        StrategyVariant::Sma,
        StrategyVariant::Rsi,
        StrategyVariant::Dca,
    ];

    for variant in variants {
        // A crash below every channel, average and RSI floor
        let closes: Vec<Decimal> = (0..40).map(|i| dec!(200) - Decimal::from(i * 4)).collect();
        let exchange = ScriptedExchange::at(dec!(44));
        exchange.set_closes(closes);
        let balances = BalanceState::new(dec!(1000), dec!(1));
        let mut bot = bot(
            exchange.clone(),
            InMemoryStore::holding(balances),
            config(variant),
            balances,
            vec![],
        );

        let outcome = bot.tick().await;

        assert!(
            !matches!(outcome, Ok(TickOutcome::Traded(ref r)) if r.side == TradeSide::Sell),
            "{} sold with no open position",
            variant
        );
        assert!(exchange.orders().iter().all(|(side, _)| *side == TradeSide::Buy));
    }
}

#[tokio::test]
async fn test_live_order_rejection_rolls_back() {
    let config = StrategyConfig {
        simulated: false,
        ..config(StrategyVariant::Basic)
    };
    let exchange = ScriptedExchange::at(dec!(100));
    exchange
        .account
        .lock()
        .unwrap()
        .insert("USDT".to_string(), dec!(1000));
    *exchange.reject_with.lock().unwrap() = Some("Filter failure: MIN_NOTIONAL".to_string());
    let store = InMemoryStore::holding(BalanceState::default());
    let mut bot = bot(exchange.clone(), store.clone(), config, BalanceState::default(), vec![]);

    let err = assert_err!(bot.tick().await);

    assert!(matches!(err, BotError::OrderRejected(_)));
    assert_eq!(bot.context().balances(), BalanceState::new(dec!(1000), dec!(0)));
    assert!(bot.context().queue.is_empty());
    assert!(store.positions().is_empty());
    assert!(exchange.orders().is_empty());
}

#[tokio::test]
async fn test_persistence_failure_keeps_trade() {
    let config = config(StrategyVariant::Basic);
    let balances = BalanceState::new(dec!(1000), dec!(0));
    let store = InMemoryStore::holding(balances);
    store.break_saves(true);
    let exchange = ScriptedExchange::at(dec!(100));
    let mut bot = bot(exchange.clone(), store.clone(), config, balances, vec![]);

    assert_ok!(bot.tick().await);
    assert_eq!(bot.context().queue.len(), 1);
    assert_eq!(bot.context().balances(), BalanceState::new(dec!(999.9), dec!(0.001)));

    // Store recovers; the next trade writes everything
    store.break_saves(false);
    exchange.set_price(dec!(97));
    assert_ok!(bot.tick().await);

    assert_eq!(store.positions().len(), 2);
    assert_eq!(store.balances(), bot.context().balances());
}

#[tokio::test]
async fn test_run_and_restart_from_json_files() {
    println!("=== Run, stop and restart against the JSON store ===\n");

    let dir = std::env::temp_dir().join(format!("spotbot-e2e-{}", uuid::Uuid::new_v4()));
    let initial = BalanceState::new(dec!(1000), dec!(0));
    let make_store = || {
        Arc::new(JsonFileStore::new(
            dir.join("positions.json"),
            dir.join("simulated_balances.json"),
            initial,
        ))
    };
    let config = config(StrategyVariant::Dca);

    // 1. First run seeds a position and is stopped via the shutdown channel
    let store = make_store();
    let balances = store.load_simulated_balances().await.unwrap();
    let mut first = bot(ScriptedExchange::at(dec!(100)), store, config.clone(), balances, vec![]);
    let (tx, rx) = watch::channel(false);
    let stopper = async {
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        tx.send(true).unwrap();
    };
    let (result, _) = tokio::join!(first.run(rx), stopper);
    assert_ok!(result);
    assert_eq!(first.state(), RunState::Stopped);
    println!("   ✓ First run opened {} position(s)", first.context().queue.len());

    // 2. Restart restores positions and balances from disk
    let store = make_store();
    let positions = store.load_positions().await.unwrap();
    let balances = store.load_simulated_balances().await.unwrap();
    assert_eq!(positions, first.context().positions());
    assert_eq!(balances, first.context().balances());
    assert_eq!(balances, BalanceState::new(dec!(999.9), dec!(0.001)));

    // 3. Price clears the DCA target, the restored position is sold
    let exchange = ScriptedExchange::at(dec!(101));
    let mut second = bot(exchange, store.clone(), config, balances, positions);
    match assert_ok!(second.tick().await) {
        TickOutcome::Traded(report) => assert_eq!(report.side, TradeSide::Sell),
        other => panic!("expected a sell after restart, got {:?}", other),
    }
    assert!(store.load_positions().await.unwrap().is_empty());
    assert_eq!(
        store.load_simulated_balances().await.unwrap(),
        BalanceState::new(dec!(1000.001), dec!(0))
    );
    println!("   ✓ Restored position sold after restart");

    std::fs::remove_dir_all(&dir).ok();
}
