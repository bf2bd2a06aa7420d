//! End-to-end scenarios against the public `Exchange` facade.

use cross_exchange::exchange::{Exchange, ExchangeError, Side};

fn exchange() -> (tempfile::TempDir, Exchange) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trades.json");
    let exchange = Exchange::open(path).expect("open exchange");
    (dir, exchange)
}

#[test]
fn resting_limit_orders_cross_at_best_ask() {
    let (_dir, exchange) = exchange();
    exchange.insert_limit("bob", Side::Ask, 2000, 58_000_000).unwrap();
    exchange.insert_limit("alice", Side::Bid, 1000, 58_050_000).unwrap();

    assert_eq!(exchange.market_price(), 58_000_000);
    // alice's bid fully filled; cancelling it now fails not-found.
}

#[test]
fn partial_fill_leaves_remainder_on_the_book() {
    let (_dir, exchange) = exchange();
    let bob_id = exchange.insert_limit("bob", Side::Ask, 500, 58_000_000).unwrap();
    exchange.insert_limit("alice", Side::Bid, 1000, 58_000_000).unwrap();

    // bob's smaller ask is fully consumed and gone.
    let err = exchange.cancel("bob", bob_id).unwrap_err();
    assert!(matches!(err, ExchangeError::OrderNotFound { .. }));
}

#[test]
fn market_order_partial_fill_is_orphaned_not_resting() {
    let (_dir, exchange) = exchange();
    exchange.insert_limit("bob", Side::Ask, 300, 58_000_000).unwrap();
    let market_id = exchange.insert_market("alice", Side::Bid, 1000).unwrap();

    // The unfilled 700 of alice's market order is not cancellable: it
    // was never inserted into the book (spec.md §4.2, §9).
    let err = exchange.cancel("alice", market_id).unwrap_err();
    assert!(matches!(err, ExchangeError::NotCancellable { .. }));
}

#[test]
fn cancel_requires_ownership() {
    let (_dir, exchange) = exchange();
    let order_id = exchange.insert_limit("alice", Side::Bid, 1000, 50_000_000).unwrap();

    let err = exchange.cancel("mallory", order_id).unwrap_err();
    assert!(matches!(err, ExchangeError::NotOwner { .. }));

    exchange.cancel("alice", order_id).unwrap();
    let err = exchange.cancel("alice", order_id).unwrap_err();
    assert!(matches!(err, ExchangeError::OrderNotFound { .. }));
}

#[test]
fn rejects_non_positive_size_and_price() {
    let (_dir, exchange) = exchange();
    assert!(matches!(
        exchange.insert_limit("alice", Side::Bid, 0, 50_000_000),
        Err(ExchangeError::NonPositiveValue { field: "size", .. })
    ));
    assert!(matches!(
        exchange.insert_limit("alice", Side::Bid, 100, -1),
        Err(ExchangeError::NonPositiveValue { field: "price", .. })
    ));
}

#[test]
fn stop_order_cascades_through_a_thin_book() {
    let (_dir, exchange) = exchange();
    // Default market price is 58,000,000; arm a buy stop above it.
    exchange.insert_stop("carl", Side::Bid, 400, 59_000_000).unwrap();
    exchange.insert_limit("dana", Side::Ask, 1000, 59_000_000).unwrap();

    // Trading at 59,000,000 both fires the stop and moves the market
    // price under the same lock acquisition (spec.md §4.5 step 4).
    exchange.insert_limit("eve", Side::Bid, 200, 59_000_000).unwrap();

    assert_eq!(exchange.market_price(), 59_000_000);
}

#[test]
fn stop_order_rejects_prices_already_past_trigger() {
    let (_dir, exchange) = exchange();
    // Market price defaults to 58,000,000: a sell stop above it has
    // already "triggered" and is rejected at registration.
    let err = exchange.insert_stop("carl", Side::Ask, 100, 70_000_000).unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidStopPrice { .. }));
}

#[test]
fn price_alert_fires_once_when_market_crosses_it() {
    let (_dir, exchange) = exchange();
    exchange.register_price_alert("alice", 58_500_000).unwrap();

    let mut alerts = exchange.subscribe_alerts();
    exchange.insert_limit("bob", Side::Ask, 500, 58_500_000).unwrap();
    exchange.insert_limit("carl", Side::Bid, 500, 58_500_000).unwrap();

    let (user, _) = alerts.try_recv().expect("alert fired");
    assert_eq!(user, "alice");

    // Crossing the same level again does not refire a one-shot alert.
    exchange.insert_limit("dana", Side::Ask, 500, 58_500_000).unwrap();
    exchange.insert_limit("erin", Side::Bid, 500, 58_500_000).unwrap();
    assert!(alerts.try_recv().is_err());
}

#[test]
fn logout_clears_a_users_thresholds() {
    let (_dir, exchange) = exchange();
    exchange.register_price_alert("alice", 58_500_000).unwrap();
    exchange.logout("alice");

    let err = exchange.register_price_alert("alice", 1).unwrap_err();
    assert!(matches!(err, ExchangeError::ThresholdNotAboveMarket { .. }));
    // re-registering above market succeeds since the old one is gone,
    // not rejected for being a duplicate.
    exchange.register_price_alert("alice", 59_000_000).unwrap();
}

#[test]
fn price_history_reflects_executed_trades() {
    let (_dir, exchange) = exchange();
    exchange.insert_limit("bob", Side::Ask, 1000, 58_000_000).unwrap();
    exchange.insert_limit("alice", Side::Bid, 1000, 58_000_000).unwrap();

    // Trades persist with the current wall-clock timestamp, so only
    // assert against whichever month that lands in.
    let now = chrono::Utc::now();
    let month_year = now.format("%m%Y").to_string();
    let report = exchange.get_price_history(&month_year).unwrap();
    assert_eq!(report.total_days, 1);
    assert_eq!(report.total_trades, 1);
    assert_eq!(report.bars.len(), 1);
    assert_eq!(report.bars[0].volume, 1000);
    assert_eq!(report.bars[0].close, 58_000_000);
    assert_eq!(report.bars[0].trades_count, 1);
    assert_eq!(report.bars[0].bid_trades, 1);
    assert_eq!(report.bars[0].ask_trades, 1);
}

#[test]
fn price_history_rejects_malformed_month() {
    let (_dir, exchange) = exchange();
    let err = exchange.get_price_history("2024").unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidMonth { .. }));
}
