//! Exchange: the public facade wiring every exchange component
//! together under a single matching lock (spec.md §5).

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};

use super::error::ExchangeError;
use super::id_generator::IdGenerator;
use super::market_state::MarketState;
use super::matching::{execute_market, match_limits, Fill};
use super::notify::{Notification, NotifyFanout};
use super::order::{Order, OrderId, OrderKind, Side};
use super::order_registry::OrderRegistry;
use super::price_book::PriceBook;
use super::price_history::{self, PriceHistoryReport};
use super::stop_store::StopOrderStore;
use super::trade_log::{TradeLog, TradeLogError, TradeRecord};
use crate::utils::{current_time_millis, current_time_secs};

/// The whole single-instrument exchange: one resting book, one stop
/// store, one trade log, fanned out to every connected session.
///
/// Every state-mutating operation acquires `matching_lock` for its
/// entire duration, including the trade-log append and notification
/// fan-out that happen as a side effect of matching (spec.md §5) —
/// there is no interleaving of two orders' effects on the book.
pub struct Exchange {
    matching_lock: Mutex<()>,
    book: PriceBook,
    registry: OrderRegistry,
    stops: StopOrderStore,
    market: MarketState,
    trade_log: TradeLog,
    ids: IdGenerator,
    notify: NotifyFanout,
}

fn require_positive(field: &'static str, value: i64) -> Result<(), ExchangeError> {
    if value <= 0 {
        Err(ExchangeError::NonPositiveValue { field, value })
    } else {
        Ok(())
    }
}

impl Exchange {
    /// Open (or create) the exchange backed by the trade log at
    /// `trade_log_path`, recovering the order-id counter from its
    /// history.
    pub fn open(trade_log_path: impl AsRef<Path>) -> Result<Self, TradeLogError> {
        let trade_log = TradeLog::open(trade_log_path)?;
        let ids = IdGenerator::recover(&trade_log);
        Ok(Self {
            matching_lock: Mutex::new(()),
            book: PriceBook::new(),
            registry: OrderRegistry::new(),
            stops: StopOrderStore::new(),
            market: MarketState::default(),
            trade_log,
            ids,
            notify: NotifyFanout::new(),
        })
    }

    pub fn market_price(&self) -> i64 {
        self.market.price()
    }

    /// Register `owner`'s session for unicast fill delivery.
    pub fn register_session(&self, owner: impl Into<String>) -> mpsc::UnboundedReceiver<Notification> {
        self.notify.register(owner)
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<(String, Notification)> {
        self.notify.subscribe_alerts()
    }

    /// Tear down `owner`'s session: drop its unicast queue and remove
    /// any price thresholds it registered (spec.md §3).
    pub fn logout(&self, owner: &str) {
        self.notify.unregister(owner);
        self.market.remove_user(owner);
    }

    pub fn insert_limit(&self, owner: impl Into<String>, side: Side, size: i64, price: i64) -> Result<OrderId, ExchangeError> {
        require_positive("size", size)?;
        require_positive("price", price)?;
        let owner = owner.into();

        let _guard = self.matching_lock.lock().unwrap_or_else(|e| e.into_inner());
        let order = Arc::new(Order::new(OrderId(self.ids.next()), owner, side, OrderKind::Limit, size, price, 0));
        self.registry.insert(order.clone());
        self.book.add(order.clone());

        match_limits(&self.book, |fill| self.record_trade(fill));
        if order.is_resting_exhausted() {
            self.registry.remove(order.id);
        }
        self.drain_triggered_stops();
        Ok(order.id)
    }

    pub fn insert_market(&self, owner: impl Into<String>, side: Side, size: i64) -> Result<OrderId, ExchangeError> {
        require_positive("size", size)?;
        let owner = owner.into();

        let _guard = self.matching_lock.lock().unwrap_or_else(|e| e.into_inner());
        let order = Arc::new(Order::new(OrderId(self.ids.next()), owner, side, OrderKind::Market, size, 0, 0));
        self.registry.insert(order.clone());

        // Never inserted into the book: any unfilled remainder is left
        // on `order` with no resting record (spec.md §4.2, §9). The
        // registry entry stays, so a later `cancel` finds it and reports
        // `NotCancellable` instead of `OrderNotFound`.
        execute_market(&self.book, &order, |fill| self.record_trade(fill));
        self.drain_triggered_stops();
        Ok(order.id)
    }

    pub fn insert_stop(&self, owner: impl Into<String>, side: Side, size: i64, stop_price: i64) -> Result<OrderId, ExchangeError> {
        require_positive("size", size)?;
        require_positive("stopPrice", stop_price)?;
        let owner = owner.into();

        let _guard = self.matching_lock.lock().unwrap_or_else(|e| e.into_inner());
        let market_price = self.market.price();
        let order = Arc::new(Order::new(OrderId(self.ids.next()), owner, side, OrderKind::Stop, size, 0, stop_price));
        self.stops.add(order.clone(), market_price)?;
        self.registry.insert(order.clone());
        Ok(order.id)
    }

    pub fn cancel(&self, owner: &str, order_id: OrderId) -> Result<(), ExchangeError> {
        let _guard = self.matching_lock.lock().unwrap_or_else(|e| e.into_inner());
        let order = self.registry.get(order_id).ok_or(ExchangeError::OrderNotFound { order_id })?;
        if order.owner != owner {
            return Err(ExchangeError::NotOwner {
                order_id,
                requester: owner.to_string(),
            });
        }
        if order.kind == OrderKind::Market || order.is_resting_exhausted() {
            return Err(ExchangeError::NotCancellable { order_id });
        }

        let removed = match order.kind {
            OrderKind::Limit => self.book.remove(order.side, order.limit_price, order_id).is_some(),
            OrderKind::Stop => self.stops.remove(order.side, order.stop_price, order_id).is_some(),
            OrderKind::Market => false,
        };
        if !removed {
            return Err(ExchangeError::NotCancellable { order_id });
        }
        self.registry.remove(order_id);
        Ok(())
    }

    pub fn register_price_alert(&self, owner: impl Into<String>, threshold_price: i64) -> Result<(), ExchangeError> {
        self.market.register_threshold(owner, threshold_price)
    }

    /// Number of sessions currently registered for unicast delivery,
    /// reported back to the caller of `registerPriceAlert` (spec.md §6).
    pub fn active_users(&self) -> usize {
        self.notify.active_users()
    }

    pub fn get_price_history(&self, month_year: &str) -> Result<PriceHistoryReport, ExchangeError> {
        price_history::price_history(&self.trade_log, month_year)
    }

    /// Handle one executed trade: update the market price, persist it,
    /// and notify both participants and any fired thresholds — all
    /// still under the matching lock held by the caller.
    fn record_trade(&self, fill: Fill) {
        self.market.set_price(fill.execution_price);
        let timestamp = current_time_secs();

        let bid_half = TradeRecord {
            order_id: fill.bid_order.id,
            side: Side::Bid,
            order_type: fill.bid_order.kind,
            size: fill.trade_size,
            price: fill.execution_price,
            timestamp,
        };
        let ask_half = TradeRecord {
            order_id: fill.ask_order.id,
            side: Side::Ask,
            order_type: fill.ask_order.kind,
            size: fill.trade_size,
            price: fill.execution_price,
            timestamp,
        };
        self.trade_log.append(bid_half, ask_half);

        self.notify.notify_fill(
            &fill.bid_order.owner,
            Notification::Fill {
                order_id: fill.bid_order.id,
                side: Side::Bid,
                order_kind: fill.bid_order.kind,
                filled_size: fill.trade_size,
                execution_price: fill.execution_price,
                remaining_size: fill.bid_order.remaining(),
                counterparty: fill.ask_order.owner.clone(),
                timestamp,
            },
        );
        self.notify.notify_fill(
            &fill.ask_order.owner,
            Notification::Fill {
                order_id: fill.ask_order.id,
                side: Side::Ask,
                order_kind: fill.ask_order.kind,
                filled_size: fill.trade_size,
                execution_price: fill.execution_price,
                remaining_size: fill.ask_order.remaining(),
                counterparty: fill.bid_order.owner.clone(),
                timestamp,
            },
        );

        for threshold in self.market.take_fired(fill.execution_price) {
            self.notify.broadcast_alert(
                &threshold.user,
                Notification::PriceAlert {
                    username: threshold.user.clone(),
                    threshold_price: threshold.threshold_price,
                    current_price: fill.execution_price,
                    timestamp: current_time_millis(),
                },
            );
        }
    }

    /// Drain and execute every stop order armed by the current market
    /// price, repeating until a pass triggers none (spec.md §4.5 step
    /// 4). Activating a stop can move the market price and arm
    /// further stops, so this loops rather than running once.
    fn drain_triggered_stops(&self) {
        loop {
            let triggered = self.stops.take_triggered(self.market.price());
            if triggered.is_empty() {
                break;
            }
            for order in triggered {
                self.registry.remove(order.id);
                execute_market(&self.book, &order, |fill| self.record_trade(fill));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> (tempfile::TempDir, Exchange) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trades.json");
        let exchange = Exchange::open(path).expect("open");
        (dir, exchange)
    }

    #[test]
    fn limit_orders_cross_and_update_market_price() {
        let (_dir, exchange) = exchange();
        exchange.insert_limit("bob", Side::Ask, 1000, 58_000_000).unwrap();
        exchange.insert_limit("alice", Side::Bid, 1000, 58_100_000).unwrap();

        assert_eq!(exchange.market_price(), 58_000_000);
    }

    #[test]
    fn market_order_partial_fill_is_not_cancellable() {
        let (_dir, exchange) = exchange();
        exchange.insert_limit("bob", Side::Ask, 500, 58_000_000).unwrap();
        let order_id = exchange.insert_market("alice", Side::Bid, 1000).unwrap();

        let err = exchange.cancel("alice", order_id).unwrap_err();
        assert!(matches!(err, ExchangeError::NotCancellable { .. }));
    }

    #[test]
    fn cancel_rejects_non_owner() {
        let (_dir, exchange) = exchange();
        let order_id = exchange.insert_limit("alice", Side::Bid, 1000, 57_000_000).unwrap();
        let err = exchange.cancel("mallory", order_id).unwrap_err();
        assert!(matches!(err, ExchangeError::NotOwner { .. }));
    }

    #[test]
    fn cancel_removes_resting_limit_order() {
        let (_dir, exchange) = exchange();
        let order_id = exchange.insert_limit("alice", Side::Bid, 1000, 57_000_000).unwrap();
        exchange.cancel("alice", order_id).unwrap();
        let err = exchange.cancel("alice", order_id).unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotFound { .. }));
    }

    #[test]
    fn stop_order_activates_when_market_crosses_it() {
        let (_dir, exchange) = exchange();
        // Market starts at the default 58,000,000; arm a buy stop above it.
        exchange.insert_stop("carl", Side::Bid, 500, 60_000_000).unwrap();
        exchange.insert_limit("dana", Side::Ask, 2000, 60_000_000).unwrap();

        // Trade at 60,000,000 moves the market price to the stop's trigger.
        exchange.insert_limit("eve", Side::Bid, 500, 60_000_000).unwrap();

        assert_eq!(exchange.market_price(), 60_000_000);
    }

    #[test]
    fn price_alert_rejects_threshold_below_market() {
        let (_dir, exchange) = exchange();
        let err = exchange.register_price_alert("alice", 1).unwrap_err();
        assert!(matches!(err, ExchangeError::ThresholdNotAboveMarket { .. }));
    }
}
