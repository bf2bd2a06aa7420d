//! StopOrderStore: stop orders waiting for the market to reach their
//! trigger price (spec.md §4.3).
//!
//! Kept separate from [`super::price_book::PriceBook`] because a stop
//! order is not yet a live limit/market order — it has no priority
//! among resting orders until it activates. Bucketed by price in a
//! [`crossbeam_skiplist::SkipMap`] the same way `PriceBook` buckets
//! resting orders, since the access pattern (scan every bucket at or
//! past a threshold) is the same shape.

use crossbeam_skiplist::SkipMap;
use std::sync::{Arc, Mutex};

use super::error::ExchangeError;
use super::order::{Order, OrderId, Side};

struct StopBucket {
    orders: Mutex<Vec<Arc<Order>>>,
}

impl StopBucket {
    fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, order: Arc<Order>) {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).push(order);
    }

    fn remove(&self, order_id: OrderId) -> Option<Arc<Order>> {
        let mut guard = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        let position = guard.iter().position(|o| o.id == order_id)?;
        Some(guard.remove(position))
    }

    fn take_all(&self) -> Vec<Arc<Order>> {
        std::mem::take(&mut *self.orders.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn is_empty(&self) -> bool {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

/// A buy stop (side `Bid`) triggers once the market price rises to or
/// above its stop price; a sell stop (side `Ask`) triggers once the
/// market price falls to or below its stop price.
#[derive(Default)]
pub struct StopOrderStore {
    bid_stops: SkipMap<i64, Arc<StopBucket>>,
    ask_stops: SkipMap<i64, Arc<StopBucket>>,
}

impl StopOrderStore {
    pub fn new() -> Self {
        Self {
            bid_stops: SkipMap::new(),
            ask_stops: SkipMap::new(),
        }
    }

    fn side_map(&self, side: Side) -> &SkipMap<i64, Arc<StopBucket>> {
        match side {
            Side::Bid => &self.bid_stops,
            Side::Ask => &self.ask_stops,
        }
    }

    /// Reject a stop that would trigger immediately against the
    /// current market price (spec.md §4.3: a stop must be armed, not
    /// already past its trigger).
    pub fn add(&self, order: Arc<Order>, market_price: i64) -> Result<(), ExchangeError> {
        let already_triggered = match order.side {
            Side::Bid => order.stop_price <= market_price,
            Side::Ask => order.stop_price >= market_price,
        };
        if already_triggered {
            return Err(ExchangeError::InvalidStopPrice {
                side: order.side,
                stop_price: order.stop_price,
                market_price,
            });
        }

        let map = self.side_map(order.side);
        let bucket = map
            .get_or_insert_with(order.stop_price, || Arc::new(StopBucket::new()))
            .value()
            .clone();
        bucket.push(order);
        Ok(())
    }

    pub fn remove(&self, side: Side, stop_price: i64, order_id: OrderId) -> Option<Arc<Order>> {
        let map = self.side_map(side);
        let entry = map.get(&stop_price)?;
        let removed = entry.value().remove(order_id);
        if entry.value().is_empty() {
            entry.remove();
        }
        removed
    }

    /// Drain and return every stop order whose trigger condition holds
    /// at `market_price`. Callers must re-invoke this after acting on
    /// the result, since activating these orders can move the market
    /// price again and arm further stops (spec.md §4.5 step 4).
    pub fn take_triggered(&self, market_price: i64) -> Vec<Arc<Order>> {
        let mut triggered = Vec::new();

        for entry in self.bid_stops.iter() {
            if *entry.key() > market_price {
                break;
            }
            triggered.extend(entry.value().take_all());
        }
        for entry in self.ask_stops.iter().rev() {
            if *entry.key() < market_price {
                break;
            }
            triggered.extend(entry.value().take_all());
        }

        triggered
    }
}
