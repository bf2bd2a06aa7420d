//! PriceBook: the bid/ask ladder of FIFO queues (spec.md §4.1).
//!
//! Price levels are stored in a [`crossbeam_skiplist::SkipMap`] keyed by
//! price, giving O(log N) best-price lookups with levels always in
//! sorted order — no re-sort on every match. Every mutation here is
//! made under the engine's single matching lock (spec.md §5), so the
//! FIFO within a level is a plain `Mutex<VecDeque<_>>` rather than a
//! lock-free structure: there is never more than one writer.

use crossbeam_skiplist::SkipMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::order::{Order, OrderId, Side};

/// A single price level: a FIFO queue of resting orders sharing a price
/// and side (spec.md §3, invariant I4: earlier orders are at the head).
pub struct PriceLevel {
    pub price: i64,
    orders: Mutex<VecDeque<Arc<Order>>>,
}

impl PriceLevel {
    fn new(price: i64) -> Self {
        Self {
            price,
            orders: Mutex::new(VecDeque::new()),
        }
    }

    fn push_back(&self, order: Arc<Order>) {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).push_back(order);
    }

    fn front(&self) -> Option<Arc<Order>> {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).front().cloned()
    }

    fn pop_front_if_exhausted(&self) -> bool {
        let mut guard = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(guard.front(), Some(o) if o.is_resting_exhausted()) {
            guard.pop_front();
        }
        guard.is_empty()
    }

    fn remove_by_id(&self, order_id: OrderId) -> Option<Arc<Order>> {
        let mut guard = self.orders.lock().unwrap_or_else(|e| e.into_inner());
        let position = guard.iter().position(|o| o.id == order_id)?;
        guard.remove(position)
    }

    fn is_empty(&self) -> bool {
        self.orders.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    fn total_remaining(&self) -> i64 {
        self.orders
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|o| o.remaining())
            .sum()
    }
}

/// The two-sided order book: bids descending priority, asks ascending.
#[derive(Default)]
pub struct PriceBook {
    bids: SkipMap<i64, Arc<PriceLevel>>,
    asks: SkipMap<i64, Arc<PriceLevel>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self {
            bids: SkipMap::new(),
            asks: SkipMap::new(),
        }
    }

    fn side_map(&self, side: Side) -> &SkipMap<i64, Arc<PriceLevel>> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Append `order` to the FIFO at its limit price, creating the
    /// level if this is the first order there.
    pub fn add(&self, order: Arc<Order>) {
        let map = self.side_map(order.side);
        let price = order.limit_price;
        let level = map
            .get_or_insert_with(price, || Arc::new(PriceLevel::new(price)))
            .value()
            .clone();
        level.push_back(order);
    }

    /// Highest resting bid price, or `None` if the bid side is empty.
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.back().map(|e| *e.key())
    }

    /// Lowest resting ask price, or `None` if the ask side is empty.
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.front().map(|e| *e.key())
    }

    /// The order at the head of the best level on `side`, along with
    /// that level's price.
    pub fn peek_best(&self, side: Side) -> Option<(i64, Arc<Order>)> {
        let entry = match side {
            Side::Bid => self.bids.back(),
            Side::Ask => self.asks.front(),
        }?;
        let order = entry.value().front()?;
        Some((*entry.key(), order))
    }

    /// After reducing the remaining size of the order at the head of
    /// `(side, price)`, pop it if fully executed and drop the level if
    /// it is now empty.
    pub fn settle_head(&self, side: Side, price: i64) {
        let map = self.side_map(side);
        let Some(entry) = map.get(&price) else {
            return;
        };
        let level_empty = entry.value().pop_front_if_exhausted();
        if level_empty {
            entry.remove();
        }
    }

    /// Remove a specific order by identity (used by `cancel`).
    /// Preserves FIFO order of the remaining orders at that level.
    pub fn remove(&self, side: Side, price: i64, order_id: OrderId) -> Option<Arc<Order>> {
        let map = self.side_map(side);
        let entry = map.get(&price)?;
        let removed = entry.value().remove_by_id(order_id);
        if entry.value().is_empty() {
            entry.remove();
        }
        removed
    }

    /// Sum of `remaining` across every resting order on `side`.
    pub fn total_liquidity(&self, side: Side) -> i64 {
        self.side_map(side)
            .iter()
            .map(|e| e.value().total_remaining())
            .sum()
    }

    /// Price levels on the contra side of `side`, in the order a market
    /// order on `side` should consume them: ascending asks for a buy,
    /// descending bids for a sell.
    pub fn contra_levels(&self, side: Side) -> Vec<(i64, Arc<PriceLevel>)> {
        match side {
            Side::Bid => self.asks.iter().map(|e| (*e.key(), e.value().clone())).collect(),
            Side::Ask => {
                let mut levels: Vec<_> = self
                    .bids
                    .iter()
                    .map(|e| (*e.key(), e.value().clone()))
                    .collect();
                levels.reverse();
                levels
            }
        }
    }

    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(b), Some(a)) if b >= a)
    }
}

impl PriceLevel {
    /// The order at the head of this level, if any.
    pub fn peek_front(&self) -> Option<Arc<Order>> {
        self.front()
    }

    /// Pop the head if fully executed; returns whether the level is now empty.
    pub fn settle(&self) -> bool {
        self.pop_front_if_exhausted()
    }
}
