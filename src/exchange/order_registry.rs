//! OrderRegistry: the global identity map from order id to live order.
//!
//! Authoritative for "does this order still exist and who owns it"
//! (spec.md §2 item 2). Safe to read from any thread without
//! synchronization beyond what `dashmap::DashMap` already provides —
//! the teacher's `order_locations` map plays the same role in
//! `book.rs`.

use dashmap::DashMap;
use std::sync::Arc;

use super::order::{Order, OrderId};

#[derive(Default)]
pub struct OrderRegistry {
    orders: DashMap<OrderId, Arc<Order>>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    pub fn insert(&self, order: Arc<Order>) {
        self.orders.insert(order.id, order);
    }

    pub fn get(&self, order_id: OrderId) -> Option<Arc<Order>> {
        self.orders.get(&order_id).map(|e| e.value().clone())
    }

    pub fn remove(&self, order_id: OrderId) -> Option<Arc<Order>> {
        self.orders.remove(&order_id).map(|(_, v)| v)
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
