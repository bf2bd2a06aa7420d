//! MarketState: last-traded price and the threshold-alert registry
//! (spec.md §2 item 7, §4.5 step 3).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use super::error::ExchangeError;

/// Default last-traded price before any trade has occurred (spec.md §3).
pub const DEFAULT_MARKET_PRICE: i64 = 58_000_000;

/// A one-shot group-broadcast price alert registered by a user.
#[derive(Debug, Clone)]
pub struct Threshold {
    pub user: String,
    pub threshold_price: i64,
}

pub struct MarketState {
    last_price: AtomicI64,
    thresholds: Mutex<Vec<Threshold>>,
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new(DEFAULT_MARKET_PRICE)
    }
}

impl MarketState {
    pub fn new(initial_price: i64) -> Self {
        Self {
            last_price: AtomicI64::new(initial_price),
            thresholds: Mutex::new(Vec::new()),
        }
    }

    /// Advisory read: callers outside the matching lock may see a
    /// price that is stale by at most one trade (spec.md §5).
    pub fn price(&self) -> i64 {
        self.last_price.load(Ordering::Acquire)
    }

    /// Set the last-traded price. Called only from inside the `onTrade`
    /// callback while holding the matching lock.
    pub fn set_price(&self, price: i64) {
        self.last_price.store(price, Ordering::Release);
    }

    /// Register a one-shot threshold for `user`. Rejects thresholds at
    /// or below the current market price (spec.md §4.4).
    pub fn register_threshold(&self, user: impl Into<String>, threshold_price: i64) -> Result<(), ExchangeError> {
        let market_price = self.price();
        if threshold_price <= market_price {
            return Err(ExchangeError::ThresholdNotAboveMarket {
                threshold: threshold_price,
                market_price,
            });
        }
        let mut guard = self.thresholds.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(Threshold {
            user: user.into(),
            threshold_price,
        });
        Ok(())
    }

    /// Remove and return every threshold at or below `execution_price`
    /// (one-shot semantics: a fired threshold never fires again).
    pub fn take_fired(&self, execution_price: i64) -> Vec<Threshold> {
        let mut guard = self.thresholds.lock().unwrap_or_else(|e| e.into_inner());
        let mut fired = Vec::new();
        guard.retain(|t| {
            if t.threshold_price <= execution_price {
                fired.push(t.clone());
                false
            } else {
                true
            }
        });
        fired
    }

    /// Remove all thresholds registered by `user` (spec.md §3: removed
    /// on user logout).
    pub fn remove_user(&self, user: &str) {
        let mut guard = self.thresholds.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|t| t.user != user);
    }
}
