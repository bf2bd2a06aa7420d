//! Core order types shared by every exchange component.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Unique, monotonically increasing identifier for an order.
///
/// Allocated by [`crate::exchange::id_generator::IdGenerator`] and
/// unique across the lifetime of the persisted trade log (invariant I3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the book an order rests on or trades against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// The side that a trade on this side executes against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// The three order kinds this engine understands (spec.md §3).
///
/// Order modification, iceberg/hidden quantities and other order
/// kinds are explicit non-goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Limit,
    Market,
    Stop,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderKind::Limit => write!(f, "limit"),
            OrderKind::Market => write!(f, "market"),
            OrderKind::Stop => write!(f, "stop"),
        }
    }
}

/// A live order.
///
/// `remaining_size` is an atomic rather than being guarded by a lock:
/// the matching engine decrements it while holding the matching lock,
/// but other components (cancellation lookups, history reporting) are
/// allowed to observe it without contending for that lock.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub owner: String,
    pub side: Side,
    pub kind: OrderKind,
    pub size: i64,
    /// Limit price for `Limit` orders; unused (0) for `Market`/`Stop`.
    pub limit_price: i64,
    /// Arming price for `Stop` orders; unused (0) otherwise.
    pub stop_price: i64,
    remaining_size: AtomicI64,
}

impl Order {
    pub fn new(
        id: OrderId,
        owner: impl Into<String>,
        side: Side,
        kind: OrderKind,
        size: i64,
        limit_price: i64,
        stop_price: i64,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            side,
            kind,
            size,
            limit_price,
            stop_price,
            remaining_size: AtomicI64::new(size),
        }
    }

    pub fn remaining(&self) -> i64 {
        self.remaining_size.load(Ordering::Acquire)
    }

    /// Reduce `remaining` by `amount`, returning the new remaining size.
    ///
    /// Callers must hold the matching lock: this is not a CAS loop, it
    /// is a single serialized writer protected by that coarser lock
    /// (spec.md §5), with `Acquire`/`Release` only so the atomic is
    /// safe to read from other threads without further synchronization.
    pub fn reduce_remaining(&self, amount: i64) -> i64 {
        let previous = self.remaining_size.load(Ordering::Acquire);
        let next = (previous - amount).max(0);
        self.remaining_size.store(next, Ordering::Release);
        next
    }

    pub fn is_resting_exhausted(&self) -> bool {
        self.remaining() <= 0
    }
}
