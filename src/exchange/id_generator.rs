//! IdGenerator: monotonic order-id allocator (spec.md §4.8).
//!
//! Recovered at startup from the persisted trade log so ids never
//! collide with history, then served as a lock-free fetch-and-add —
//! the same style as the teacher's `next_order_id: AtomicU64` /
//! `transaction_id_generator` counters in `book.rs`.

use std::sync::atomic::{AtomicU64, Ordering};

use super::trade_log::TradeLog;

/// Safe fallback starting point when the trade log cannot be scanned
/// (spec.md §4.8: "initialize to a safe high value").
pub const RECOVERY_FALLBACK_START: u64 = 10_000;

pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Scan `log` for the maximum persisted order id and resume after
    /// it. An empty log starts numbering at 1.
    pub fn recover(log: &TradeLog) -> Self {
        let next = match log.max_order_id() {
            Some(max) => max.saturating_add(1),
            None => 1,
        };
        Self {
            next: AtomicU64::new(next),
        }
    }

    /// Used when the trade log could not be opened/scanned at all;
    /// the caller has already surfaced the underlying error.
    pub fn fallback() -> Self {
        Self {
            next: AtomicU64::new(RECOVERY_FALLBACK_START),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::order::{OrderKind, Side};
    use crate::exchange::trade_log::TradeRecord;
    use crate::exchange::order::OrderId;

    #[test]
    fn empty_log_starts_at_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = TradeLog::open(dir.path().join("t.json")).expect("open");
        let r#gen = IdGenerator::recover(&log);
        assert_eq!(r#gen.next(), 1);
        assert_eq!(r#gen.next(), 2);
    }

    #[test]
    fn resumes_after_max_persisted_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = TradeLog::open(dir.path().join("t.json")).expect("open");
        log.append(
            TradeRecord {
                order_id: OrderId(41),
                side: Side::Bid,
                order_type: OrderKind::Limit,
                size: 1,
                price: 1,
                timestamp: 0,
            },
            TradeRecord {
                order_id: OrderId(42),
                side: Side::Ask,
                order_type: OrderKind::Limit,
                size: 1,
                price: 1,
                timestamp: 0,
            },
        );
        let r#gen = IdGenerator::recover(&log);
        assert_eq!(r#gen.next(), 43);
    }

    #[test]
    fn fallback_starts_high() {
        let r#gen = IdGenerator::fallback();
        assert_eq!(r#gen.next(), RECOVERY_FALLBACK_START);
    }
}
