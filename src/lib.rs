//! # Single-Instrument Matching Engine
//!
//! A price/time-priority continuous double-auction exchange for one
//! instrument (BTC/USD), built around a single coarse matching lock
//! rather than the fine-grained lock-free style this crate grew out
//! of. Every order — limit, market, or stop — passes through
//! [`exchange::Exchange`], the facade that owns the book, the stop
//! store, the trade log and the notification fan-out.
//!
//! ## Design Goals
//!
//! 1. **Determinism under concurrency**: a single `matching_lock`
//!    serializes every book mutation and its `onTrade` side effects,
//!    so two orders never interleave partway through a match.
//! 2. **Exact arithmetic**: prices and sizes are integer millesimi
//!    (`i64`), never floating point.
//! 3. **Durability with a simple model**: the trade log is an
//!    append-only JSON document rewritten whole on every trade. It is
//!    not the fastest possible design; it is the one that is obviously
//!    correct.
//!
//! ## Modules
//!
//! - [`exchange`]: order types, the book, matching, stop orders,
//!   persistence, and fan-out — the trading core.
//! - [`accounts`]: the out-of-scope external account service, modeled
//!   here as an in-memory trait implementation.
//! - [`config`]: typed configuration loaded from a plain `key=value`
//!   file.
//! - [`protocol`]: the wire request/response/notification envelope.
//! - [`server`]: the TCP connection acceptor and per-connection task.

pub mod accounts;
pub mod config;
pub mod exchange;
pub mod prelude;
pub mod protocol;
pub mod server;
mod utils;

pub use exchange::{DailyBar, Exchange, ExchangeError, Notification, Order, OrderId, OrderKind, PriceHistoryReport, Side};
pub use utils::current_time_millis;
