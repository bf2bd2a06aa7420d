//! The exchange core: order book, matching, stop orders, persistence
//! and notification fan-out for a single instrument.

pub mod error;
pub mod id_generator;
pub mod market_state;
pub mod matching;
pub mod notify;
pub mod order;
pub mod order_registry;
pub mod order_service;
pub mod price_book;
pub mod price_history;
pub mod stop_store;
pub mod trade_log;

pub use error::ExchangeError;
pub use notify::Notification;
pub use order::{Order, OrderId, OrderKind, Side};
pub use order_service::Exchange;
pub use price_history::{DailyBar, PriceHistoryReport};
