//! Re-exports the types most callers need.
//!
//! ```
//! use cross_exchange::prelude::*;
//! ```

pub use crate::accounts::{AccountError, AccountService, InMemoryAccountService};
pub use crate::config::ExchangeConfig;
pub use crate::exchange::{DailyBar, Exchange, ExchangeError, Notification, Order, OrderId, OrderKind, PriceHistoryReport, Side};
pub use crate::protocol::{Request, Response};
pub use crate::utils::current_time_millis;
