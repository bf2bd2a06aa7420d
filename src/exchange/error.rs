//! Exchange core error types.

use std::fmt;

use super::order::{OrderId, Side};

/// Errors raised by the matching engine and order lifecycle manager.
///
/// These map deterministically onto the wire response codes in
/// `spec.md` §6–§7 via [`ExchangeError::response_code`]; they never
/// cross the `order_service` facade boundary as panics or unwinds.
#[derive(Debug)]
#[non_exhaustive]
pub enum ExchangeError {
    /// `side` was neither bid nor ask, or a kind-specific field was
    /// missing (e.g. no limit price on a limit order).
    MalformedRequest { message: String },

    /// Size or price was not strictly positive.
    NonPositiveValue { field: &'static str, value: i64 },

    /// A stop order's `stop_price` was on the wrong side of the
    /// current market price (spec.md §4.3).
    InvalidStopPrice {
        side: Side,
        stop_price: i64,
        market_price: i64,
    },

    /// `cancel` referenced an id with no live order.
    OrderNotFound { order_id: OrderId },

    /// `cancel` was attempted by a user other than the order's owner.
    NotOwner { order_id: OrderId, requester: String },

    /// `cancel` targeted an order that already executed fully or is a
    /// market order (spec.md §4.4: market orders are never cancellable).
    NotCancellable { order_id: OrderId },

    /// `registerPriceAlert` threshold was at or below the current
    /// market price.
    ThresholdNotAboveMarket { threshold: i64, market_price: i64 },

    /// `getPriceHistory` month argument was not a valid `MMYYYY` string.
    InvalidMonth { input: String },
}

impl ExchangeError {
    /// The wire response code this error maps to (spec.md §6).
    pub fn response_code(&self) -> u32 {
        match self {
            ExchangeError::MalformedRequest { .. } => 103,
            ExchangeError::InvalidMonth { .. } => 103,
            ExchangeError::NotOwner { .. } => 101,
            ExchangeError::OrderNotFound { .. } => 101,
            ExchangeError::NotCancellable { .. } => 101,
            ExchangeError::NonPositiveValue { .. } => 101,
            ExchangeError::InvalidStopPrice { .. } => 101,
            ExchangeError::ThresholdNotAboveMarket { .. } => 101,
        }
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::MalformedRequest { message } => {
                write!(f, "malformed request: {message}")
            }
            ExchangeError::NonPositiveValue { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            ExchangeError::InvalidStopPrice {
                side,
                stop_price,
                market_price,
            } => write!(
                f,
                "invalid stop price for {side} stop: {stop_price} relative to market {market_price}"
            ),
            ExchangeError::OrderNotFound { order_id } => {
                write!(f, "order not found: {order_id}")
            }
            ExchangeError::NotOwner {
                order_id,
                requester,
            } => write!(f, "order {order_id} is not owned by {requester}"),
            ExchangeError::NotCancellable { order_id } => {
                write!(f, "order {order_id} is not cancellable")
            }
            ExchangeError::ThresholdNotAboveMarket {
                threshold,
                market_price,
            } => write!(
                f,
                "threshold {threshold} is not above market price {market_price}"
            ),
            ExchangeError::InvalidMonth { input } => {
                write!(f, "invalid month argument: {input}")
            }
        }
    }
}

impl std::error::Error for ExchangeError {}
