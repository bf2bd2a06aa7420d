//! Wire protocol: line-delimited JSON request/response/notification
//! envelopes exchanged over the TCP connection (spec.md §6).

use serde::{Deserialize, Serialize};

use crate::exchange::{DailyBar, ExchangeError, Notification, OrderId, PriceHistoryReport, Side};

/// A code of `0` indicates success; all other codes map 1:1 onto
/// [`ExchangeError::response_code`].
pub const SUCCESS_CODE: u32 = 0;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    Login { username: String, password: String },
    Logout,
    UpdateCredentials { old_password: String, new_password: String },
    InsertLimitOrder { side: Side, size: i64, price: i64 },
    InsertMarketOrder { side: Side, size: i64 },
    InsertStopOrder { side: Side, size: i64, stop_price: i64 },
    CancelOrder { order_id: u64 },
    GetPriceHistory { month: String },
    RegisterPriceAlert { threshold: i64 },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBarWire {
    pub date: String,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
    pub trades_count: i64,
    pub bid_trades: i64,
    pub ask_trades: i64,
}

impl From<&DailyBar> for DailyBarWire {
    fn from(bar: &DailyBar) -> Self {
        Self {
            date: bar.date.format("%Y-%m-%d").to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            trades_count: bar.trades_count,
            bid_trades: bar.bid_trades,
            ask_trades: bar.ask_trades,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MulticastInfo {
    pub multicast_address: String,
    pub multicast_port: u16,
    pub active_users: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Response {
    Accepted { order_id: Option<u64> },
    AlertRegistered { multicast_info: MulticastInfo },
    PriceHistory {
        month: String,
        total_days: i64,
        total_trades: i64,
        bars: Vec<DailyBarWire>,
    },
    Error { code: u32, message: String },
}

impl Response {
    pub fn order_accepted(order_id: OrderId) -> Self {
        Response::Accepted { order_id: Some(order_id.0) }
    }

    pub fn accepted() -> Self {
        Response::Accepted { order_id: None }
    }

    pub fn alert_registered(multicast_address: impl Into<String>, multicast_port: u16, active_users: usize) -> Self {
        Response::AlertRegistered {
            multicast_info: MulticastInfo {
                multicast_address: multicast_address.into(),
                multicast_port,
                active_users,
            },
        }
    }

    pub fn price_history(report: &PriceHistoryReport) -> Self {
        Response::PriceHistory {
            month: report.month.clone(),
            total_days: report.total_days,
            total_trades: report.total_trades,
            bars: report.bars.iter().map(DailyBarWire::from).collect(),
        }
    }
}

impl From<&ExchangeError> for Response {
    fn from(error: &ExchangeError) -> Self {
        Response::Error {
            code: error.response_code(),
            message: error.to_string(),
        }
    }
}

/// An asynchronously-delivered push: a fill on the user's own order, or
/// a group price alert firing (spec.md §4.5 steps 2-3). Distinct from
/// [`Response`], which only ever answers the request that caused it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum WireNotification {
    Fill {
        order_id: u64,
        side: Side,
        order_kind: crate::exchange::OrderKind,
        filled_size: i64,
        execution_price: i64,
        remaining_size: i64,
        counterparty: String,
        timestamp: i64,
    },
    PriceAlert {
        username: String,
        threshold_price: i64,
        current_price: i64,
        message: String,
        timestamp: i64,
    },
}

impl From<Notification> for WireNotification {
    fn from(notification: Notification) -> Self {
        match notification {
            Notification::Fill {
                order_id,
                side,
                order_kind,
                filled_size,
                execution_price,
                remaining_size,
                counterparty,
                timestamp,
            } => WireNotification::Fill {
                order_id: order_id.0,
                side,
                order_kind,
                filled_size,
                execution_price,
                remaining_size,
                counterparty,
                timestamp,
            },
            Notification::PriceAlert {
                username,
                threshold_price,
                current_price,
                timestamp,
            } => WireNotification::PriceAlert {
                message: format!("price threshold {threshold_price} reached (current {current_price})"),
                username,
                threshold_price,
                current_price,
                timestamp,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_limit_order() {
        let json = r#"{"op":"insertLimitOrder","side":"bid","size":1000,"price":58000000}"#;
        let request: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(
            request,
            Request::InsertLimitOrder {
                side: Side::Bid,
                size: 1000,
                price: 58_000_000
            }
        ));
    }

    #[test]
    fn error_response_carries_code() {
        let error = ExchangeError::OrderNotFound { order_id: OrderId(7) };
        let response = Response::from(&error);
        assert!(matches!(response, Response::Error { code: 101, .. }));
    }
}
