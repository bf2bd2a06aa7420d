//! TCP acceptor and per-connection session loop (spec.md §5, §6).
//!
//! Each accepted connection gets its own tokio task holding a clone of
//! the shared `Arc<Exchange>` handle and `Arc<dyn AccountService>`.
//! Requests are line-delimited JSON; a background `select!` arm pushes
//! fill/alert notifications to the same connection as they arrive.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::accounts::AccountService;
use crate::config::ExchangeConfig;
use crate::exchange::{Exchange, Notification, OrderId};
use crate::protocol::{Request, Response, WireNotification};

const NOT_LOGGED_IN_CODE: u32 = 101;
const ALREADY_LOGGED_IN_CODE: u32 = 102;
const CREDENTIAL_UPDATE_ERROR_CODE: u32 = 105;

/// Bind `config.tcp_port` and accept connections until the process is
/// asked to shut down (Ctrl-C / SIGTERM).
pub async fn run(exchange: Arc<Exchange>, accounts: Arc<dyn AccountService>, config: &ExchangeConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", config.tcp_port)).await?;
    info!(port = config.tcp_port, "exchange listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let exchange = exchange.clone();
                let accounts = accounts.clone();
                let config = config.clone();
                tokio::spawn(async move {
                    if let Err(error) = handle_connection(stream, exchange, accounts, config).await {
                        warn!(%peer, %error, "connection ended with error");
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    exchange: Arc<Exchange>,
    accounts: Arc<dyn AccountService>,
    config: ExchangeConfig,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut current_user: Option<String> = None;
    let mut notifications: Option<mpsc::UnboundedReceiver<Notification>> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break; };
                if line.trim().is_empty() {
                    continue;
                }
                let response = match serde_json::from_str::<Request>(&line) {
                    Ok(request) => {
                        handle_request(request, &exchange, &accounts, &config, &mut current_user, &mut notifications)
                    }
                    Err(e) => Response::Error {
                        code: 103,
                        message: format!("malformed request: {e}"),
                    },
                };
                write_line(&mut writer, &response).await?;
            }
            Some(notification) = recv_or_pending(&mut notifications) => {
                write_line(&mut writer, &WireNotification::from(notification)).await?;
            }
        }
    }

    if let Some(user) = current_user.take() {
        exchange.logout(&user);
    }
    Ok(())
}

async fn recv_or_pending(rx: &mut Option<mpsc::UnboundedReceiver<Notification>>) -> Option<Notification> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn handle_request(
    request: Request,
    exchange: &Arc<Exchange>,
    accounts: &Arc<dyn AccountService>,
    config: &ExchangeConfig,
    current_user: &mut Option<String>,
    notifications: &mut Option<mpsc::UnboundedReceiver<Notification>>,
) -> Response {
    match request {
        Request::Login { username, password } => {
            if current_user.is_some() {
                return Response::Error {
                    code: ALREADY_LOGGED_IN_CODE,
                    message: "already logged in on this connection".to_string(),
                };
            }
            match accounts.authenticate(&username, &password) {
                Ok(()) => {
                    *notifications = Some(exchange.register_session(username.clone()));
                    *current_user = Some(username);
                    Response::accepted()
                }
                Err(e) => Response::Error { code: e.response_code(), message: e.to_string() },
            }
        }
        Request::Logout => {
            if let Some(user) = current_user.take() {
                exchange.logout(&user);
                *notifications = None;
            }
            Response::accepted()
        }
        Request::UpdateCredentials { old_password, new_password } => match current_user {
            Some(user) => match accounts.update_password(user, &old_password, &new_password) {
                Ok(()) => Response::accepted(),
                Err(e) => Response::Error { code: CREDENTIAL_UPDATE_ERROR_CODE, message: e.to_string() },
            },
            None => not_logged_in(),
        },
        Request::InsertLimitOrder { side, size, price } => with_user(current_user, |user| {
            result_response(exchange.insert_limit(user, side, size, price))
        }),
        Request::InsertMarketOrder { side, size } => with_user(current_user, |user| {
            result_response(exchange.insert_market(user, side, size))
        }),
        Request::InsertStopOrder { side, size, stop_price } => with_user(current_user, |user| {
            result_response(exchange.insert_stop(user, side, size, stop_price))
        }),
        Request::CancelOrder { order_id } => with_user(current_user, |user| match exchange.cancel(user, OrderId(order_id)) {
            Ok(()) => Response::accepted(),
            Err(e) => Response::from(&e),
        }),
        Request::GetPriceHistory { month } => match exchange.get_price_history(&month) {
            Ok(report) => Response::price_history(&report),
            Err(e) => Response::from(&e),
        },
        Request::RegisterPriceAlert { threshold } => with_user(current_user, |user| {
            match exchange.register_price_alert(user, threshold) {
                Ok(()) => Response::alert_registered(
                    config.multicast_address.clone(),
                    config.multicast_port,
                    exchange.active_users(),
                ),
                Err(e) => Response::from(&e),
            }
        }),
    }
}

fn not_logged_in() -> Response {
    Response::Error {
        code: NOT_LOGGED_IN_CODE,
        message: "not logged in".to_string(),
    }
}

fn with_user(current_user: &Option<String>, f: impl FnOnce(&str) -> Response) -> Response {
    match current_user {
        Some(user) => f(user),
        None => not_logged_in(),
    }
}

fn result_response(result: Result<OrderId, crate::exchange::ExchangeError>) -> Response {
    match result {
        Ok(order_id) => Response::order_accepted(order_id),
        Err(e) => Response::from(&e),
    }
}

async fn write_line(writer: &mut tokio::net::tcp::OwnedWriteHalf, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    Ok(())
}
