//! NotifyFanout: per-user fill notifications and group price alerts
//! (spec.md §4.5 steps 2 and 3).
//!
//! Mirrors the teacher's event-manager pattern: an unbounded
//! `tokio::sync::mpsc` channel per connected user for unicast delivery,
//! plus a `tokio::sync::broadcast` channel for the group alert fan-out,
//! so a slow reader only ever affects its own queue.

use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use super::order::{OrderId, OrderKind, Side};

/// A message pushed to a connected session.
#[derive(Debug, Clone)]
pub enum Notification {
    /// This user's order traded for `filled_size` at `execution_price`,
    /// against `counterparty` (spec.md §6's fill-notification frame).
    Fill {
        order_id: OrderId,
        side: Side,
        order_kind: OrderKind,
        filled_size: i64,
        execution_price: i64,
        remaining_size: i64,
        counterparty: String,
        timestamp: i64,
    },
    /// A registered price threshold fired; broadcast to every connected
    /// user, not just the one who registered it (spec.md §4.5 step 3).
    PriceAlert {
        username: String,
        threshold_price: i64,
        current_price: i64,
        timestamp: i64,
    },
}

const ALERT_BROADCAST_CAPACITY: usize = 256;

pub struct NotifyFanout {
    unicast: DashMap<String, mpsc::UnboundedSender<Notification>>,
    alerts: broadcast::Sender<(String, Notification)>,
}

impl Default for NotifyFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyFanout {
    pub fn new() -> Self {
        let (alerts, _rx) = broadcast::channel(ALERT_BROADCAST_CAPACITY);
        Self {
            unicast: DashMap::new(),
            alerts,
        }
    }

    /// Register a session for `user`, returning the receiver the
    /// connection task should poll for fills addressed to it.
    pub fn register(&self, user: impl Into<String>) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.unicast.insert(user.into(), tx);
        rx
    }

    /// Drop a user's unicast sender on logout/disconnect.
    pub fn unregister(&self, user: &str) {
        self.unicast.remove(user);
    }

    /// A fresh receiver for group price-alert broadcasts, independent
    /// of unicast registration.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<(String, Notification)> {
        self.alerts.subscribe()
    }

    /// Number of sessions currently registered for unicast delivery.
    pub fn active_users(&self) -> usize {
        self.unicast.len()
    }

    /// Deliver a fill notification to `user`'s queue, if connected.
    /// Silently dropped if the user has no active session: a fill that
    /// already happened is not retried through this channel.
    pub fn notify_fill(&self, user: &str, notification: Notification) {
        if let Some(sender) = self.unicast.get(user) {
            if sender.send(notification).is_err() {
                debug!(%user, "fill notification dropped: receiver gone");
            }
        }
    }

    /// Broadcast a fired threshold to every subscriber. `user` is the
    /// account that registered the threshold (spec.md's alert is
    /// delivered to the whole connected group, not just the owner).
    pub fn broadcast_alert(&self, user: &str, notification: Notification) {
        let _ = self.alerts.send((user.to_string(), notification));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unicast_delivers_to_registered_user() {
        let fanout = NotifyFanout::new();
        let mut rx = fanout.register("alice");

        fanout.notify_fill(
            "alice",
            Notification::Fill {
                order_id: OrderId(1),
                side: Side::Bid,
                order_kind: OrderKind::Limit,
                filled_size: 100,
                execution_price: 58_000_000,
                remaining_size: 0,
                counterparty: "bob".to_string(),
                timestamp: 0,
            },
        );

        let received = rx.recv().await.expect("notification");
        assert!(matches!(received, Notification::Fill { order_id: OrderId(1), .. }));
    }

    #[test]
    fn unicast_to_unknown_user_does_not_panic() {
        let fanout = NotifyFanout::new();
        fanout.notify_fill(
            "nobody",
            Notification::PriceAlert {
                username: "alice".to_string(),
                threshold_price: 60_000_000,
                current_price: 60_000_000,
                timestamp: 0,
            },
        );
    }

    #[tokio::test]
    async fn broadcast_alert_reaches_subscribers() {
        let fanout = NotifyFanout::new();
        let mut rx = fanout.subscribe_alerts();

        fanout.broadcast_alert(
            "alice",
            Notification::PriceAlert {
                username: "alice".to_string(),
                threshold_price: 60_000_000,
                current_price: 60_000_000,
                timestamp: 0,
            },
        );

        let (user, _) = rx.recv().await.expect("alert");
        assert_eq!(user, "alice");
    }
}
