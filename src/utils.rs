//! Small time helpers shared across the exchange core.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole seconds since the Unix epoch (UTC).
///
/// Trade half-records are timestamped with this; it is the unit the
/// wire protocol and the persisted trade log both use.
pub fn current_time_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Current wall-clock time in milliseconds since the Unix epoch (UTC).
///
/// Used only by wire-facing events that are specified in milliseconds
/// (the threshold-alert frame).
pub fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
