//! Typed exchange configuration loaded from a plain `key=value` file
//! (spec.md §6, §8).

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    Io { message: String },
    MissingKey { key: &'static str },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { message } => write!(f, "config I/O error: {message}"),
            ConfigError::MissingKey { key } => write!(f, "missing required config key: {key}"),
            ConfigError::InvalidValue { key, value } => write!(f, "invalid value for {key}: {value}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Exchange startup configuration (spec.md §6: ports, timeouts, the
/// multicast market-data address, and where the trade log lives).
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub tcp_port: u16,
    pub control_port: u16,
    pub socket_timeout_ms: u64,
    pub multicast_address: String,
    pub multicast_port: u16,
    pub trade_log_path: String,
}

fn parse_kv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

fn required<'a>(map: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, ConfigError> {
    map.get(key).map(String::as_str).ok_or(ConfigError::MissingKey { key })
}

fn parse_u16(map: &HashMap<String, String>, key: &'static str) -> Result<u16, ConfigError> {
    required(map, key)?.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: map[key].clone(),
    })
}

fn parse_u64(map: &HashMap<String, String>, key: &'static str) -> Result<u64, ConfigError> {
    required(map, key)?.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: map[key].clone(),
    })
}

impl ExchangeConfig {
    /// Load configuration from a `key=value` file, one entry per line,
    /// `#` starting a comment. Fails fast on any missing or
    /// non-numeric required key rather than silently defaulting.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io { message: e.to_string() })?;
        let map = parse_kv(&contents);

        Ok(Self {
            tcp_port: parse_u16(&map, "tcp.port")?,
            control_port: parse_u16(&map, "control.port")?,
            socket_timeout_ms: parse_u64(&map, "socket.timeout_ms")?,
            multicast_address: required(&map, "multicast.address")?.to_string(),
            multicast_port: parse_u16(&map, "multicast.port")?,
            trade_log_path: required(&map, "trade_log.path")?.to_string(),
        })
    }
}
