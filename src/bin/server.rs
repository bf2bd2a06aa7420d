//! Exchange server entry point: loads config, opens the trade log,
//! and serves connections until shut down.

use std::env;
use std::sync::Arc;

use cross_exchange::accounts::InMemoryAccountService;
use cross_exchange::config::ExchangeConfig;
use cross_exchange::exchange::Exchange;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = env::args().nth(1).unwrap_or_else(|| "exchange.conf".to_string());
    let config = ExchangeConfig::load(&config_path)?;

    let exchange = Arc::new(Exchange::open(&config.trade_log_path)?);
    let accounts = Arc::new(InMemoryAccountService::new());

    cross_exchange::server::run(exchange, accounts, &config).await
}
