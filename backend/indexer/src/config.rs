//! Application configuration loaded from environment variables.

use crate::errors::{IndexerError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Soroban RPC endpoint (e.g. https://soroban-testnet.stellar.org)
    pub rpc_url: String,
    /// The supply-chain registry contract address (Strkey format)
    pub contract_id: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the RPC for new events
    pub poll_interval_secs: u64,
    /// Maximum number of events to fetch per RPC request
    pub events_per_page: u32,
    /// Ledger to start from if no cursor is saved
    pub start_ledger: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, applying defaults for
    /// every optional setting.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            rpc_url: var("RPC_URL", "https://soroban-testnet.stellar.org"),
            contract_id: lookup("CONTRACT_ID").ok_or_else(|| {
                IndexerError::Config("CONTRACT_ID environment variable is required".to_string())
            })?,
            database_url: var("DATABASE_URL", "sqlite:./supply_chain_events.db"),
            api_port: parse(&var("API_PORT", "3001"), "API_PORT")?,
            poll_interval_secs: parse(&var("POLL_INTERVAL_SECS", "5"), "POLL_INTERVAL_SECS")?,
            events_per_page: parse(&var("EVENTS_PER_PAGE", "100"), "EVENTS_PER_PAGE")?,
            start_ledger: parse(&var("START_LEDGER", "0"), "START_LEDGER")?,
        })
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| IndexerError::Config(format!("Invalid {key}: {raw:?}")))
}
