use std::{net::SocketAddr, str::FromStr};

use anyhow::{Context, Result};

use crate::infrastructure::sqlite_command_store::DEFAULT_FEED_CAPACITY;

/// Process settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// When set, the terminal client talks to this server instead of opening
    /// the database itself.
    pub board_server_url: Option<String>,
    pub feed_capacity: usize,
    pub board_width: u32,
    pub board_height: u32,
    /// How often a client sharing the database file directly polls for
    /// other processes' commands.
    pub board_poll_ms: u64,
    pub log_file: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Ok(Self {
            database_url: var("DATABASE_URL", "sqlite://todoboard.db"),
            bind_addr: parse("BIND_ADDR", &var("BIND_ADDR", "127.0.0.1:3000"))?,
            board_server_url: lookup("BOARD_SERVER_URL").filter(|url| !url.trim().is_empty()),
            feed_capacity: parse("FEED_CAPACITY", &var("FEED_CAPACITY", &DEFAULT_FEED_CAPACITY.to_string()))?,
            board_width: parse("BOARD_WIDTH", &var("BOARD_WIDTH", "800"))?,
            board_height: parse("BOARD_HEIGHT", &var("BOARD_HEIGHT", "600"))?,
            board_poll_ms: parse("BOARD_POLL_MS", &var("BOARD_POLL_MS", "250"))?,
            log_file: var("BOARD_LOG_FILE", "board.log"),
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse().with_context(|| format!("invalid {key}: {raw:?}"))
}
