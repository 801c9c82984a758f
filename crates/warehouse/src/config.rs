use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::{Context, Result};
use warehouse_core::db::DEFAULT_MAX_CONNECTIONS;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl ServerConfig {
    /// Reads the server settings from the environment, after loading `.env`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = database_url()?;

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
            Err(_) => DEFAULT_PORT,
        };

        let host = match env::var("WAREHOUSE_BIND_ADDR") {
            Ok(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .with_context(|| format!("WAREHOUSE_BIND_ADDR must be an IP address, got '{raw}'"))?,
            Err(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let max_connections = match env::var("WAREHOUSE_DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.trim().parse::<u32>().with_context(|| {
                format!("WAREHOUSE_DB_MAX_CONNECTIONS must be a positive integer, got '{raw}'")
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            bind_addr: SocketAddr::new(host, port),
            max_connections,
        })
    }
}

pub fn database_url() -> Result<String> {
    env::var("DATABASE_URL")
        .or_else(|_| env::var("WAREHOUSE_DATABASE_URL"))
        .context("DATABASE_URL (or WAREHOUSE_DATABASE_URL) must be set")
}
