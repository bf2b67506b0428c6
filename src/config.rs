use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    /// Order backend base URL. Unset means the in-memory backend.
    pub upstream_url: Option<String>,
    pub upstream_timeout: Duration,
    /// JSON product list stocking the in-memory backend.
    pub catalog_file: Option<PathBuf>,
    /// Background refresh period. `None` disables polling.
    pub refresh_interval: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST")
            .and_then(|h| h.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let port = lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000);
        let database_url = lookup("DATABASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| "sqlite://giftbox.db?mode=rwc".to_string());
        let upstream_url = lookup("UPSTREAM_URL").filter(|u| !u.trim().is_empty());
        let upstream_timeout = lookup("UPSTREAM_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let catalog_file = lookup("CATALOG_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let refresh_interval = lookup("REFRESH_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        Self {
            host,
            port,
            database_url,
            upstream_url,
            upstream_timeout,
            catalog_file,
            refresh_interval: (refresh_interval > 0).then(|| Duration::from_secs(refresh_interval)),
        }
    }
}
