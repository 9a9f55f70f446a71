//! Runtime settings, read from the environment.

use std::time::Duration;
use tracing::warn;

pub const DEFAULT_AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BID_RETRIES: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `DATABASE_URL`; only the PostgreSQL backend needs it.
    pub database_url: Option<String>,
    /// `DB_MAX_CONNECTIONS`
    pub max_connections: u32,
    /// `AUCTION_INTERVAL`: how long an auction stays open when no explicit
    /// duration is given.
    pub auction_interval: Duration,
    /// `MAX_BID_RETRIES`: conditional-write retries before `BidConflict`.
    pub max_bid_retries: u32,
    /// `SWEEP_INTERVAL`: lifecycle scheduler period.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auction_interval: DEFAULT_AUCTION_INTERVAL,
            max_bid_retries: DEFAULT_MAX_BID_RETRIES,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Invalid values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`], reading variables through `var`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: var("DATABASE_URL"),
            max_connections: parse_number(
                "DB_MAX_CONNECTIONS",
                var("DB_MAX_CONNECTIONS").as_deref(),
                DEFAULT_MAX_CONNECTIONS,
            ),
            auction_interval: parse_interval(
                "AUCTION_INTERVAL",
                var("AUCTION_INTERVAL").as_deref(),
                DEFAULT_AUCTION_INTERVAL,
            ),
            max_bid_retries: parse_number(
                "MAX_BID_RETRIES",
                var("MAX_BID_RETRIES").as_deref(),
                DEFAULT_MAX_BID_RETRIES,
            ),
            sweep_interval: parse_interval(
                "SWEEP_INTERVAL",
                var("SWEEP_INTERVAL").as_deref(),
                DEFAULT_SWEEP_INTERVAL,
            ),
        }
    }
}

/// Parses a humantime duration (`2s`, `10m`, `1h 30m`). Zero, unset and
/// malformed values yield `default`.
pub fn parse_interval(name: &str, raw: Option<&str>, default: Duration) -> Duration {
    let Some(raw) = raw else {
        return default;
    };
    match humantime::parse_duration(raw.trim()) {
        Ok(d) if !d.is_zero() => d,
        Ok(_) => {
            warn!("{:<12} --> {} must be positive, using {:?}", "Config", name, default);
            default
        }
        Err(e) => {
            warn!(
                "{:<12} --> invalid {}={:?} ({}), using {:?}",
                "Config", name, raw, e, default
            );
            default
        }
    }
}

fn parse_number(name: &str, raw: Option<&str>, default: u32) -> u32 {
    match raw.map(|r| r.trim().parse::<u32>()) {
        None => default,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            warn!(
                "{:<12} --> invalid {}={:?} ({}), using {}",
                "Config", name, raw, e, default
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_defaults_when_unset() {
        let d = parse_interval("AUCTION_INTERVAL", None, DEFAULT_AUCTION_INTERVAL);
        assert_eq!(d, Duration::from_secs(300));
    }

    #[test]
    fn interval_defaults_when_invalid() {
        let d = parse_interval("AUCTION_INTERVAL", Some("invalid"), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(d, DEFAULT_AUCTION_INTERVAL);
        let d = parse_interval("AUCTION_INTERVAL", Some("0s"), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(d, DEFAULT_AUCTION_INTERVAL);
    }

    #[test]
    fn interval_uses_valid_value() {
        let d = parse_interval("AUCTION_INTERVAL", Some("10m"), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(d, Duration::from_secs(600));
        let d = parse_interval("AUCTION_INTERVAL", Some("2s"), DEFAULT_AUCTION_INTERVAL);
        assert_eq!(d, Duration::from_secs(2));
    }

    #[test]
    fn lookup_reads_every_setting() {
        let config = StoreConfig::from_lookup(|name| {
            match name {
                "DATABASE_URL" => Some("postgres://localhost/auctions"),
                "DB_MAX_CONNECTIONS" => Some("8"),
                "AUCTION_INTERVAL" => Some("20s"),
                "MAX_BID_RETRIES" => Some("3"),
                "SWEEP_INTERVAL" => Some("nonsense"),
                _ => None,
            }
            .map(str::to_owned)
        });
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/auctions"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.auction_interval, Duration::from_secs(20));
        assert_eq!(config.max_bid_retries, 3);
        assert_eq!(config.sweep_interval, DEFAULT_SWEEP_INTERVAL);
    }

    #[test]
    fn lookup_without_variables_is_default() {
        assert_eq!(StoreConfig::from_lookup(|_| None), StoreConfig::default());
    }

    #[test]
    fn numbers_fall_back_on_garbage() {
        assert_eq!(parse_number("MAX_BID_RETRIES", Some("3"), 10), 3);
        assert_eq!(parse_number("MAX_BID_RETRIES", Some("-1"), 10), 10);
        assert_eq!(parse_number("MAX_BID_RETRIES", None, 10), 10);
    }
}
