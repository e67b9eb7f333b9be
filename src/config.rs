use crate::repo::RepoRef;
use crate::series::TimestampFormat;
use chrono::FixedOffset;
use chrono::format::{Item, StrftimeItems};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "http://127.0.0.1:4000";
const DEFAULT_DATABASE_NAME: &str = "public";
const DEFAULT_FEED_SERVER_URL: &str = "http://127.0.0.1:7531";
const DEFAULT_SAMPLE_REPO: &str = "waynexia/unkai";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub feed_server_url: String,
    pub sample_repo: RepoRef,
    pub timestamp_format: TimestampFormat,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let sample_repo = RepoRef::parse(&text("SAMPLE_REPO", DEFAULT_SAMPLE_REPO))
            .or_else(|| RepoRef::parse(DEFAULT_SAMPLE_REPO))
            .unwrap_or_else(|| RepoRef {
                org: "waynexia".to_string(),
                repo: "unkai".to_string(),
            });

        let offset_minutes: i32 = parsed(&lookup, "TIMESTAMP_UTC_OFFSET_MINUTES", 0);
        let offset = FixedOffset::east_opt(offset_minutes.saturating_mul(60)).unwrap_or_else(|| {
            warn!("TIMESTAMP_UTC_OFFSET_MINUTES={offset_minutes} is out of range, using UTC");
            TimestampFormat::default().offset
        });

        let pattern = text("TIMESTAMP_FORMAT", TimestampFormat::DEFAULT_PATTERN);
        let pattern = if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            warn!("TIMESTAMP_FORMAT={pattern:?} is not a valid strftime pattern, using default");
            TimestampFormat::DEFAULT_PATTERN.to_string()
        } else {
            pattern
        };

        Self {
            port: parsed(&lookup, "PORT", DEFAULT_PORT),
            database_url: trim_url(text("DATABASE_URL", DEFAULT_DATABASE_URL)),
            database_name: text("DATABASE_NAME", DEFAULT_DATABASE_NAME),
            feed_server_url: trim_url(text("FEED_SERVER_URL", DEFAULT_FEED_SERVER_URL)),
            sample_repo,
            timestamp_format: TimestampFormat { offset, pattern },
            request_timeout: Duration::from_secs(parsed(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
        }
    }
}

fn parsed<T: FromStr + Copy>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={value:?}");
            default
        }),
        None => default,
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "http://127.0.0.1:4000");
        assert_eq!(config.database_name, "public");
        assert_eq!(config.feed_server_url, "http://127.0.0.1:7531");
        assert_eq!(config.sample_repo.to_string(), "waynexia/unkai");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.timestamp_format.pattern, TimestampFormat::DEFAULT_PATTERN);
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "https://db.example.com/"),
            ("SAMPLE_REPO", "greptimeteam/greptimedb"),
            ("TIMESTAMP_UTC_OFFSET_MINUTES", "480"),
            ("TIMESTAMP_FORMAT", "%d/%m/%Y"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url, "https://db.example.com");
        assert_eq!(config.sample_repo.table_key(), "greptimeteam-greptimedb");
        assert_eq!(config.timestamp_format.offset.local_minus_utc(), 8 * 3600);
        assert_eq!(config.timestamp_format.pattern, "%d/%m/%Y");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config(&[
            ("PORT", "not-a-port"),
            ("SAMPLE_REPO", "nope"),
            ("TIMESTAMP_UTC_OFFSET_MINUTES", "100000"),
            ("TIMESTAMP_FORMAT", "%Q"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.sample_repo.to_string(), "waynexia/unkai");
        assert_eq!(config.timestamp_format.offset.local_minus_utc(), 0);
        assert_eq!(config.timestamp_format.pattern, TimestampFormat::DEFAULT_PATTERN);
    }
}
