//! Configuration for the takwatch runtime.
//!
//! Every tunable has a compile-time default and can be overridden through an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

/// Default reconnect delay (in milliseconds).
const DEFAULT_RETRY_MS: u64 = 2000;

/// Default delay between snapshot requests in polling mode (in milliseconds).
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// How updates are fetched from the broadcast server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    /// Follow the server-sent event stream.
    Sse,
    /// Re-fetch full snapshots on an interval.
    Poll,
}

/// Get the broadcast URL.
///
/// Priority:
/// 1. `TAKWATCH_URL` env variable if set
/// 2. The public Racetrack broadcast as fallback
pub fn get_url() -> String {
    std::env::var("TAKWATCH_URL").unwrap_or_else(|_| racetrack_client::DEFAULT_URL.to_string())
}

/// Get the transport kind.
///
/// Priority:
/// 1. `TAKWATCH_TRANSPORT` env variable if set to `sse` or `poll`
/// 2. `sse` as fallback
pub fn get_transport() -> TransportKind {
    std::env::var("TAKWATCH_TRANSPORT")
        .ok()
        .and_then(|value| parse_transport(&value))
        .unwrap_or(TransportKind::Sse)
}

fn parse_transport(value: &str) -> Option<TransportKind> {
    TransportKind::from_str(value.trim(), true).ok()
}

/// Get the reconnect delay.
///
/// Priority:
/// 1. `TAKWATCH_RETRY_MS` env variable if set (falls back to the default if
///    the value cannot be parsed as a `u64`)
/// 2. `2000` ms as fallback
pub fn get_retry_delay() -> Duration {
    Duration::from_millis(millis_from(
        std::env::var("TAKWATCH_RETRY_MS").ok(),
        DEFAULT_RETRY_MS,
    ))
}

/// Get the polling interval.
///
/// Priority:
/// 1. `TAKWATCH_POLL_INTERVAL_MS` env variable if set (falls back to the
///    default if the value cannot be parsed as a `u64`)
/// 2. `1000` ms as fallback
pub fn get_poll_interval() -> Duration {
    Duration::from_millis(millis_from(
        std::env::var("TAKWATCH_POLL_INTERVAL_MS").ok(),
        DEFAULT_POLL_INTERVAL_MS,
    ))
}

fn millis_from(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Get the preference file path.
///
/// Priority:
/// 1. `TAKWATCH_PREFS_PATH` env variable if set
/// 2. `~/.takwatch/preferences.json` as fallback
pub fn get_prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var("TAKWATCH_PREFS_PATH") {
        return PathBuf::from(path);
    }

    default_data_dir().join("preferences.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".takwatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_url() {
        let url = get_url();
        match std::env::var("TAKWATCH_URL") {
            Ok(val) => assert_eq!(url, val),
            Err(_) => assert_eq!(url, "https://racetrack.mortenlohne.no/0/sse"),
        }
    }

    #[test]
    fn test_get_prefs_path() {
        let path = get_prefs_path();
        match std::env::var("TAKWATCH_PREFS_PATH") {
            Ok(val) => assert_eq!(path, PathBuf::from(val)),
            Err(_) => assert!(path.ends_with(".takwatch/preferences.json")),
        }
    }

    #[test]
    fn test_parse_transport() {
        assert_eq!(parse_transport("sse"), Some(TransportKind::Sse));
        assert_eq!(parse_transport(" POLL "), Some(TransportKind::Poll));
        assert_eq!(parse_transport("websocket"), None);
    }

    #[test]
    fn test_millis_from() {
        assert_eq!(millis_from(None, DEFAULT_RETRY_MS), 2000);
        assert_eq!(millis_from(Some("500".to_string()), DEFAULT_RETRY_MS), 500);
        assert_eq!(millis_from(Some("soon".to_string()), DEFAULT_RETRY_MS), 2000);
    }

    #[test]
    fn test_get_retry_delay_default() {
        if std::env::var("TAKWATCH_RETRY_MS").is_err() {
            assert_eq!(get_retry_delay(), Duration::from_millis(DEFAULT_RETRY_MS));
        }
    }

    #[test]
    fn test_get_poll_interval_default() {
        if std::env::var("TAKWATCH_POLL_INTERVAL_MS").is_err() {
            assert_eq!(
                get_poll_interval(),
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
        }
    }
}
