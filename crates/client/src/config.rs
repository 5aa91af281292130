//! Environment-derived client configuration.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration of the client core.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub api_url: String,

    /// Bound on every network call (login, refresh, logout, protected
    /// calls). A call that exceeds it fails; it is never retried forever.
    pub request_timeout: Duration,

    /// Where the session snapshot is persisted. `None` selects the platform
    /// data directory.
    pub session_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: None,
        }
    }
}

impl ClientConfig {
    /// Read configuration from `LEDGERDESK_API_URL`,
    /// `LEDGERDESK_TIMEOUT_SECS` and `LEDGERDESK_SESSION_FILE`.
    pub fn from_env() -> Self {
        let api_url = std::env::var("LEDGERDESK_API_URL").unwrap_or_else(|_| {
            tracing::warn!("LEDGERDESK_API_URL not set; using dev default {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        let request_timeout = parse_timeout(std::env::var("LEDGERDESK_TIMEOUT_SECS").ok().as_deref());

        let session_file = std::env::var("LEDGERDESK_SESSION_FILE")
            .ok()
            .map(PathBuf::from);

        Self {
            api_url,
            request_timeout,
            session_file,
        }
    }
}

fn parse_timeout(raw: Option<&str>) -> Duration {
    match raw {
        None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                tracing::warn!(value = raw, "invalid LEDGERDESK_TIMEOUT_SECS; using default");
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
    }
}
