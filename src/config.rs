//! Configuration options for the ChickMate client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Backend used when nothing else is configured
pub const DEFAULT_URL: &str = "http://localhost:8080";

/// Configuration options for the ChickMate client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Value of the `X-Client-Info` header
    pub client_info: String,

    /// Where the CLI keeps its session keys
    pub session_path: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            client_info: chickmate_auth::CLIENT_INFO.to_string(),
            session_path: None,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the client info header
    pub fn with_client_info(mut self, value: &str) -> Self {
        self.client_info = value.to_string();
        self
    }

    /// Set the session file location
    pub fn with_session_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_path = Some(value.into());
        self
    }

    /// Backend URL and options from the environment (and `.env`, if present)
    ///
    /// Reads `CHICKMATE_URL`, `CHICKMATE_TIMEOUT_SECS` and
    /// `CHICKMATE_SESSION_PATH`; anything unset keeps its default.
    pub fn from_env() -> (String, Self) {
        dotenv::dotenv().ok();

        let url = env::var("CHICKMATE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let mut options = Self::default();

        if let Some(secs) = env::var("CHICKMATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Ok(path) = env::var("CHICKMATE_SESSION_PATH") {
            options.session_path = Some(PathBuf::from(path));
        }

        (url, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let options = ClientOptions::default()
            .with_request_timeout(None)
            .with_client_info("farm-kiosk/1.0")
            .with_session_path("/tmp/chickmate.json");

        assert_eq!(options.request_timeout, None);
        assert_eq!(options.client_info, "farm-kiosk/1.0");
        assert_eq!(
            options.session_path,
            Some(PathBuf::from("/tmp/chickmate.json"))
        );
    }

    #[test]
    fn defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.request_timeout, Some(Duration::from_secs(30)));
        assert!(options.client_info.starts_with("chickmate-rust/"));
        assert!(options.session_path.is_none());
    }
}
