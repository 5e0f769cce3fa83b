//! Transport and agent configuration.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Base URL of a locally running agent server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Application the agent is registered under.
pub const DEFAULT_APP_NAME: &str = "agent";

pub const DEFAULT_USER_ID: &str = "user";

/// HTTP transport configuration.
///
/// # Example
/// ```rust
/// use adk_client::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .with_base_url("http://127.0.0.1:8080".to_string())
///     .with_timeout(Duration::from_secs(120))
///     .with_header("X-Trace".to_string(), "1".to_string());
/// assert_eq!(options.base_url, "http://127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Bound on a whole exchange, including reading a streamed reply.
    pub timeout: Option<Duration>,

    /// Base URL the endpoint paths are appended to
    pub base_url: String,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy: None,
            extra_headers: None,
        }
    }
}

impl TransportOptions {
    /// Defaults overridden by `ADK_BASE_URL` and `ADK_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ClientError> {
        let mut options = Self::default();

        if let Some(base_url) = env_var("ADK_BASE_URL") {
            options.base_url = base_url;
        }

        if let Some(secs) = env_var("ADK_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                ClientError::Config(format!("ADK_TIMEOUT_SECS must be a number, got {:?}", secs))
            })?;
            options.timeout = Some(Duration::from_secs(secs));
        }

        Ok(options)
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Join an endpoint path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Identity used to address the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub app_name: String,
    pub user_id: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

impl AgentOptions {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
        }
    }

    /// Defaults overridden by `ADK_APP_NAME` and `ADK_USER_ID`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: env_var("ADK_APP_NAME").unwrap_or(defaults.app_name),
            user_id: env_var("ADK_USER_ID").unwrap_or(defaults.user_id),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
