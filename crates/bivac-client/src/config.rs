use std::time::Duration;

use crate::proxy::ProxyConfig;

/// Address the bivac manager listens on out of the box.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8182";

/// Interval between two volume refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

pub const DEFAULT_USER_AGENT: &str = concat!("bivac-client/", env!("CARGO_PKG_VERSION"));

/// Settings for a [`BivacClient`](crate::BivacClient) or a standalone
/// [`RequestExecutor`](crate::RequestExecutor).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the manager API; request paths are appended to it.
    pub base_url: String,

    /// Delay between the end of one refresh and the start of the next.
    pub poll_interval: Duration,

    /// Overall timeout per request. Zero disables it.
    pub request_timeout: Duration,

    /// Time allowed to establish the TCP/TLS connection. Zero disables it.
    pub connect_timeout: Duration,

    pub user_agent: String,

    pub proxy: Option<ProxyConfig>,

    /// Pre-shared key installed before the first refresh.
    pub credential: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            proxy: None,
            credential: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_credential(mut self, token: impl Into<String>) -> Self {
        self.credential = Some(token.into());
        self
    }
}
