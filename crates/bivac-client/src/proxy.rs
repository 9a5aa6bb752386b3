use reqwest::Proxy;

use crate::error::{ClientError, Result};

/// Kind of proxy the manager is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyType {
    Http,
    Https,
    Socks5,
}

/// Basic credentials for the proxy itself (not the manager).
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// e.g. `http://proxy.internal:3128` or `socks5://127.0.0.1:1080`
    pub url: String,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl ProxyConfig {
    /// Infer the proxy type from the URL scheme, defaulting to HTTP.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let proxy_type = if url.starts_with("socks5://") || url.starts_with("socks5h://") {
            ProxyType::Socks5
        } else if url.starts_with("https://") {
            ProxyType::Https
        } else {
            ProxyType::Http
        };
        Self {
            url,
            proxy_type,
            auth: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(ProxyAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }
}

impl ProxyType {
    fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks5 => "socks5",
        }
    }
}

/// The configured proxy as a `reqwest::Proxy` covering every request.
///
/// The type only decides how the client talks to the proxy; the manager is
/// reached through it whether its own URL is `http://` or `https://`.
pub(crate) fn build_proxy(config: &ProxyConfig) -> Result<Proxy> {
    let url = if config.url.contains("://") {
        config.url.clone()
    } else {
        format!("{}://{}", config.proxy_type.scheme(), config.url)
    };

    let proxy = Proxy::all(&url)
        .map_err(|e| ClientError::proxy_configuration(format!("invalid proxy URL `{url}`: {e}")))?;

    Ok(match &config.auth {
        Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
        None => proxy,
    })
}
