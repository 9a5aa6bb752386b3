//! Authenticated request execution against the manager API.
//!
//! Every request carries `Authorization: Bearer <credential>`. The raw
//! [`RequestExecutor::request`] never looks at the response; the JSON helpers
//! check the status and decode the body.

use std::sync::Once;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::header::AUTHORIZATION;
use reqwest::{Body, Client, ClientBuilder, Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::credential::Credential;
use crate::error::{ClientError, Result};
use crate::proxy::build_proxy;

/// Make aws-lc-rs the process-wide rustls provider unless one is already set.
///
/// reqwest is built without a bundled provider, so this must run before any
/// `reqwest::Client` is constructed. [`client_builder`] and
/// [`RequestExecutor::new`] call it for you.
pub fn install_rustls_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if rustls::crypto::CryptoProvider::get_default().is_some() {
            return;
        }
        if rustls::crypto::aws_lc_rs::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls provider installed concurrently by another crate");
        }
    });
}

/// A `reqwest::ClientBuilder` that is safe to `build()`: the rustls provider
/// is installed first. Use it for clients handed to
/// [`RequestExecutor::with_client`].
pub fn client_builder() -> ClientBuilder {
    install_rustls_provider();
    Client::builder()
}

pub(crate) fn build_http_client(config: &ClientConfig) -> Result<Client> {
    let mut builder = client_builder().user_agent(config.user_agent.as_str());

    if config.request_timeout > Duration::ZERO {
        builder = builder.timeout(config.request_timeout);
    }
    if config.connect_timeout > Duration::ZERO {
        builder = builder.connect_timeout(config.connect_timeout);
    }

    builder = match &config.proxy {
        Some(proxy) => builder.proxy(build_proxy(proxy)?),
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

fn normalize_base_url(input: &str) -> Result<String> {
    let url = Url::parse(input).map_err(|e| ClientError::invalid_url(input, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::invalid_url(
                input,
                format!("unsupported scheme `{other}`"),
            ));
        }
    }
    Ok(input.trim_end_matches('/').to_string())
}

pub struct RequestExecutor {
    http: Client,
    base_url: String,
    credential: RwLock<Credential>,
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        let executor = Self::with_client(http, &config.base_url)?;
        *executor.credential.write() = Credential::from(config.credential.clone());
        Ok(executor)
    }

    /// Use a caller-provided `reqwest::Client` (shared pools, custom TLS).
    ///
    /// Build that client from [`client_builder`], or call
    /// [`install_rustls_provider`] before `Client::new()`; reqwest panics
    /// when no rustls provider is installed.
    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            credential: RwLock::new(Credential::unset()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> Credential {
        self.credential.read().clone()
    }

    pub fn has_credential(&self) -> bool {
        self.credential.read().is_set()
    }

    pub(crate) fn set_credential(&self, credential: Credential) {
        *self.credential.write() = credential;
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send `method path` with the bearer header and an optional raw body.
    ///
    /// The body is attached as-is; no content type is added. The response is
    /// returned whatever its status.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
    ) -> Result<Response> {
        let authorization = self.credential.read().authorization_header()?;

        debug!(method = %method, path = %path, "Sending request");

        let mut request = self
            .http
            .request(method, self.url_for(path))
            .header(AUTHORIZATION, authorization);
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::GET, path, None).await?;
        read_json(path, response).await
    }

    /// POST a structured body, serialized to JSON bytes.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)?;
        let response = self
            .request(Method::POST, path, Some(Body::from(payload)))
            .await?;
        read_json(path, response).await
    }

    /// POST without a body and decode the JSON answer.
    pub async fn post_json_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::POST, path, None).await?;
        read_json(path, response).await
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("credential", &*self.credential.read())
            .finish()
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::http_status(status, path, body.trim()));
    }

    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
