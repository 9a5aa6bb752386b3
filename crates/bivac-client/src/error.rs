use reqwest::StatusCode;

/// Result type used across the client.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request to {path} failed with HTTP {status}: {body}")]
    HttpStatus {
        status: StatusCode,
        path: String,
        body: String,
    },

    #[error("invalid JSON payload: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("proxy configuration error: {reason}")]
    ProxyConfiguration { reason: String },

    #[error("credential cannot be sent as a header: {reason}")]
    InvalidCredential { reason: String },

    #[error("unexpected payload from {path}: {reason}")]
    UnexpectedPayload { path: String, reason: String },
}

impl ClientError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn proxy_configuration(reason: impl Into<String>) -> Self {
        Self::ProxyConfiguration {
            reason: reason.into(),
        }
    }

    pub fn http_status(status: StatusCode, path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            path: path.into(),
            body: body.into(),
        }
    }

    pub fn unexpected_payload(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedPayload {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network { source } => source.status(),
            _ => None,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Json { .. }
            | Self::InvalidUrl { .. }
            | Self::ProxyConfiguration { .. }
            | Self::InvalidCredential { .. }
            | Self::UnexpectedPayload { .. } => false,
        }
    }
}
