use std::fmt;

use reqwest::header::HeaderValue;

use crate::error::{ClientError, Result};

/// Bearer token sent to the manager. Unset until the user logs in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn unset() -> Self {
        Self(None)
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// `Bearer <token>`, with an empty token when unset.
    pub fn authorization_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token().unwrap_or("")))
            .map_err(|e| ClientError::InvalidCredential {
                reason: e.to_string(),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl From<Option<String>> for Credential {
    fn from(token: Option<String>) -> Self {
        Self(token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(<redacted>)"),
            None => f.write_str("Credential(unset)"),
        }
    }
}
