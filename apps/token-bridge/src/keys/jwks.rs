//! JWKS (JSON Web Key Set) sources.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::error::AppError;
use crate::errors::ExchangeError;

/// Something that can produce the issuer's current key set.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, ExchangeError>;
}

/// Fetches the key set from the issuer's well-known endpoint.
pub struct HttpKeySetSource {
    url: String,
    client: reqwest::Client,
}

impl HttpKeySetSource {
    /// `timeout` bounds each fetch end to end.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("token-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, ExchangeError> {
        debug!(url = %self.url, "Fetching JWKS");

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExchangeError::upstream("JWKS fetch timed out")
                } else {
                    ExchangeError::upstream(format!("failed to fetch JWKS: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ExchangeError::upstream(format!(
                "JWKS endpoint returned status {}",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| ExchangeError::upstream(format!("invalid JWKS document: {e}")))
    }
}

/// A fixed key set, for pinned deployments and tests.
pub struct StaticKeySet {
    keys: JwkSet,
}

impl StaticKeySet {
    /// Every fetch returns a clone of `keys`.
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    async fn fetch(&self) -> Result<JwkSet, ExchangeError> {
        Ok(self.keys.clone())
    }
}
