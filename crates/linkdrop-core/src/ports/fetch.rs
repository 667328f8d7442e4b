//! SourceFetcher port: origin-URL byte acquisition.

use async_trait::async_trait;

use crate::error::EngineError;

/// Fetches source bytes from an origin URL, the fallback byte source when an
/// item has no usable inline payload.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, EngineError>;
}

/// reqwest-backed fetcher (production).
///
/// Timeouts are whatever the underlying transport applies; retries live in
/// the dispatcher's cycle model, not here.
#[derive(Default)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, EngineError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::Download(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(EngineError::Download(format!("status {}", resp.status())));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| EngineError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
