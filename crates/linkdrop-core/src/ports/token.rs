//! TokenProvider port: short-lived bearer tokens on demand.

use async_trait::async_trait;

use crate::error::EngineError;

/// Exchanges a long-lived credential for a bearer token.
///
/// No caching: the dispatcher fetches a fresh token for every drain cycle,
/// and a failure aborts that cycle without touching any item.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, EngineError>;
}
