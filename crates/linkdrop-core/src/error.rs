use thiserror::Error;

/// Engine-wide error type.
///
/// Item-level variants end up in the item's `error` field and, on terminal
/// failure, in its completed record. Cycle-level variants (`Store`, `Auth`)
/// abort the whole drain cycle instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The persistent store could not complete a read or write.
    #[error("store unavailable: {0}")]
    Store(String),

    /// Token exchange against the authorization endpoint failed.
    #[error("token exchange failed: {0}")]
    Auth(String),

    /// Fetching source bytes from the origin URL failed.
    #[error("download failed: {0}")]
    Download(String),

    /// The remote store rejected an upload.
    #[error("upload failed: {status} - {body}")]
    Upload { status: u16, body: String },

    /// No shared link could be created or resolved for a path.
    #[error("create_shared_link failed for {0}")]
    SharedLink(String),

    /// The item carries neither a decodable inline payload nor a source URL.
    #[error("no srcUrl/dataUrl")]
    NoSource,

    #[error("{0}")]
    Other(String),
}
