//! RemoteStore port: the three abstract object-store operations.

use async_trait::async_trait;
use tracing::debug;

use crate::error::EngineError;

/// Path-addressed remote object store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload a binary payload to an absolute path, overwrite semantics.
    /// Returns the canonical stored path.
    async fn upload_bytes(
        &self,
        token: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, EngineError>;

    /// Request a new public shared link for `path`.
    async fn create_shared_link(&self, token: &str, path: &str) -> Result<String, EngineError>;

    /// List existing direct links for `path`.
    async fn list_shared_links(&self, token: &str, path: &str)
    -> Result<Vec<String>, EngineError>;

    /// Create a link, falling back to the first existing direct link when
    /// creation fails (a link may already exist for the path). When neither
    /// succeeds this is a true terminal failure for the item.
    async fn shared_link_or_existing(
        &self,
        token: &str,
        path: &str,
    ) -> Result<String, EngineError> {
        match self.create_shared_link(token, path).await {
            Ok(url) => Ok(url),
            Err(err) => {
                debug!(%path, %err, "create_shared_link failed, trying existing links");
                let links = self.list_shared_links(token, path).await?;
                links
                    .into_iter()
                    .next()
                    .ok_or_else(|| EngineError::SharedLink(path.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Remote whose link creation always fails; listing may know a link.
    struct LinkExistsRemote {
        existing: Vec<String>,
    }

    #[async_trait]
    impl RemoteStore for LinkExistsRemote {
        async fn upload_bytes(
            &self,
            _token: &str,
            path: &str,
            _bytes: Vec<u8>,
        ) -> Result<String, EngineError> {
            Ok(path.to_string())
        }

        async fn create_shared_link(
            &self,
            _token: &str,
            path: &str,
        ) -> Result<String, EngineError> {
            Err(EngineError::SharedLink(path.to_string()))
        }

        async fn list_shared_links(
            &self,
            _token: &str,
            _path: &str,
        ) -> Result<Vec<String>, EngineError> {
            Ok(self.existing.clone())
        }
    }

    #[tokio::test]
    async fn falls_back_to_the_first_existing_link() {
        let remote = LinkExistsRemote {
            existing: vec![
                "https://dropbox.test/s/first".to_string(),
                "https://dropbox.test/s/second".to_string(),
            ],
        };

        let url = remote
            .shared_link_or_existing("tok", "/uploads/a.jpg")
            .await
            .unwrap();
        assert_eq!(url, "https://dropbox.test/s/first");
    }

    #[tokio::test]
    async fn no_link_anywhere_is_a_terminal_failure() {
        let remote = LinkExistsRemote { existing: vec![] };

        let err = remote
            .shared_link_or_existing("tok", "/uploads/a.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SharedLink(_)));
    }
}
