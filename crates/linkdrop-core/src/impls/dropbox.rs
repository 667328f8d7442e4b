//! Dropbox adapters: token provider and remote object store over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::EngineError;
use crate::ports::{RemoteStore, TokenProvider};

const TOKEN_URL: &str = "https://api.dropbox.com/oauth2/token";
const UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";
const CREATE_LINK_URL: &str =
    "https://api.dropboxapi.com/2/sharing/create_shared_link_with_settings";
const LIST_LINKS_URL: &str = "https://api.dropboxapi.com/2/sharing/list_shared_links";

/// Long-lived credentials for the OAuth2 refresh-token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct DropboxAuth {
    pub app_key: String,
    pub app_secret: String,
    pub refresh_token: String,
}

/// Exchanges the refresh token for a fresh bearer token.
pub struct DropboxTokenProvider {
    http: reqwest::Client,
    auth: DropboxAuth,
}

impl DropboxTokenProvider {
    pub fn new(auth: DropboxAuth) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
impl TokenProvider for DropboxTokenProvider {
    async fn access_token(&self) -> Result<String, EngineError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.auth.refresh_token.as_str()),
            ("client_id", self.auth.app_key.as_str()),
            ("client_secret", self.auth.app_secret.as_str()),
        ];
        let resp = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| EngineError::Auth(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(EngineError::Auth(format!("status {}", resp.status())));
        }
        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::Auth(e.to_string()))?;
        Ok(body.access_token)
    }
}

/// Dropbox-backed remote store.
///
/// Every mutating call ends with a fixed courtesy pause, an intentional
/// throttle against the API rate limits, not an error-recovery mechanism.
pub struct DropboxClient {
    http: reqwest::Client,
    courtesy_delay: Duration,
}

impl DropboxClient {
    pub fn new(courtesy_delay: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            courtesy_delay,
        }
    }
}

impl Default for DropboxClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    path_lower: Option<String>,
    path_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ListLinksResponse {
    #[serde(default)]
    links: Vec<SharedLink>,
}

/// Dropbox appends `?dl=0` to shared links; the published link drops it.
fn strip_dl_suffix(url: &str) -> String {
    url.replace("?dl=0", "")
}

#[async_trait]
impl RemoteStore for DropboxClient {
    async fn upload_bytes(
        &self,
        token: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, EngineError> {
        debug!(%path, len = bytes.len(), "uploading");
        let api_arg = serde_json::json!({
            "path": path,
            "mode": "overwrite",
            "autorename": false,
            "mute": false,
            "strict_conflict": false,
        });
        let resp = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .header("Dropbox-API-Arg", api_arg.to_string())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| EngineError::Upload {
                status: 0,
                body: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Upload {
                status: status.as_u16(),
                body,
            });
        }

        let meta: UploadResponse = resp.json().await.map_err(|e| EngineError::Upload {
            status: status.as_u16(),
            body: e.to_string(),
        })?;
        tokio::time::sleep(self.courtesy_delay).await;
        Ok(meta
            .path_lower
            .or(meta.path_display)
            .unwrap_or_else(|| path.to_string()))
    }

    async fn create_shared_link(&self, token: &str, path: &str) -> Result<String, EngineError> {
        let payload = serde_json::json!({
            "path": path,
            "settings": { "requested_visibility": "public" },
        });
        let resp = self
            .http
            .post(CREATE_LINK_URL)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::SharedLink(format!("{path}: {e}")))?;
        tokio::time::sleep(self.courtesy_delay).await;

        if !resp.status().is_success() {
            return Err(EngineError::SharedLink(path.to_string()));
        }
        let link: SharedLink = resp
            .json()
            .await
            .map_err(|e| EngineError::SharedLink(format!("{path}: {e}")))?;
        Ok(strip_dl_suffix(&link.url))
    }

    async fn list_shared_links(
        &self,
        token: &str,
        path: &str,
    ) -> Result<Vec<String>, EngineError> {
        let payload = serde_json::json!({
            "path": path,
            "direct_only": true,
        });
        let resp = self
            .http
            .post(LIST_LINKS_URL)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EngineError::SharedLink(format!("{path}: {e}")))?;

        if !resp.status().is_success() {
            return Err(EngineError::SharedLink(path.to_string()));
        }
        let body: ListLinksResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::SharedLink(format!("{path}: {e}")))?;
        Ok(body
            .links
            .into_iter()
            .map(|link| strip_dl_suffix(&link.url))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_links_lose_the_dl_suffix() {
        assert_eq!(
            strip_dl_suffix("https://www.dropbox.com/s/abc/x.jpg?dl=0"),
            "https://www.dropbox.com/s/abc/x.jpg"
        );
        assert_eq!(
            strip_dl_suffix("https://www.dropbox.com/s/abc/x.jpg"),
            "https://www.dropbox.com/s/abc/x.jpg"
        );
    }

    #[test]
    fn list_links_response_tolerates_missing_links_field() {
        let body: ListLinksResponse = serde_json::from_str("{}").unwrap();
        assert!(body.links.is_empty());

        let body: ListLinksResponse = serde_json::from_str(
            r#"{"links": [{"url": "https://www.dropbox.com/s/abc?dl=0", "name": "x.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(body.links.len(), 1);
    }
}
