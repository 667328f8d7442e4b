//! Data-URL decoding (`data:<mime>;base64,<payload>`).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode an inline data URL into raw bytes.
///
/// Returns `None` on any malformation (missing scheme, missing payload,
/// invalid base64) so the caller can fall back to fetching the source URL.
pub fn decode(data_url: &str) -> Option<Vec<u8>> {
    if !data_url.starts_with("data:") {
        return None;
    }
    let (_, payload) = data_url.split_once(',')?;
    STANDARD.decode(payload).ok()
}
