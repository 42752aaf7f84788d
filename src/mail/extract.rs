//! Plain-text body extraction from a Gmail payload tree.
//!
//! Depth-first, pre-order: a `text/plain` node with data wins outright,
//! otherwise the first child that yields non-empty text wins. Part order is
//! significant, so `[text/html, text/plain]` and `[text/plain, text/html]`
//! both resolve to the plain alternative while an HTML-only tree yields "".
//!
//! Pure string and tree work. Never fails, never calls out.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::debug;

use crate::mail::payload::MessagePayload;

const TEXT_PLAIN: &str = "text/plain";

/// Gmail emits base64url both with and without padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Return the first `text/plain` content in the tree, or "" if there is none.
pub fn extract_plain_text(payload: Option<&MessagePayload>) -> String {
    let Some(payload) = payload else {
        return String::new();
    };

    if payload.mime_type == TEXT_PLAIN
        && let Some(data) = payload
            .body
            .as_ref()
            .and_then(|b| b.data.as_deref())
            .filter(|d| !d.is_empty())
    {
        return decode_body_data(data);
    }

    payload
        .parts
        .iter()
        .map(|part| extract_plain_text(Some(part)))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Decode base64url body data to text. Line breaks and other ASCII
/// whitespace are ignored. Undecodable input yields "".
pub fn decode_body_data(data: &str) -> String {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match URL_SAFE_LENIENT.decode(compact) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, len = data.len(), "Skipping undecodable body part");
            String::new()
        }
    }
}
