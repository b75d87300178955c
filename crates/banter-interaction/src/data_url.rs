//! Data-URL codec for inline images.
//!
//! Messages carry images as `data:<mime>;base64,<payload>` strings, the same
//! representation the display layer renders. The remote protocol wants raw
//! bytes plus a mime type, so sends decode and replies re-encode. Both
//! directions are deterministic and lossless.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

use banter_core::error::{BanterError, Result};

/// A decoded inline image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Decodes a base64 data URL into its payload and mime type.
pub fn decode(data_url: &str) -> Result<InlineImage> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| malformed("missing 'data:' prefix"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| malformed("missing ',' separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| malformed("only base64 payloads are supported"))?;
    if mime_type.is_empty() {
        return Err(malformed("empty mime type"));
    }

    let data = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| malformed(&format!("invalid base64 payload: {e}")))?;

    Ok(InlineImage {
        mime_type: mime_type.to_string(),
        data,
    })
}

/// Encodes raw bytes into a base64 data URL.
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", BASE64_STANDARD.encode(data))
}

fn malformed(detail: &str) -> BanterError {
    BanterError::precondition(format!("attachment is not a valid data URL: {detail}"))
}
