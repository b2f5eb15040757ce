//! Safe-token string encoding and payload compression
//!
//! Descriptor lines are space-delimited, so free-text arguments (titles,
//! property values, attribute keys) are wrapped into delimiter-safe tokens:
//! a fixed prefix followed by base64 over the UTF-8 bytes. The wrapped form
//! never contains whitespace and cannot be mistaken for a bare identifier.
//!
//! The compression codec (gzip) is used by higher layers to shrink
//! serialized descriptor text before storage. Round-trips are exact.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

/// Prefix marking an encoded token
pub const ENCODED_STRING_PREFIX: &str = "utf8+base64:";

/// Errors that can occur while decoding tokens or decompressing payloads
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("value is not in encoded form: {0}")]
    NotEncoded(String),
    #[error("invalid encoded payload: {0}")]
    Payload(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrap a raw value into safe storage form
///
/// The result carries the [`ENCODED_STRING_PREFIX`] followed by standard
/// base64 of the value's UTF-8 bytes. An empty input yields an empty payload,
/// which is still a valid token.
pub fn encode_text(raw: &str) -> String {
    format!("{}{}", ENCODED_STRING_PREFIX, BASE64.encode(raw.as_bytes()))
}

/// Decode an encoded token back to its raw value
///
/// # Errors
///
/// Returns [`EncodingError::NotEncoded`] when the token does not match the
/// recognized pattern, or [`EncodingError::Payload`] when the payload fails
/// base64 or UTF-8 decoding.
pub fn decode_text(token: &str) -> Result<String, EncodingError> {
    if !is_encoded(token) {
        return Err(EncodingError::NotEncoded(token.to_string()));
    }
    let payload = &token[ENCODED_STRING_PREFIX.len()..];
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| EncodingError::Payload(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EncodingError::Payload(e.to_string()))
}

/// Check whether a value is in encoded form
///
/// Pattern match only, no decoding side effects. The empty payload (bare
/// prefix) counts as encoded.
pub fn is_encoded(text: &str) -> bool {
    let Some(payload) = text.strip_prefix(ENCODED_STRING_PREFIX) else {
        return false;
    };
    payload
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

/// Compress text with gzip (best compression)
pub fn compress_text(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

/// Decompress gzip data back to text
///
/// # Errors
///
/// Returns an error when the input is not valid gzip or does not decompress
/// to UTF-8 text.
pub fn decompress_text(bytes: &[u8]) -> Result<String, EncodingError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = String::new();
    decoder.read_to_string(&mut out)?;
    Ok(out)
}
