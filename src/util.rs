//! Base64 helpers for binary payloads
//!
//! Binary data (file bytes, images) travels as standard base64 text inside
//! frames. Validation happens here, at the point where bytes are needed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::protocol::ProtocolError;

/// Decode standard base64 text
pub fn decode_base64(data: &str) -> Result<Vec<u8>, ProtocolError> {
	Ok(STANDARD.decode(data)?)
}

/// Encode bytes as standard base64 text
pub fn encode_base64(bytes: &[u8]) -> String {
	STANDARD.encode(bytes)
}


// vim: ts=4
