//! Protocol error types
//!
//! Every fault the protocol layer can detect maps to one variant here. None of
//! them are fatal: the dispatcher turns them into `Event::Error` values and the
//! connection stays up.

use std::fmt;
use std::io;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// Frame text is not valid JSON
	InvalidJson(String),

	/// Recognized (or absent) discriminator but a required field is missing or mistyped.
	/// `discriminator` is `None` when the `type` field itself is the problem.
	MalformedMessage { discriminator: Option<String>, field: String },

	/// Discriminator value not part of the protocol
	UnknownMessageType(String),

	/// Conflicting chunk totals observed for one path
	ProtocolInconsistency { path: String, expected_total: u32, received_total: u32 },

	/// Chunk index outside `[0, total)`, or a non-positive total
	ChunkOutOfRange { path: String, index: i64, total: i64 },

	/// Base64 payload could not be decoded
	DecodeFailure(String),

	/// Transport is gone; payload was not handed off
	TransportClosed,

	/// I/O error from the frame source
	Io(io::Error),
}

impl ProtocolError {
	/// Missing/mistyped field for a known discriminator
	pub fn malformed(discriminator: &str, field: &str) -> Self {
		ProtocolError::MalformedMessage {
			discriminator: Some(discriminator.to_string()),
			field: field.to_string(),
		}
	}

	/// Payload without a usable `type` field
	pub fn missing_discriminator() -> Self {
		ProtocolError::MalformedMessage { discriminator: None, field: "type".to_string() }
	}
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::InvalidJson(msg) => write!(f, "Invalid JSON frame: {}", msg),
			ProtocolError::MalformedMessage { discriminator: Some(kind), field } => {
				write!(f, "Malformed '{}' message: missing or invalid field '{}'", kind, field)
			}
			ProtocolError::MalformedMessage { discriminator: None, field } => {
				write!(f, "Malformed message: missing or invalid field '{}'", field)
			}
			ProtocolError::UnknownMessageType(kind) => {
				write!(f, "Malformed message: unknown type '{}'", kind)
			}
			ProtocolError::ProtocolInconsistency { path, expected_total, received_total } => {
				write!(
					f,
					"Protocol inconsistency for {}: total chunks changed from {} to {}",
					path, expected_total, received_total
				)
			}
			ProtocolError::ChunkOutOfRange { path, index, total } => {
				write!(f, "Chunk index {} out of range for {} (total {})", index, path, total)
			}
			ProtocolError::DecodeFailure(msg) => write!(f, "Base64 decode error: {}", msg),
			ProtocolError::TransportClosed => write!(f, "Transport closed"),
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		ProtocolError::Io(e)
	}
}

impl From<serde_json::Error> for ProtocolError {
	fn from(e: serde_json::Error) -> Self {
		ProtocolError::InvalidJson(e.to_string())
	}
}

impl From<base64::DecodeError> for ProtocolError {
	fn from(e: base64::DecodeError) -> Self {
		ProtocolError::DecodeFailure(e.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_malformed_display_names_field() {
		let err = ProtocolError::malformed("file_chunk", "chunkIndex");
		let msg = err.to_string();
		assert!(msg.contains("file_chunk"));
		assert!(msg.contains("chunkIndex"));
	}

	#[test]
	fn test_missing_discriminator_display() {
		assert_eq!(
			ProtocolError::missing_discriminator().to_string(),
			"Malformed message: missing or invalid field 'type'"
		);
	}
}

// vim: ts=4
