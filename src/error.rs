//! Error types for client operations

use std::error::Error;
use std::fmt;
use std::io;

use crate::protocol::ProtocolError;

/// Main error type for client setup and I/O
#[derive(Debug)]
pub enum ClientError {
	/// Invalid or unreadable configuration
	Config { message: String },

	/// I/O error
	Io(io::Error),

	/// Protocol error (nested)
	Protocol(ProtocolError),
}

impl fmt::Display for ClientError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ClientError::Config { message } => write!(f, "Invalid configuration: {}", message),
			ClientError::Io(e) => write!(f, "I/O error: {}", e),
			ClientError::Protocol(e) => write!(f, "Protocol error: {}", e),
		}
	}
}

impl Error for ClientError {}

impl From<io::Error> for ClientError {
	fn from(e: io::Error) -> Self {
		ClientError::Io(e)
	}
}

impl From<ProtocolError> for ClientError {
	fn from(e: ProtocolError) -> Self {
		ClientError::Protocol(e)
	}
}

// vim: ts=4
