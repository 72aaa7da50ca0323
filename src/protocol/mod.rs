//! Wire protocol layer
//!
//! Tagged JSON frames in both directions. The dispatcher and client depend
//! only on the typed values defined here, never on raw field names.
//!
//! # Example Usage
//!
//! ```ignore
//! use agentwire::protocol::{codec, Command};
//!
//! let frame = codec::to_frame(codec::encode(&Command::chat("hello")));
//! let payload = codec::parse_frame(r#"{"type":"auth_required"}"#)?;
//! let message = codec::decode(&payload)?;
//! ```

pub mod codec;
pub mod commands;
pub mod error;
pub mod messages;
pub mod types;

// Re-export public API
pub use codec::{Payload, PayloadBuilder};
pub use commands::Command;
pub use error::ProtocolError;
pub use messages::{FileChunk, ServerMessage};
pub use types::{AgentState, FileEntry, GitFileStatus, GitStatusInfo};

// vim: ts=4
