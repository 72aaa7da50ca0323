//! Application-visible events
//!
//! These are published on the event bus after dispatch, reassembly and
//! coalescing. Subscribers receive them behind an `Arc` and never mutate them.

use crate::protocol::types::reference_date_to_unix;
use crate::protocol::{AgentState, FileEntry, GitStatusInfo, ProtocolError};
use crate::util::decode_base64;

/// Where an error event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
	/// The server sent an `error` frame
	Server,
	/// Frame could not be decoded or contradicted earlier frames
	Protocol,
	/// Binary payload was not valid base64
	Decode,
}

/// Progress of a chunked transfer, replaced on every chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkProgress {
	pub path: String,
	/// Index of the chunk just received
	pub current: i64,
	pub total: i64,
}

/// Events published to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	/// Transport reported a new connection
	Connected,

	/// Transport connection was lost; partial transfers and queued git requests were dropped
	ConnectionReset,

	Output { text: String, conversation_id: Option<String> },
	FileChange { path: String, diff: Option<String>, content: Option<String> },
	Image { path: String, base64: String },
	Status { state: AgentState, conversation_id: Option<String> },
	AuthRequired,
	AuthResult { success: bool, message: Option<String> },
	Error { message: String, origin: ErrorOrigin },
	DirectoryListing { path: String, entries: Vec<FileEntry> },

	/// Whole file, either sent in one frame or reassembled from chunks
	FileContent { path: String, data: String, mime_type: String, size: i64, truncated: bool },

	ChunkProgress(ChunkProgress),
	SessionId { id: String, conversation_id: Option<String> },
	MissedResponse { session_id: String, text: String, completed_at: f64 },
	NoMissedResponse { session_id: String },
	ToolCall {
		name: String,
		input: Option<String>,
		tool_id: String,
		parent_tool_id: Option<String>,
		conversation_id: Option<String>,
		text_position: Option<i64>,
	},
	RunStats {
		duration_ms: i64,
		cost_usd: f64,
		model: Option<String>,
		conversation_id: Option<String>,
	},

	/// Git status attributed to the path that was in flight
	GitStatusResult { path: String, status: GitStatusInfo },
	GitDiffResult { path: String, diff: String },
	GitCommitResult { success: bool, message: Option<String> },
}

impl Event {
	/// Error event for a locally detected fault
	pub fn local_error(err: &ProtocolError) -> Self {
		let origin = match err {
			ProtocolError::DecodeFailure(_) => ErrorOrigin::Decode,
			_ => ErrorOrigin::Protocol,
		};
		Event::Error { message: err.to_string(), origin }
	}

	pub fn kind(&self) -> &'static str {
		match self {
			Event::Connected => "connected",
			Event::ConnectionReset => "connection_reset",
			Event::Output { .. } => "output",
			Event::FileChange { .. } => "file_change",
			Event::Image { .. } => "image",
			Event::Status { .. } => "status",
			Event::AuthRequired => "auth_required",
			Event::AuthResult { .. } => "auth_result",
			Event::Error { .. } => "error",
			Event::DirectoryListing { .. } => "directory_listing",
			Event::FileContent { .. } => "file_content",
			Event::ChunkProgress(_) => "chunk_progress",
			Event::SessionId { .. } => "session_id",
			Event::MissedResponse { .. } => "missed_response",
			Event::NoMissedResponse { .. } => "no_missed_response",
			Event::ToolCall { .. } => "tool_call",
			Event::RunStats { .. } => "run_stats",
			Event::GitStatusResult { .. } => "git_status_result",
			Event::GitDiffResult { .. } => "git_diff_result",
			Event::GitCommitResult { .. } => "git_commit_result",
		}
	}

	/// Decode the binary payload of `FileContent` and `Image` events.
	/// Returns `None` for events without one.
	pub fn binary_data(&self) -> Option<Result<Vec<u8>, ProtocolError>> {
		match self {
			Event::FileContent { data, .. } => Some(decode_base64(data)),
			Event::Image { base64, .. } => Some(decode_base64(base64)),
			_ => None,
		}
	}

	/// Completion time of a missed response in Unix seconds
	pub fn completed_at_unix(&self) -> Option<f64> {
		match self {
			Event::MissedResponse { completed_at, .. } => Some(reference_date_to_unix(*completed_at)),
			_ => None,
		}
	}
}


// vim: ts=4
