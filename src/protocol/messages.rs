//! Server message types
//!
//! One variant per inbound discriminator. Decoding enumerates every known
//! discriminator explicitly; anything else is `UnknownMessageType`.

use super::codec::{discriminator, FieldReader, Payload, PayloadBuilder};
use super::error::ProtocolError;
use super::types::{AgentState, FileEntry, GitStatusInfo};

/// One fragment of a chunked file transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
	pub path: String,
	/// 0-based index; kept signed so out-of-range values survive decoding
	pub chunk_index: i64,
	pub total_chunks: i64,
	/// Base64 encoded bytes of this fragment
	pub data: String,
	pub mime_type: String,
	/// Size in bytes of the whole file
	pub size: i64,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
	Output { text: String, conversation_id: Option<String> },
	FileChange { path: String, diff: Option<String>, content: Option<String> },
	Image { path: String, base64: String },
	Status { state: AgentState, conversation_id: Option<String> },
	AuthRequired,
	AuthResult { success: bool, message: Option<String> },
	Error { message: String },
	DirectoryListing { path: String, entries: Vec<FileEntry> },
	FileContent { path: String, data: String, mime_type: String, size: i64, truncated: bool },
	FileChunk(FileChunk),
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
	GitStatusResult { status: GitStatusInfo },
	GitDiffResult { path: String, diff: String },
	GitCommitResult { success: bool, message: Option<String> },
}

impl ServerMessage {
	/// Wire discriminator
	pub fn kind(&self) -> &'static str {
		match self {
			ServerMessage::Output { .. } => "output",
			ServerMessage::FileChange { .. } => "file_change",
			ServerMessage::Image { .. } => "image",
			ServerMessage::Status { .. } => "status",
			ServerMessage::AuthRequired => "auth_required",
			ServerMessage::AuthResult { .. } => "auth_result",
			ServerMessage::Error { .. } => "error",
			ServerMessage::DirectoryListing { .. } => "directory_listing",
			ServerMessage::FileContent { .. } => "file_content",
			ServerMessage::FileChunk(_) => "file_chunk",
			ServerMessage::SessionId { .. } => "session_id",
			ServerMessage::MissedResponse { .. } => "missed_response",
			ServerMessage::NoMissedResponse { .. } => "no_missed_response",
			ServerMessage::ToolCall { .. } => "tool_call",
			ServerMessage::RunStats { .. } => "run_stats",
			ServerMessage::GitStatusResult { .. } => "git_status_result",
			ServerMessage::GitDiffResult { .. } => "git_diff_result",
			ServerMessage::GitCommitResult { .. } => "git_commit_result",
		}
	}

	/// Decode a payload
	pub fn from_payload(payload: &Payload) -> Result<Self, ProtocolError> {
		let kind = discriminator(payload)?;
		let f = FieldReader::new(payload, kind);

		let message = match kind {
			"output" => ServerMessage::Output {
				text: f.string("text")?,
				conversation_id: f.opt_string("conversationId")?,
			},
			"file_change" => ServerMessage::FileChange {
				path: f.string("path")?,
				diff: f.opt_string("diff")?,
				content: f.opt_string("content")?,
			},
			"image" => ServerMessage::Image { path: f.string("path")?, base64: f.string("base64")? },
			"status" => {
				let state = AgentState::from_wire(&f.string("state")?)
					.ok_or_else(|| ProtocolError::malformed(kind, "state"))?;
				ServerMessage::Status { state, conversation_id: f.opt_string("conversationId")? }
			}
			"auth_required" => ServerMessage::AuthRequired,
			"auth_result" => ServerMessage::AuthResult {
				success: f.bool("success")?,
				message: f.opt_string("message")?,
			},
			"error" => ServerMessage::Error { message: f.string("message")? },
			"directory_listing" => ServerMessage::DirectoryListing {
				path: f.string("path")?,
				entries: f.record("entries")?,
			},
			"file_content" => ServerMessage::FileContent {
				path: f.string("path")?,
				data: f.string("data")?,
				mime_type: f.string("mimeType")?,
				size: f.int("size")?,
				truncated: f.opt_bool("truncated")?.unwrap_or(false),
			},
			"file_chunk" => ServerMessage::FileChunk(FileChunk {
				path: f.string("path")?,
				chunk_index: f.int("chunkIndex")?,
				total_chunks: f.int("totalChunks")?,
				data: f.string("data")?,
				mime_type: f.string("mimeType")?,
				size: f.int("size")?,
			}),
			"session_id" => ServerMessage::SessionId {
				id: f.string("id")?,
				conversation_id: f.opt_string("conversationId")?,
			},
			"missed_response" => ServerMessage::MissedResponse {
				session_id: f.string("sessionId")?,
				text: f.string("text")?,
				completed_at: f.float("completedAt")?,
			},
			"no_missed_response" => {
				ServerMessage::NoMissedResponse { session_id: f.string("sessionId")? }
			}
			"tool_call" => ServerMessage::ToolCall {
				name: f.string("name")?,
				input: f.opt_string("input")?,
				tool_id: f.string("toolId")?,
				parent_tool_id: f.opt_string("parentToolId")?,
				conversation_id: f.opt_string("conversationId")?,
				text_position: f.opt_int("textPosition")?,
			},
			"run_stats" => ServerMessage::RunStats {
				duration_ms: f.int("durationMs")?,
				cost_usd: f.float("costUsd")?,
				model: f.opt_string("model")?,
				conversation_id: f.opt_string("conversationId")?,
			},
			"git_status_result" => ServerMessage::GitStatusResult { status: f.record("status")? },
			"git_diff_result" => {
				ServerMessage::GitDiffResult { path: f.string("path")?, diff: f.string("diff")? }
			}
			"git_commit_result" => ServerMessage::GitCommitResult {
				success: f.bool("success")?,
				message: f.opt_string("message")?,
			},
			other => return Err(ProtocolError::UnknownMessageType(other.to_string())),
		};

		Ok(message)
	}

	/// Encode as the server would
	pub fn to_payload(&self) -> Payload {
		let b = PayloadBuilder::new(self.kind());
		let b = match self {
			ServerMessage::Output { text, conversation_id } => {
				b.field("text", text.as_str()).opt_field("conversationId", conversation_id.clone())
			}
			ServerMessage::FileChange { path, diff, content } => b
				.field("path", path.as_str())
				.opt_field("diff", diff.clone())
				.opt_field("content", content.clone()),
			ServerMessage::Image { path, base64 } => {
				b.field("path", path.as_str()).field("base64", base64.as_str())
			}
			ServerMessage::Status { state, conversation_id } => {
				b.field("state", state.as_wire()).opt_field("conversationId", conversation_id.clone())
			}
			ServerMessage::AuthRequired => b,
			ServerMessage::AuthResult { success, message } => {
				b.field("success", *success).opt_field("message", message.clone())
			}
			ServerMessage::Error { message } => b.field("message", message.as_str()),
			ServerMessage::DirectoryListing { path, entries } => {
				b.field("path", path.as_str()).record("entries", entries)
			}
			ServerMessage::FileContent { path, data, mime_type, size, truncated } => b
				.field("path", path.as_str())
				.field("data", data.as_str())
				.field("mimeType", mime_type.as_str())
				.field("size", *size)
				.field("truncated", *truncated),
			ServerMessage::FileChunk(chunk) => b
				.field("path", chunk.path.as_str())
				.field("chunkIndex", chunk.chunk_index)
				.field("totalChunks", chunk.total_chunks)
				.field("data", chunk.data.as_str())
				.field("mimeType", chunk.mime_type.as_str())
				.field("size", chunk.size),
			ServerMessage::SessionId { id, conversation_id } => {
				b.field("id", id.as_str()).opt_field("conversationId", conversation_id.clone())
			}
			ServerMessage::MissedResponse { session_id, text, completed_at } => b
				.field("sessionId", session_id.as_str())
				.field("text", text.as_str())
				.field("completedAt", *completed_at),
			ServerMessage::NoMissedResponse { session_id } => {
				b.field("sessionId", session_id.as_str())
			}
			ServerMessage::ToolCall {
				name,
				input,
				tool_id,
				parent_tool_id,
				conversation_id,
				text_position,
			} => b
				.field("name", name.as_str())
				.opt_field("input", input.clone())
				.field("toolId", tool_id.as_str())
				.opt_field("parentToolId", parent_tool_id.clone())
				.opt_field("conversationId", conversation_id.clone())
				.opt_field("textPosition", *text_position),
			ServerMessage::RunStats { duration_ms, cost_usd, model, conversation_id } => b
				.field("durationMs", *duration_ms)
				.field("costUsd", *cost_usd)
				.opt_field("model", model.clone())
				.opt_field("conversationId", conversation_id.clone()),
			ServerMessage::GitStatusResult { status } => b.record("status", status),
			ServerMessage::GitDiffResult { path, diff } => {
				b.field("path", path.as_str()).field("diff", diff.as_str())
			}
			ServerMessage::GitCommitResult { success, message } => {
				b.field("success", *success).opt_field("message", message.clone())
			}
		};
		b.build()
	}
}


// vim: ts=4
