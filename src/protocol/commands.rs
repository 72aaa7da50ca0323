//! Client commands and the outbound encoder
//!
//! Each command variant has one encoder function producing its discriminator
//! and fields. Absent optional values are left out of the payload.

use uuid::Uuid;

use super::codec::{discriminator, FieldReader, Payload, PayloadBuilder};
use super::error::ProtocolError;

/// Commands sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Send a prompt to the agent
	Chat {
		message: String,
		working_directory: Option<String>,
		session_id: Option<String>,
		is_new_session: bool,
		image_base64: Option<String>,
		conversation_id: Option<Uuid>,
	},

	/// Ask the agent to stop the current run
	Abort { conversation_id: Option<Uuid> },

	/// Authenticate with a shared token
	Auth { token: String },

	ListDirectory { path: String },

	GetFile { path: String },

	/// Ask for the response of a run that finished while disconnected
	RequestMissedResponse { session_id: String },

	/// Git status of the repository at `path`
	GitStatus { path: String },

	/// Diff of the repository at `path`, optionally limited to one file
	GitDiff { path: String, file: Option<String> },

	GitCommit { path: String, message: String, files: Vec<String> },
}

impl Command {
	/// Chat command for a new session with no attachments
	pub fn chat(message: impl Into<String>) -> Self {
		Command::Chat {
			message: message.into(),
			working_directory: None,
			session_id: None,
			is_new_session: true,
			image_base64: None,
			conversation_id: None,
		}
	}

	/// Wire discriminator
	pub fn kind(&self) -> &'static str {
		match self {
			Command::Chat { .. } => "chat",
			Command::Abort { .. } => "abort",
			Command::Auth { .. } => "auth",
			Command::ListDirectory { .. } => "list_directory",
			Command::GetFile { .. } => "get_file",
			Command::RequestMissedResponse { .. } => "request_missed_response",
			Command::GitStatus { .. } => "git_status",
			Command::GitDiff { .. } => "git_diff",
			Command::GitCommit { .. } => "git_commit",
		}
	}

	/// Encode into a wire payload
	pub fn to_payload(&self) -> Payload {
		match self {
			Command::Chat {
				message,
				working_directory,
				session_id,
				is_new_session,
				image_base64,
				conversation_id,
			} => encode_chat(
				message,
				working_directory.as_deref(),
				session_id.as_deref(),
				*is_new_session,
				image_base64.as_deref(),
				*conversation_id,
			),
			Command::Abort { conversation_id } => encode_abort(*conversation_id),
			Command::Auth { token } => encode_auth(token),
			Command::ListDirectory { path } => encode_list_directory(path),
			Command::GetFile { path } => encode_get_file(path),
			Command::RequestMissedResponse { session_id } => {
				encode_request_missed_response(session_id)
			}
			Command::GitStatus { path } => encode_git_status(path),
			Command::GitDiff { path, file } => encode_git_diff(path, file.as_deref()),
			Command::GitCommit { path, message, files } => encode_git_commit(path, message, files),
		}
	}

	/// Decode a command payload, as the server reads it
	pub fn from_payload(payload: &Payload) -> Result<Self, ProtocolError> {
		let kind = discriminator(payload)?;
		let f = FieldReader::new(payload, kind);

		let command = match kind {
			"chat" => Command::Chat {
				message: f.string("message")?,
				working_directory: f.opt_string("workingDirectory")?,
				session_id: f.opt_string("sessionId")?,
				is_new_session: f.opt_bool("isNewSession")?.unwrap_or(true),
				image_base64: f.opt_string("imageBase64")?,
				conversation_id: read_uuid(&f, kind, "conversationId")?,
			},
			"abort" => Command::Abort { conversation_id: read_uuid(&f, kind, "conversationId")? },
			"auth" => Command::Auth { token: f.string("token")? },
			"list_directory" => Command::ListDirectory { path: f.string("path")? },
			"get_file" => Command::GetFile { path: f.string("path")? },
			"request_missed_response" => {
				Command::RequestMissedResponse { session_id: f.string("sessionId")? }
			}
			"git_status" => Command::GitStatus { path: f.string("path")? },
			"git_diff" => Command::GitDiff { path: f.string("path")?, file: f.opt_string("file")? },
			"git_commit" => Command::GitCommit {
				path: f.string("path")?,
				message: f.string("message")?,
				files: f.string_list("files")?,
			},
			other => return Err(ProtocolError::UnknownMessageType(other.to_string())),
		};

		Ok(command)
	}
}

fn read_uuid(f: &FieldReader<'_>, kind: &str, field: &str) -> Result<Option<Uuid>, ProtocolError> {
	match f.opt_string(field)? {
		None => Ok(None),
		Some(s) => Uuid::parse_str(&s).map(Some).map_err(|_| ProtocolError::malformed(kind, field)),
	}
}

pub fn encode_chat(
	message: &str,
	working_directory: Option<&str>,
	session_id: Option<&str>,
	is_new_session: bool,
	image_base64: Option<&str>,
	conversation_id: Option<Uuid>,
) -> Payload {
	PayloadBuilder::new("chat")
		.field("message", message)
		.opt_field("workingDirectory", working_directory)
		.opt_field("sessionId", session_id)
		.field("isNewSession", is_new_session)
		.opt_field("imageBase64", image_base64)
		.opt_field("conversationId", conversation_id.map(|id| id.to_string()))
		.build()
}

pub fn encode_abort(conversation_id: Option<Uuid>) -> Payload {
	PayloadBuilder::new("abort")
		.opt_field("conversationId", conversation_id.map(|id| id.to_string()))
		.build()
}

pub fn encode_auth(token: &str) -> Payload {
	PayloadBuilder::new("auth").field("token", token).build()
}

pub fn encode_list_directory(path: &str) -> Payload {
	PayloadBuilder::new("list_directory").field("path", path).build()
}

pub fn encode_get_file(path: &str) -> Payload {
	PayloadBuilder::new("get_file").field("path", path).build()
}

pub fn encode_request_missed_response(session_id: &str) -> Payload {
	PayloadBuilder::new("request_missed_response").field("sessionId", session_id).build()
}

pub fn encode_git_status(path: &str) -> Payload {
	PayloadBuilder::new("git_status").field("path", path).build()
}

pub fn encode_git_diff(path: &str, file: Option<&str>) -> Payload {
	PayloadBuilder::new("git_diff").field("path", path).opt_field("file", file).build()
}

pub fn encode_git_commit(path: &str, message: &str, files: &[String]) -> Payload {
	PayloadBuilder::new("git_commit")
		.field("path", path)
		.field("message", message)
		.field("files", files.to_vec())
		.build()
}


// vim: ts=4
