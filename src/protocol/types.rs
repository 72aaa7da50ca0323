//! Records carried inside protocol payloads
//!
//! These are the nested values of some messages (directory entries, git
//! status). They are plain serde records; the tagged top-level messages are
//! decoded by hand in `codec`.

use serde::{Deserialize, Serialize};

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z, the reference
/// date of timestamps on the wire.
pub const REFERENCE_DATE_UNIX_OFFSET: f64 = 978_307_200.0;

/// Convert a wire timestamp (seconds since 2001-01-01) to Unix seconds
pub fn reference_date_to_unix(seconds: f64) -> f64 {
	seconds + REFERENCE_DATE_UNIX_OFFSET
}

/// Run state reported by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
	#[default]
	Idle,
	Running,
	Compacting,
}

impl AgentState {
	/// Parse the wire representation
	pub fn from_wire(value: &str) -> Option<Self> {
		match value {
			"idle" => Some(AgentState::Idle),
			"running" => Some(AgentState::Running),
			"compacting" => Some(AgentState::Compacting),
			_ => None,
		}
	}

	pub fn as_wire(&self) -> &'static str {
		match self {
			AgentState::Idle => "idle",
			AgentState::Running => "running",
			AgentState::Compacting => "compacting",
		}
	}

	/// True while the agent is producing output
	pub fn is_busy(&self) -> bool {
		!matches!(self, AgentState::Idle)
	}
}

impl std::fmt::Display for AgentState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_wire())
	}
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
	pub name: String,
	pub path: String,
	pub is_directory: bool,
	pub size: i64,
	/// Seconds since 2001-01-01 (see `reference_date_to_unix`)
	pub modified: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
}

/// One changed path in a git working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFileStatus {
	/// Porcelain status code ("M", "A", "??", ...)
	pub status: String,
	pub path: String,
}

impl GitFileStatus {
	/// Human readable form of the status code
	pub fn status_description(&self) -> &str {
		match self.status.as_str() {
			"M" => "Modified",
			"A" => "Added",
			"D" => "Deleted",
			"R" => "Renamed",
			"C" => "Copied",
			"U" => "Unmerged",
			"??" => "Untracked",
			"!!" => "Ignored",
			other => other,
		}
	}

	/// Staged entries start with an uppercase status letter
	pub fn is_staged(&self) -> bool {
		self.status.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
	}
}

/// Git status of one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitStatusInfo {
	pub branch: String,
	pub ahead: i64,
	pub behind: i64,
	pub files: Vec<GitFileStatus>,
}

impl GitStatusInfo {
	pub fn has_changes(&self) -> bool {
		!self.files.is_empty()
	}

	pub fn staged_count(&self) -> usize {
		self.files.iter().filter(|f| f.is_staged()).count()
	}

	pub fn unstaged_count(&self) -> usize {
		self.files.len() - self.staged_count()
	}
}


// vim: ts=4
