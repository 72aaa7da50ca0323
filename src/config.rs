//! Client configuration
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (`ClientConfig::default()`)
//! 2. Config file (`.toml`, or `.json`/`.json5` parsed leniently)
//! 3. Environment variables (`AGENTWIRE_*` prefix)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ClientError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AGENTWIRE_";

/// Configuration for the protocol client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
	/// Token sent when the server asks for authentication
	pub auth_token: Option<String>,

	/// Answer `auth_required` automatically when a token is configured
	pub auto_authenticate: bool,

	/// Publish a `ChunkProgress` event for every received chunk
	pub emit_chunk_progress: bool,

	/// tracing filter directive (overridden by RUST_LOG)
	pub log_filter: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		ClientConfig {
			auth_token: None,
			auto_authenticate: true,
			emit_chunk_progress: true,
			log_filter: "info".to_string(),
		}
	}
}

impl ClientConfig {
	/// Defaults, then the optional file, then the environment
	pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		config.apply_env(|key| std::env::var(key).ok())?;
		config.validate()?;
		Ok(config)
	}

	/// Parse a config file, format chosen by extension
	pub fn from_file(path: &Path) -> Result<Self, ClientError> {
		let text = fs::read_to_string(path)?;
		let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

		match extension {
			"toml" => toml::from_str(&text).map_err(|e| ClientError::Config {
				message: format!("{}: {}", path.display(), e),
			}),
			"json" | "json5" => json5::from_str(&text).map_err(|e| ClientError::Config {
				message: format!("{}: {}", path.display(), e),
			}),
			other => Err(ClientError::Config {
				message: format!("Unsupported config format '{}' for {}", other, path.display()),
			}),
		}
	}

	/// Override fields from environment lookups
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ClientError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(token) = lookup(&format!("{}AUTH_TOKEN", ENV_PREFIX)) {
			self.auth_token = Some(token);
		}
		if let Some(value) = lookup(&format!("{}AUTO_AUTHENTICATE", ENV_PREFIX)) {
			self.auto_authenticate = parse_bool("AUTO_AUTHENTICATE", &value)?;
		}
		if let Some(value) = lookup(&format!("{}EMIT_CHUNK_PROGRESS", ENV_PREFIX)) {
			self.emit_chunk_progress = parse_bool("EMIT_CHUNK_PROGRESS", &value)?;
		}
		if let Some(filter) = lookup(&format!("{}LOG_FILTER", ENV_PREFIX)) {
			self.log_filter = filter;
		}
		Ok(())
	}

	pub fn validate(&self) -> Result<(), ClientError> {
		if self.log_filter.trim().is_empty() {
			return Err(ClientError::Config { message: "logFilter must not be empty".to_string() });
		}
		if self.auto_authenticate && self.auth_token.as_deref() == Some("") {
			return Err(ClientError::Config {
				message: "authToken is empty but autoAuthenticate is enabled".to_string(),
			});
		}
		Ok(())
	}
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ClientError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ClientError::Config {
			message: format!("{}{} must be a boolean, got '{}'", ENV_PREFIX, name, value),
		}),
	}
}


// vim: ts=4
