//! Inbound dispatch and protocol state
//!
//! The dispatcher is the single owner of all per-connection protocol state:
//! pending chunk transfers, the git status coalescer and the session flags.
//! Every entry point returns an `Outcome` (events to publish, payloads to
//! send) instead of performing I/O, so the caller decides where the
//! serialization point lives.

use tracing::{debug, info, warn};

use crate::coalescer::{CoalescerState, GitStatusCoalescer};
use crate::config::ClientConfig;
use crate::event::{ChunkProgress, ErrorOrigin, Event};
use crate::protocol::codec::{self, Payload};
use crate::protocol::commands::{encode_auth, encode_git_status};
use crate::protocol::{AgentState, Command, FileChunk, GitStatusInfo, ServerMessage};
use crate::reassembler::{ChunkOutcome, ChunkReassembler, ReassemblyStats};

/// Effects produced by one dispatcher call, in order
#[derive(Debug, Default)]
pub struct Outcome {
	pub events: Vec<Event>,
	pub outbound: Vec<Payload>,
}

impl Outcome {
	fn event(event: Event) -> Self {
		Outcome { events: vec![event], outbound: Vec::new() }
	}

	fn send(payload: Payload) -> Self {
		Outcome { events: Vec::new(), outbound: vec![payload] }
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty() && self.outbound.is_empty()
	}
}

/// Point-in-time view of protocol state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
	pub connected: bool,
	pub authenticated: bool,
	pub agent_state: AgentState,
	pub pending_transfers: Vec<String>,
	pub git_status: CoalescerState,
	pub git_status_queue: Vec<String>,
	pub chunk_progress: Option<ChunkProgress>,
	pub frames_dispatched: u64,
	pub frames_rejected: u64,
}

/// Where a decoded message goes
enum Route {
	Publish(Event),
	Chunk(FileChunk),
	GitStatus(GitStatusInfo),
}

fn route(message: ServerMessage) -> Route {
	let event = match message {
		ServerMessage::FileChunk(chunk) => return Route::Chunk(chunk),
		ServerMessage::GitStatusResult { status } => return Route::GitStatus(status),
		ServerMessage::Output { text, conversation_id } => Event::Output { text, conversation_id },
		ServerMessage::FileChange { path, diff, content } => Event::FileChange { path, diff, content },
		ServerMessage::Image { path, base64 } => Event::Image { path, base64 },
		ServerMessage::Status { state, conversation_id } => Event::Status { state, conversation_id },
		ServerMessage::AuthRequired => Event::AuthRequired,
		ServerMessage::AuthResult { success, message } => Event::AuthResult { success, message },
		ServerMessage::Error { message } => Event::Error { message, origin: ErrorOrigin::Server },
		ServerMessage::DirectoryListing { path, entries } => {
			Event::DirectoryListing { path, entries }
		}
		ServerMessage::FileContent { path, data, mime_type, size, truncated } => {
			Event::FileContent { path, data, mime_type, size, truncated }
		}
		ServerMessage::SessionId { id, conversation_id } => Event::SessionId { id, conversation_id },
		ServerMessage::MissedResponse { session_id, text, completed_at } => {
			Event::MissedResponse { session_id, text, completed_at }
		}
		ServerMessage::NoMissedResponse { session_id } => Event::NoMissedResponse { session_id },
		ServerMessage::ToolCall {
			name,
			input,
			tool_id,
			parent_tool_id,
			conversation_id,
			text_position,
		} => Event::ToolCall { name, input, tool_id, parent_tool_id, conversation_id, text_position },
		ServerMessage::RunStats { duration_ms, cost_usd, model, conversation_id } => {
			Event::RunStats { duration_ms, cost_usd, model, conversation_id }
		}
		ServerMessage::GitDiffResult { path, diff } => Event::GitDiffResult { path, diff },
		ServerMessage::GitCommitResult { success, message } => {
			Event::GitCommitResult { success, message }
		}
	};
	Route::Publish(event)
}

/// Routes inbound frames and outbound commands through the protocol state
#[derive(Debug)]
pub struct Dispatcher {
	auth_token: Option<String>,
	auto_authenticate: bool,
	emit_chunk_progress: bool,

	reassembler: ChunkReassembler,
	coalescer: GitStatusCoalescer,

	connected: bool,
	authenticated: bool,
	agent_state: AgentState,
	chunk_progress: Option<ChunkProgress>,

	frames_dispatched: u64,
	frames_rejected: u64,
}

impl Dispatcher {
	pub fn new(config: &ClientConfig) -> Self {
		Dispatcher {
			auth_token: config.auth_token.clone(),
			auto_authenticate: config.auto_authenticate,
			emit_chunk_progress: config.emit_chunk_progress,
			reassembler: ChunkReassembler::new(),
			coalescer: GitStatusCoalescer::new(),
			connected: false,
			authenticated: false,
			agent_state: AgentState::Idle,
			chunk_progress: None,
			frames_dispatched: 0,
			frames_rejected: 0,
		}
	}

	// === Inbound ===

	/// Parse and dispatch one frame of text
	pub fn handle_frame(&mut self, text: &str) -> Outcome {
		match codec::parse_frame(text) {
			Ok(payload) => self.handle_payload(&payload),
			Err(err) => self.reject(err),
		}
	}

	/// Decode and dispatch one payload. A payload that fails to decode yields
	/// exactly one error event and leaves all other state unchanged.
	pub fn handle_payload(&mut self, payload: &Payload) -> Outcome {
		match codec::decode(payload) {
			Ok(message) => self.handle_message(message),
			Err(err) => self.reject(err),
		}
	}

	/// Dispatch an already decoded message
	pub fn handle_message(&mut self, message: ServerMessage) -> Outcome {
		self.frames_dispatched += 1;
		debug!("Dispatching {}", message.kind());

		match route(message) {
			Route::Chunk(chunk) => self.handle_chunk(chunk),
			Route::GitStatus(status) => self.handle_git_status_result(status),
			Route::Publish(event) => self.handle_stateless(event),
		}
	}

	fn reject(&mut self, err: crate::protocol::ProtocolError) -> Outcome {
		self.frames_rejected += 1;
		warn!("Dropping frame: {}", err);
		Outcome::event(Event::local_error(&err))
	}

	fn handle_stateless(&mut self, event: Event) -> Outcome {
		let mut outcome = Outcome::default();

		match &event {
			Event::AuthRequired => {
				self.authenticated = false;
				if self.auto_authenticate {
					if let Some(token) = &self.auth_token {
						debug!("Server requested authentication, sending token");
						outcome.outbound.push(encode_auth(token));
					}
				}
			}
			Event::AuthResult { success, message } => {
				self.authenticated = *success;
				if !success {
					warn!(
						"Authentication failed: {}",
						message.as_deref().unwrap_or("Authentication failed")
					);
				}
			}
			Event::Status { state, .. } => self.agent_state = *state,
			_ => {}
		}

		outcome.events.push(event);
		outcome
	}

	fn handle_chunk(&mut self, chunk: FileChunk) -> Outcome {
		let mut outcome = Outcome::default();

		let progress = match self.reassembler.accept(chunk) {
			Ok(ChunkOutcome::Pending(progress)) => progress,
			Ok(ChunkOutcome::Complete { progress, content }) => {
				outcome.events.push(content);
				progress
			}
			Ok(ChunkOutcome::Corrupt { progress, error }) => {
				outcome.events.push(Event::local_error(&error));
				progress
			}
			Err(err) => {
				warn!("Dropping chunk: {}", err);
				return Outcome::event(Event::local_error(&err));
			}
		};

		self.chunk_progress = Some(progress.clone());
		if self.emit_chunk_progress {
			outcome.events.insert(0, Event::ChunkProgress(progress));
		}
		outcome
	}

	fn handle_git_status_result(&mut self, status: GitStatusInfo) -> Outcome {
		let Some(completion) = self.coalescer.complete() else {
			warn!("git status result with no request in flight, dropped");
			return Outcome::default();
		};

		let mut outcome = Outcome::event(Event::GitStatusResult { path: completion.path, status });
		if let Some(next) = completion.next {
			debug!("Sending queued git status for {}", next);
			outcome.outbound.push(encode_git_status(&next));
		}
		outcome
	}

	// === Outbound ===

	/// Prepare a command for sending. Git status requests go through the
	/// coalescer and may produce no payload at all.
	pub fn handle_command(&mut self, command: Command) -> Outcome {
		match command {
			Command::GitStatus { path } => match self.coalescer.request(&path) {
				Some(path) => Outcome::send(encode_git_status(&path)),
				None => Outcome::default(),
			},
			other => Outcome::send(codec::encode(&other)),
		}
	}

	/// The transport refused `payload`. A git status request that never went
	/// out is abandoned so it does not block the queue; the returned outcome
	/// carries the next queued request, if any.
	pub fn handle_send_failure(&mut self, payload: &Payload) -> Outcome {
		if codec::discriminator(payload).ok() != Some("git_status") {
			return Outcome::default();
		}
		let path = payload.get("path").and_then(|p| p.as_str());
		if path.is_none() || path != self.coalescer.in_flight() {
			return Outcome::default();
		}
		match self.coalescer.abandon() {
			Some(next) => {
				debug!("Trying queued git status for {}", next);
				Outcome::send(encode_git_status(&next))
			}
			None => Outcome::default(),
		}
	}

	// === Connection lifecycle ===

	pub fn handle_connected(&mut self) -> Outcome {
		self.connected = true;
		info!("Connected");
		Outcome::event(Event::Connected)
	}

	/// Drop all partial transfers and queued requests and return to idle
	pub fn handle_reset(&mut self) -> Outcome {
		let transfers = self.reassembler.reset();
		let requests = self.coalescer.reset();
		self.connected = false;
		self.authenticated = false;
		self.agent_state = AgentState::Idle;
		self.chunk_progress = None;
		info!(
			"Connection reset: dropped {} partial transfer(s), {} git status request(s)",
			transfers, requests
		);
		Outcome::event(Event::ConnectionReset)
	}

	// === Inspection ===

	pub fn snapshot(&self) -> ClientSnapshot {
		ClientSnapshot {
			connected: self.connected,
			authenticated: self.authenticated,
			agent_state: self.agent_state,
			pending_transfers: self.reassembler.pending_paths(),
			git_status: self.coalescer.state(),
			git_status_queue: self.coalescer.queued(),
			chunk_progress: self.chunk_progress.clone(),
			frames_dispatched: self.frames_dispatched,
			frames_rejected: self.frames_rejected,
		}
	}

	pub fn reassembly_stats(&self) -> ReassemblyStats {
		self.reassembler.stats()
	}
}


// vim: ts=4
