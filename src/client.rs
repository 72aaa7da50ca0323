//! Protocol client
//!
//! `AgentClient` is the one serialization point: every inbound frame, every
//! outbound command and every connection lifecycle callback goes through the
//! same lock around the `Dispatcher`, and the resulting events and payloads
//! are applied before the lock is released. Observers therefore see events in
//! the order the frames arrived.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::event::Event;
use crate::event_bus::{EventBus, Subscription};
use crate::protocol::codec::Payload;
use crate::protocol::{Command, ProtocolError};
use crate::reassembler::ReassemblyStats;
use crate::transport::{FrameSource, Transport};

pub use crate::dispatcher::ClientSnapshot;

/// Client-side protocol endpoint bound to one transport
pub struct AgentClient<T: Transport> {
	dispatcher: Mutex<Dispatcher>,
	bus: EventBus,
	transport: Arc<T>,
}

impl<T: Transport> AgentClient<T> {
	pub fn new(config: &ClientConfig, transport: Arc<T>) -> Self {
		AgentClient { dispatcher: Mutex::new(Dispatcher::new(config)), bus: EventBus::new(), transport }
	}

	/// Register an observer; it sees every event published from now on
	pub fn subscribe(&self) -> Subscription {
		self.bus.subscribe()
	}

	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	// === Outbound ===

	/// Send a command. Returns `Ok` without sending when a git status
	/// request was coalesced into the queue.
	pub async fn send(&self, command: Command) -> Result<(), ProtocolError> {
		let mut dispatcher = self.dispatcher.lock().await;
		let outcome = dispatcher.handle_command(command);
		self.publish(outcome.events);
		match self.deliver(&mut dispatcher, outcome.outbound) {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	/// Start or continue a conversation
	pub async fn chat(
		&self,
		message: &str,
		working_directory: Option<&str>,
		session_id: Option<&str>,
		is_new_session: bool,
	) -> Result<(), ProtocolError> {
		self.send(Command::Chat {
			message: message.to_string(),
			working_directory: working_directory.map(str::to_string),
			session_id: session_id.map(str::to_string),
			is_new_session,
			image_base64: None,
			conversation_id: None,
		})
		.await
	}

	pub async fn abort(&self, conversation_id: Option<Uuid>) -> Result<(), ProtocolError> {
		self.send(Command::Abort { conversation_id }).await
	}

	pub async fn authenticate(&self, token: &str) -> Result<(), ProtocolError> {
		self.send(Command::Auth { token: token.to_string() }).await
	}

	pub async fn list_directory(&self, path: &str) -> Result<(), ProtocolError> {
		self.send(Command::ListDirectory { path: path.to_string() }).await
	}

	pub async fn get_file(&self, path: &str) -> Result<(), ProtocolError> {
		self.send(Command::GetFile { path: path.to_string() }).await
	}

	pub async fn request_missed_response(&self, session_id: &str) -> Result<(), ProtocolError> {
		self.send(Command::RequestMissedResponse { session_id: session_id.to_string() }).await
	}

	pub async fn git_status(&self, path: &str) -> Result<(), ProtocolError> {
		self.send(Command::GitStatus { path: path.to_string() }).await
	}

	pub async fn git_diff(&self, path: &str, file: Option<&str>) -> Result<(), ProtocolError> {
		self.send(Command::GitDiff { path: path.to_string(), file: file.map(str::to_string) }).await
	}

	pub async fn git_commit(
		&self,
		path: &str,
		message: &str,
		files: &[String],
	) -> Result<(), ProtocolError> {
		self.send(Command::GitCommit {
			path: path.to_string(),
			message: message.to_string(),
			files: files.to_vec(),
		})
		.await
	}

	// === Inbound (transport callbacks) ===

	pub async fn on_connected(&self) {
		let mut dispatcher = self.dispatcher.lock().await;
		let outcome = dispatcher.handle_connected();
		self.apply(&mut dispatcher, outcome);
	}

	/// One frame of text from the transport
	pub async fn on_frame(&self, text: &str) {
		let mut dispatcher = self.dispatcher.lock().await;
		let outcome = dispatcher.handle_frame(text);
		self.apply(&mut dispatcher, outcome);
	}

	/// One already parsed payload from the transport
	pub async fn on_payload(&self, payload: Payload) {
		let mut dispatcher = self.dispatcher.lock().await;
		let outcome = dispatcher.handle_payload(&payload);
		self.apply(&mut dispatcher, outcome);
	}

	/// The connection dropped; partial state is discarded
	pub async fn on_connection_reset(&self) {
		let mut dispatcher = self.dispatcher.lock().await;
		let outcome = dispatcher.handle_reset();
		self.apply(&mut dispatcher, outcome);
	}

	/// Pump frames from `source` until it ends, then reset.
	/// Returns the number of frames read.
	pub async fn run<S: FrameSource>(&self, source: &mut S) -> Result<u64, ProtocolError> {
		self.on_connected().await;
		let mut frames = 0u64;
		let result = loop {
			match source.next_frame().await {
				Ok(Some(frame)) => {
					frames += 1;
					self.on_frame(&frame).await;
				}
				Ok(None) => break Ok(frames),
				Err(e) => break Err(e),
			}
		};
		debug!("Frame source ended after {} frame(s)", frames);
		self.on_connection_reset().await;
		result
	}

	// === Inspection ===

	pub async fn snapshot(&self) -> ClientSnapshot {
		self.dispatcher.lock().await.snapshot()
	}

	pub async fn reassembly_stats(&self) -> ReassemblyStats {
		self.dispatcher.lock().await.reassembly_stats()
	}

	pub fn published_count(&self) -> u64 {
		self.bus.published_count()
	}

	fn publish(&self, events: Vec<Event>) {
		for event in events {
			self.bus.publish(event);
		}
	}

	fn apply(&self, dispatcher: &mut Dispatcher, outcome: Outcome) {
		self.publish(outcome.events);
		if let Some(err) = self.deliver(dispatcher, outcome.outbound) {
			warn!("Failed to send: {}", err);
		}
	}

	/// Hand payloads to the transport in order. A refused payload is reported
	/// back to the dispatcher, which may queue a replacement. Returns the
	/// first send error.
	fn deliver(&self, dispatcher: &mut Dispatcher, outbound: Vec<Payload>) -> Option<ProtocolError> {
		let mut pending: VecDeque<Payload> = outbound.into();
		let mut first_error = None;

		while let Some(payload) = pending.pop_front() {
			if let Err(err) = self.transport.send(payload.clone()) {
				debug!("Send failed: {}", err);
				let outcome = dispatcher.handle_send_failure(&payload);
				self.publish(outcome.events);
				pending.extend(outcome.outbound);
				first_error.get_or_insert(err);
			}
		}
		first_error
	}
}


// vim: ts=4
