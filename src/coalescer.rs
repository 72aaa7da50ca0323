//! Git status request coalescing
//!
//! The server answers `git_status` without echoing the requested path, so a
//! result can only be attributed to the single outstanding request. This
//! module keeps at most one request in flight and queues the rest FIFO,
//! ignoring requests for paths already queued or in flight.

use std::collections::VecDeque;
use tracing::debug;

/// Coalescer state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoalescerState {
	Idle,
	AwaitingResult(String),
}

/// A result matched to its request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
	/// Path the result belongs to
	pub path: String,
	/// Queued path that must be sent now, if any
	pub next: Option<String>,
}

/// Serializes git status requests for one connection
#[derive(Debug, Default)]
pub struct GitStatusCoalescer {
	in_flight: Option<String>,
	queue: VecDeque<String>,
}

impl GitStatusCoalescer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a request. Returns the path to send right away, if any.
	pub fn request(&mut self, path: &str) -> Option<String> {
		match &self.in_flight {
			None => {
				self.in_flight = Some(path.to_string());
				Some(path.to_string())
			}
			Some(current) if current == path => {
				debug!("git status for {} already in flight", path);
				None
			}
			Some(_) => {
				if self.queue.iter().any(|queued| queued == path) {
					debug!("git status for {} already queued", path);
				} else {
					self.queue.push_back(path.to_string());
				}
				None
			}
		}
	}

	/// Match a received result to the in-flight request and advance the queue.
	/// Returns `None` when nothing was in flight.
	pub fn complete(&mut self) -> Option<Completion> {
		let path = self.in_flight.take()?;
		let next = self.queue.pop_front();
		self.in_flight = next.clone();
		Some(Completion { path, next })
	}

	/// The in-flight request never reached the server. Drops it and promotes
	/// the next queued path, which the caller must send in turn.
	pub fn abandon(&mut self) -> Option<String> {
		let path = self.in_flight.take()?;
		debug!("git status for {} abandoned", path);
		self.in_flight = self.queue.pop_front();
		self.in_flight.clone()
	}

	/// Forget everything; no results are produced for dropped requests.
	/// Returns the number of requests dropped, in flight included.
	pub fn reset(&mut self) -> usize {
		let dropped = self.queue.len() + usize::from(self.in_flight.is_some());
		self.queue.clear();
		self.in_flight = None;
		dropped
	}

	pub fn state(&self) -> CoalescerState {
		match &self.in_flight {
			None => CoalescerState::Idle,
			Some(path) => CoalescerState::AwaitingResult(path.clone()),
		}
	}

	pub fn in_flight(&self) -> Option<&str> {
		self.in_flight.as_deref()
	}

	pub fn queued(&self) -> Vec<String> {
		self.queue.iter().cloned().collect()
	}
}


// vim: ts=4
