//! Transport boundary
//!
//! The protocol core never touches sockets. Outbound payloads are handed to a
//! `Transport` (fire-and-forget); inbound frames are pulled from a
//! `FrameSource` that already delimits the byte stream into frames.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::trace;

use crate::protocol::codec::{to_frame, Payload};
use crate::protocol::ProtocolError;

/// Outbound side of a connection
pub trait Transport: Send + Sync {
	/// Queue one payload for sending. Must not wait on the network.
	fn send(&self, payload: Payload) -> Result<(), ProtocolError>;
}

/// Inbound side of a connection
#[async_trait]
pub trait FrameSource: Send {
	/// Next frame text, or `None` when the connection ended
	async fn next_frame(&mut self) -> Result<Option<String>, ProtocolError>;
}

/// Serializes payloads to JSON text onto a channel drained by a writer task
#[derive(Debug, Clone)]
pub struct ChannelTransport {
	tx: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
	/// Create a transport and the receiver the writer task reads from
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(ChannelTransport { tx }, rx)
	}
}

impl Transport for ChannelTransport {
	fn send(&self, payload: Payload) -> Result<(), ProtocolError> {
		let frame = to_frame(payload);
		trace!("-> {}", frame);
		self.tx.send(frame).map_err(|_| ProtocolError::TransportClosed)
	}
}

/// Keeps sent payloads in memory; useful for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingTransport {
	sent: Mutex<Vec<Payload>>,
}

impl RecordingTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Everything sent so far, in order
	pub fn sent(&self) -> Vec<Payload> {
		self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
	}

	/// Discriminators of everything sent so far
	pub fn sent_kinds(&self) -> Vec<String> {
		self.sent()
			.iter()
			.filter_map(|p| p.get("type").and_then(|t| t.as_str()).map(str::to_string))
			.collect()
	}
}

impl Transport for RecordingTransport {
	fn send(&self, payload: Payload) -> Result<(), ProtocolError> {
		self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(payload);
		Ok(())
	}
}

/// Newline-delimited frames from any async reader; blank lines are skipped
pub struct LineFrameSource<R> {
	lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineFrameSource<R> {
	pub fn new(reader: R) -> Self {
		LineFrameSource { lines: reader.lines() }
	}
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for LineFrameSource<R> {
	async fn next_frame(&mut self) -> Result<Option<String>, ProtocolError> {
		loop {
			match self.lines.next_line().await? {
				None => return Ok(None),
				Some(line) if line.trim().is_empty() => continue,
				Some(line) => {
					trace!("<- {}", line);
					return Ok(Some(line));
				}
			}
		}
	}
}

/// Frames from a channel fed by a reader task (e.g. a WebSocket)
pub struct ChannelFrameSource {
	rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelFrameSource {
	/// Create a source and the sender the reader task feeds
	pub fn pair() -> (mpsc::UnboundedSender<String>, Self) {
		let (tx, rx) = mpsc::unbounded_channel();
		(tx, ChannelFrameSource { rx })
	}
}

#[async_trait]
impl FrameSource for ChannelFrameSource {
	async fn next_frame(&mut self) -> Result<Option<String>, ProtocolError> {
		Ok(self.rx.recv().await)
	}
}


// vim: ts=4
