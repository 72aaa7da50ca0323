//! End-to-end client scenarios
//!
//! Runs frames through `AgentClient` with an in-memory transport and checks
//! what subscribers see and what goes out on the wire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::BufReader;

use agentwire::coalescer::CoalescerState;
use agentwire::protocol::Payload;
use agentwire::transport::{
	ChannelFrameSource, ChannelTransport, LineFrameSource, RecordingTransport, Transport,
};
use agentwire::{AgentClient, ClientConfig, ErrorOrigin, Event, ProtocolError};

const GIT_RESULT: &str =
	r#"{"type":"git_status_result","status":{"branch":"main","ahead":1,"behind":0,"files":[{"status":"M","path":"src/lib.rs"}]}}"#;

fn client_with(config: ClientConfig) -> AgentClient<RecordingTransport> {
	AgentClient::new(&config, Arc::new(RecordingTransport::new()))
}

fn client() -> AgentClient<RecordingTransport> {
	client_with(ClientConfig::default())
}

/// Refuses every payload while `down` is set
#[derive(Default)]
struct SwitchableTransport {
	down: AtomicBool,
	sent: Mutex<Vec<Payload>>,
}

impl Transport for SwitchableTransport {
	fn send(&self, payload: Payload) -> Result<(), ProtocolError> {
		if self.down.load(Ordering::SeqCst) {
			return Err(ProtocolError::TransportClosed);
		}
		self.sent.lock().unwrap().push(payload);
		Ok(())
	}
}

#[tokio::test]
async fn test_duplicate_git_status_sends_two_frames() {
	let client = client();
	let mut events = client.subscribe();

	client.git_status("/A").await.unwrap();
	client.git_status("/A").await.unwrap();
	client.git_status("/B").await.unwrap();
	assert_eq!(client.transport().sent().len(), 1);

	client.on_frame(GIT_RESULT).await;
	client.on_frame(GIT_RESULT).await;

	let sent = client.transport().sent();
	let paths: Vec<&str> = sent.iter().filter_map(|p| p["path"].as_str()).collect();
	assert_eq!(paths, vec!["/A", "/B"]);

	let attributed: Vec<String> = events
		.drain()
		.iter()
		.filter_map(|e| match e.as_ref() {
			Event::GitStatusResult { path, .. } => Some(path.clone()),
			_ => None,
		})
		.collect();
	assert_eq!(attributed, vec!["/A", "/B"]);
	assert_eq!(client.snapshot().await.git_status, CoalescerState::Idle);
}

#[tokio::test]
async fn test_reset_while_awaiting_then_send_immediately() {
	let client = client();
	client.git_status("/A").await.unwrap();
	client.git_status("/B").await.unwrap();

	client.on_connection_reset().await;
	let snapshot = client.snapshot().await;
	assert_eq!(snapshot.git_status, CoalescerState::Idle);
	assert!(snapshot.git_status_queue.is_empty());

	client.git_status("/C").await.unwrap();
	let kinds = client.transport().sent_kinds();
	assert_eq!(kinds, vec!["git_status", "git_status"]);
	assert_eq!(client.transport().sent()[1]["path"], "/C");
}

#[tokio::test]
async fn test_failed_git_status_send_does_not_block_retry() {
	let (transport, outbound) = ChannelTransport::channel();
	drop(outbound);
	let client = AgentClient::new(&ClientConfig::default(), Arc::new(transport));

	assert!(matches!(client.git_status("/a").await, Err(ProtocolError::TransportClosed)));
	assert_eq!(client.snapshot().await.git_status, CoalescerState::Idle);

	// The retry reaches the transport again instead of being swallowed as a duplicate
	assert!(matches!(client.git_status("/a").await, Err(ProtocolError::TransportClosed)));
	assert_eq!(client.snapshot().await.git_status, CoalescerState::Idle);
}

#[tokio::test]
async fn test_failed_queued_send_falls_through_to_idle() {
	let transport = Arc::new(SwitchableTransport::default());
	let client = AgentClient::new(&ClientConfig::default(), transport.clone());

	client.git_status("/a").await.unwrap();
	client.git_status("/b").await.unwrap();
	client.git_status("/c").await.unwrap();

	transport.down.store(true, Ordering::SeqCst);
	client.on_frame(GIT_RESULT).await;
	let snapshot = client.snapshot().await;
	assert_eq!(snapshot.git_status, CoalescerState::Idle);
	assert!(snapshot.git_status_queue.is_empty());

	transport.down.store(false, Ordering::SeqCst);
	client.git_status("/b").await.unwrap();
	let sent = transport.sent.lock().unwrap().clone();
	let paths: Vec<&str> = sent.iter().filter_map(|p| p["path"].as_str()).collect();
	assert_eq!(paths, vec!["/a", "/b"]);
	assert_eq!(client.snapshot().await.git_status, CoalescerState::AwaitingResult("/b".to_string()));
}

#[tokio::test]
async fn test_unknown_type_yields_exactly_one_error() {
	let client = client();
	let mut events = client.subscribe();

	client.on_frame(r#"{"type":"hologram","data":"x"}"#).await;

	let received = events.drain();
	assert_eq!(received.len(), 1);
	assert!(matches!(received[0].as_ref(), Event::Error { origin: ErrorOrigin::Protocol, .. }));
	assert!(client.transport().sent().is_empty());
}

#[tokio::test]
async fn test_auto_auth_reply() {
	let client = client_with(ClientConfig { auth_token: Some("hunter2".to_string()), ..ClientConfig::default() });
	client.on_frame(r#"{"type":"auth_required"}"#).await;

	let sent = client.transport().sent();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0]["type"], "auth");
	assert_eq!(sent[0]["token"], "hunter2");

	client.on_frame(r#"{"type":"auth_result","success":true}"#).await;
	assert!(client.snapshot().await.authenticated);
}

#[tokio::test]
async fn test_auto_auth_disabled() {
	let client = client_with(ClientConfig {
		auth_token: Some("hunter2".to_string()),
		auto_authenticate: false,
		..ClientConfig::default()
	});
	client.on_frame(r#"{"type":"auth_required"}"#).await;
	assert!(client.transport().sent().is_empty());
}

#[tokio::test]
async fn test_run_replays_lines_and_resets() {
	let client = client();
	let mut events = client.subscribe();

	let input = concat!(
		"{\"type\":\"status\",\"state\":\"running\"}\n",
		"{\"type\":\"output\",\"text\":\"working\"}\n",
		"\n",
		"{\"type\":\"file_chunk\",\"path\":\"/p\",\"chunkIndex\":0,\"totalChunks\":2,\"data\":\"AA==\",\"mimeType\":\"text/plain\",\"size\":2}\n",
	);
	let mut source = LineFrameSource::new(BufReader::new(input.as_bytes()));
	let frames = client.run(&mut source).await.unwrap();
	assert_eq!(frames, 3);

	let kinds: Vec<&'static str> = events.drain().iter().map(|e| e.kind()).collect();
	assert_eq!(kinds, vec!["connected", "status", "output", "chunk_progress", "connection_reset"]);

	let snapshot = client.snapshot().await;
	assert!(!snapshot.connected);
	assert!(snapshot.pending_transfers.is_empty());
	assert_eq!(client.reassembly_stats().await.dropped_transfers, 1);
}

#[tokio::test]
async fn test_concurrent_frames_and_commands() {
	let client = Arc::new(client());
	let mut events = client.subscribe();
	let (tx, mut source) = ChannelFrameSource::pair();

	let runner = {
		let client = client.clone();
		tokio::spawn(async move { client.run(&mut source).await })
	};

	for i in 0..50 {
		tx.send(format!(r#"{{"type":"output","text":"{}"}}"#, i)).unwrap();
		client.list_directory("/").await.unwrap();
	}
	drop(tx);
	runner.await.unwrap().unwrap();

	let texts: Vec<String> = events
		.drain()
		.iter()
		.filter_map(|e| match e.as_ref() {
			Event::Output { text, .. } => Some(text.clone()),
			_ => None,
		})
		.collect();
	let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
	assert_eq!(texts, expected);
	assert_eq!(client.transport().sent().len(), 50);
}

// vim: ts=4
