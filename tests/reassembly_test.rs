//! Chunked transfer tests
//!
//! Drives file_chunk frames through the dispatcher in various arrival
//! orders and checks the consolidated file_content event.

use agentwire::dispatcher::Dispatcher;
use agentwire::util::{decode_base64, encode_base64};
use agentwire::{ClientConfig, ErrorOrigin, Event};

fn chunk_frame(path: &str, index: i64, total: i64, data: &str) -> String {
	format!(
		r#"{{"type":"file_chunk","path":"{}","chunkIndex":{},"totalChunks":{},"data":"{}","mimeType":"image/png","size":{}}}"#,
		path, index, total, data, total
	)
}

fn quiet_dispatcher() -> Dispatcher {
	Dispatcher::new(&ClientConfig { emit_chunk_progress: false, ..ClientConfig::default() })
}

/// Feed chunks in `order` and collect every event
fn feed(d: &mut Dispatcher, path: &str, parts: &[&str], order: &[usize]) -> Vec<Event> {
	let total = parts.len() as i64;
	order
		.iter()
		.flat_map(|&i| d.handle_frame(&chunk_frame(path, i as i64, total, parts[i])).events)
		.collect()
}

fn file_contents(events: &[Event]) -> Vec<(String, Vec<u8>)> {
	events
		.iter()
		.filter_map(|e| match e {
			Event::FileContent { path, data, .. } => Some((path.clone(), decode_base64(data).unwrap())),
			_ => None,
		})
		.collect()
}

#[test]
fn test_two_chunks_reversed() {
	let mut d = quiet_dispatcher();
	let events = feed(&mut d, "/a.png", &["AA==", "AQ=="], &[1, 0]);
	assert_eq!(file_contents(&events), vec![("/a.png".to_string(), vec![0u8, 1u8])]);
	assert!(d.snapshot().pending_transfers.is_empty());
}

#[test]
fn test_arrival_orders_produce_same_bytes() {
	let raw: [&[u8]; 3] = [b"abc", b"def", b"gh"];
	let parts: Vec<String> = raw.iter().map(|p| encode_base64(p)).collect();
	let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

	for order in [vec![0, 1, 2], vec![2, 0, 1], vec![1, 2, 0], vec![1, 1, 0, 2]] {
		let mut d = quiet_dispatcher();
		let events = feed(&mut d, "/f.bin", &parts, &order);
		let contents = file_contents(&events);
		assert_eq!(contents.len(), 1, "order {:?}", order);
		assert_eq!(contents[0].1, b"abcdefgh".to_vec(), "order {:?}", order);
	}
}

#[test]
fn test_interleaved_paths_are_independent() {
	let mut d = quiet_dispatcher();
	let mut events = Vec::new();
	events.extend(d.handle_frame(&chunk_frame("/x", 1, 2, "AQ==")).events);
	events.extend(d.handle_frame(&chunk_frame("/y", 0, 2, "Ag==")).events);
	events.extend(d.handle_frame(&chunk_frame("/x", 0, 2, "AA==")).events);
	assert_eq!(d.snapshot().pending_transfers, vec!["/y".to_string()]);
	events.extend(d.handle_frame(&chunk_frame("/y", 1, 2, "Aw==")).events);

	assert_eq!(
		file_contents(&events),
		vec![("/x".to_string(), vec![0, 1]), ("/y".to_string(), vec![2, 3])]
	);
}

#[test]
fn test_out_of_range_index_is_error_event() {
	let mut d = quiet_dispatcher();
	d.handle_frame(&chunk_frame("/a", 0, 2, "AA=="));
	let events = d.handle_frame(&chunk_frame("/a", 5, 2, "AA==")).events;
	assert_eq!(events.len(), 1);
	assert!(matches!(events[0], Event::Error { origin: ErrorOrigin::Protocol, .. }));
	assert_eq!(d.reassembly_stats().rejected_chunks, 1);

	// Existing transfer untouched
	let events = d.handle_frame(&chunk_frame("/a", 1, 2, "AQ==")).events;
	assert_eq!(file_contents(&events), vec![("/a".to_string(), vec![0, 1])]);
}

#[test]
fn test_changed_total_restarts_transfer() {
	let mut d = quiet_dispatcher();
	d.handle_frame(&chunk_frame("/a", 0, 3, "AA=="));
	let events = d.handle_frame(&chunk_frame("/a", 0, 2, "Bw==")).events;
	assert!(events.is_empty());
	assert_eq!(d.reassembly_stats().inconsistent_resets, 1);

	let events = d.handle_frame(&chunk_frame("/a", 1, 2, "CA==")).events;
	assert_eq!(file_contents(&events), vec![("/a".to_string(), vec![7, 8])]);
}

#[test]
fn test_reset_discards_partial_transfer() {
	let mut d = quiet_dispatcher();
	d.handle_frame(&chunk_frame("/a", 0, 2, "AA=="));
	d.handle_reset();
	assert!(d.snapshot().pending_transfers.is_empty());

	// A late chunk starts a fresh transfer instead of completing the old one
	let events = d.handle_frame(&chunk_frame("/a", 1, 2, "AQ==")).events;
	assert!(file_contents(&events).is_empty());
	assert_eq!(d.snapshot().pending_transfers, vec!["/a".to_string()]);
}

#[test]
fn test_progress_reported_per_chunk() {
	let mut d = Dispatcher::new(&ClientConfig::default());
	let events = feed(&mut d, "/a.png", &["AA==", "AQ=="], &[1, 0]);
	let progress: Vec<(i64, i64)> = events
		.iter()
		.filter_map(|e| match e {
			Event::ChunkProgress(p) => Some((p.current, p.total)),
			_ => None,
		})
		.collect();
	assert_eq!(progress, vec![(1, 2), (0, 2)]);
}

// vim: ts=4
