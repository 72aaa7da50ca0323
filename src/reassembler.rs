//! Chunked file transfer reassembly
//!
//! Large files arrive as `file_chunk` frames keyed by path. Chunks may come in
//! any order and may repeat; a transfer completes the moment every index in
//! `[0, total)` has been seen, and is then emitted as one `FileContent` event
//! with the chunks concatenated in index order.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::event::{ChunkProgress, Event};
use crate::protocol::{FileChunk, ProtocolError};
use crate::util::{decode_base64, encode_base64};

/// Partially received file
#[derive(Debug, Clone)]
pub struct PendingTransfer {
	/// Fixed at first observation
	total: u32,
	/// Index -> base64 chunk data
	chunks: BTreeMap<u32, String>,
	mime_type: String,
	size: i64,
}

impl PendingTransfer {
	fn new(total: u32, mime_type: String, size: i64) -> Self {
		PendingTransfer { total, chunks: BTreeMap::new(), mime_type, size }
	}

	pub fn total(&self) -> u32 {
		self.total
	}

	pub fn received(&self) -> usize {
		self.chunks.len()
	}

	pub fn mime_type(&self) -> &str {
		&self.mime_type
	}

	pub fn size(&self) -> i64 {
		self.size
	}

	/// Indices not yet received, ascending
	pub fn missing_indices(&self) -> Vec<u32> {
		(0..self.total).filter(|i| !self.chunks.contains_key(i)).collect()
	}

	fn is_complete(&self) -> bool {
		// Keys are always inside [0, total)
		self.chunks.len() == self.total as usize
	}

	/// Decode and concatenate in index order
	fn assemble(&self) -> Result<Vec<u8>, ProtocolError> {
		let mut combined = Vec::new();
		for data in self.chunks.values() {
			combined.extend_from_slice(&decode_base64(data)?);
		}
		Ok(combined)
	}
}

/// Result of feeding one chunk
#[derive(Debug)]
pub enum ChunkOutcome {
	/// Chunk recorded, transfer still incomplete
	Pending(ChunkProgress),

	/// Last missing chunk arrived; `content` is the consolidated `FileContent` event
	Complete { progress: ChunkProgress, content: Event },

	/// Transfer completed but some chunk was not valid base64; transfer discarded
	Corrupt { progress: ChunkProgress, error: ProtocolError },
}

/// Statistics about reassembly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
	pub pending_transfers: usize,
	pub completed_transfers: u64,
	/// Transfers restarted because the declared total changed
	pub inconsistent_resets: u64,
	pub rejected_chunks: u64,
	/// Partial transfers dropped by connection resets
	pub dropped_transfers: u64,
}

/// Accumulates chunks per path until complete
#[derive(Debug, Default)]
pub struct ChunkReassembler {
	pending: BTreeMap<String, PendingTransfer>,
	completed: u64,
	inconsistent_resets: u64,
	rejected: u64,
	dropped: u64,
}

impl ChunkReassembler {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record one chunk.
	///
	/// An index outside `[0, total)` or a non-positive total is rejected and
	/// leaves any existing transfer for the path untouched. A total that differs
	/// from the one first seen for the path restarts the transfer.
	pub fn accept(&mut self, chunk: FileChunk) -> Result<ChunkOutcome, ProtocolError> {
		let FileChunk { path, chunk_index, total_chunks, data, mime_type, size } = chunk;

		let total = match u32::try_from(total_chunks) {
			Ok(total) if total > 0 && chunk_index >= 0 && chunk_index < total_chunks => total,
			_ => {
				self.rejected += 1;
				return Err(ProtocolError::ChunkOutOfRange {
					path,
					index: chunk_index,
					total: total_chunks,
				});
			}
		};
		// Bounded by total above
		let index = chunk_index as u32;

		if let Some(existing) = self.pending.get(&path) {
			if existing.total != total {
				let err = ProtocolError::ProtocolInconsistency {
					path: path.clone(),
					expected_total: existing.total,
					received_total: total,
				};
				warn!("{}; restarting transfer", err);
				self.inconsistent_resets += 1;
				self.pending.remove(&path);
			}
		}

		let transfer = self
			.pending
			.entry(path.clone())
			.or_insert_with(|| PendingTransfer::new(total, mime_type, size));

		if transfer.chunks.insert(index, data).is_some() {
			debug!("Duplicate chunk {} for {}, keeping latest", index, path);
		}

		let progress = ChunkProgress { path: path.clone(), current: chunk_index, total: total_chunks };

		if !transfer.is_complete() {
			return Ok(ChunkOutcome::Pending(progress));
		}

		let Some(transfer) = self.pending.remove(&path) else {
			return Ok(ChunkOutcome::Pending(progress));
		};

		match transfer.assemble() {
			Ok(bytes) => {
				self.completed += 1;
				debug!("Reassembled {} ({} chunks, {} bytes)", path, transfer.total, bytes.len());
				let content = Event::FileContent {
					path,
					data: encode_base64(&bytes),
					mime_type: transfer.mime_type,
					size: transfer.size,
					truncated: false,
				};
				Ok(ChunkOutcome::Complete { progress, content })
			}
			Err(err) => {
				warn!("Discarding transfer {}: {}", path, err);
				Ok(ChunkOutcome::Corrupt { progress, error: err })
			}
		}
	}

	/// Drop every partial transfer. Returns how many were dropped.
	pub fn reset(&mut self) -> usize {
		let count = self.pending.len();
		if count > 0 {
			debug!("Dropping {} partial transfer(s)", count);
		}
		self.dropped += count as u64;
		self.pending.clear();
		count
	}

	pub fn pending(&self, path: &str) -> Option<&PendingTransfer> {
		self.pending.get(path)
	}

	pub fn pending_paths(&self) -> Vec<String> {
		self.pending.keys().cloned().collect()
	}

	pub fn is_idle(&self) -> bool {
		self.pending.is_empty()
	}

	pub fn stats(&self) -> ReassemblyStats {
		ReassemblyStats {
			pending_transfers: self.pending.len(),
			completed_transfers: self.completed,
			inconsistent_resets: self.inconsistent_resets,
			rejected_chunks: self.rejected,
			dropped_transfers: self.dropped,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chunk(path: &str, index: i64, total: i64, data: &str) -> FileChunk {
		FileChunk {
			path: path.to_string(),
			chunk_index: index,
			total_chunks: total,
			data: data.to_string(),
			mime_type: "image/png".to_string(),
			size: total,
		}
	}

	fn content_bytes(outcome: ChunkOutcome) -> Vec<u8> {
		match outcome {
			ChunkOutcome::Complete { content, .. } => content.binary_data().unwrap().unwrap(),
			other => panic!("expected completion, got {:?}", other),
		}
	}

	#[test]
	fn test_single_chunk_completes_immediately() {
		let mut r = ChunkReassembler::new();
		let bytes = content_bytes(r.accept(chunk("/a", 0, 1, "AAE=")).unwrap());
		assert_eq!(bytes, vec![0, 1]);
		assert!(r.is_idle());
	}

	#[test]
	fn test_out_of_order_concatenates_by_index() {
		let mut r = ChunkReassembler::new();
		assert!(matches!(r.accept(chunk("/a.png", 1, 2, "AQ==")).unwrap(), ChunkOutcome::Pending(_)));
		let bytes = content_bytes(r.accept(chunk("/a.png", 0, 2, "AA==")).unwrap());
		assert_eq!(bytes, vec![0, 1]);
	}

	#[test]
	fn test_duplicate_index_tolerated() {
		let mut r = ChunkReassembler::new();
		r.accept(chunk("/f", 1, 3, "AQ==")).unwrap();
		r.accept(chunk("/f", 1, 3, "AQ==")).unwrap();
		assert_eq!(r.pending("/f").unwrap().received(), 1);
		assert_eq!(r.pending("/f").unwrap().missing_indices(), vec![0, 2]);
		r.accept(chunk("/f", 0, 3, "AA==")).unwrap();
		let bytes = content_bytes(r.accept(chunk("/f", 2, 3, "Ag==")).unwrap());
		assert_eq!(bytes, vec![0, 1, 2]);
	}

	#[test]
	fn test_out_of_range_rejected_without_touching_entry() {
		let mut r = ChunkReassembler::new();
		r.accept(chunk("/f", 0, 2, "AA==")).unwrap();
		assert!(matches!(
			r.accept(chunk("/f", 2, 2, "AA==")),
			Err(ProtocolError::ChunkOutOfRange { index: 2, total: 2, .. })
		));
		assert!(r.accept(chunk("/f", -1, 2, "AA==")).is_err());
		assert!(r.accept(chunk("/g", 0, 0, "AA==")).is_err());
		assert_eq!(r.pending("/f").unwrap().received(), 1);
		assert_eq!(r.stats().rejected_chunks, 3);
	}

	#[test]
	fn test_total_change_restarts_transfer() {
		let mut r = ChunkReassembler::new();
		r.accept(chunk("/f", 0, 3, "AA==")).unwrap();
		r.accept(chunk("/f", 1, 2, "AQ==")).unwrap();
		let pending = r.pending("/f").unwrap();
		assert_eq!(pending.total(), 2);
		assert_eq!(pending.missing_indices(), vec![0]);
		assert_eq!(r.stats().inconsistent_resets, 1);
	}

	#[test]
	fn test_corrupt_chunk_discards_transfer() {
		let mut r = ChunkReassembler::new();
		r.accept(chunk("/f", 0, 2, "not base64!")).unwrap();
		match r.accept(chunk("/f", 1, 2, "AQ==")).unwrap() {
			ChunkOutcome::Corrupt { error, .. } => {
				assert!(matches!(error, ProtocolError::DecodeFailure(_)))
			}
			other => panic!("unexpected {:?}", other),
		}
		assert!(r.is_idle());
	}

	#[test]
	fn test_metadata_from_first_chunk() {
		let mut r = ChunkReassembler::new();
		let mut first = chunk("/f", 1, 2, "AQ==");
		first.mime_type = "text/plain".to_string();
		first.size = 99;
		r.accept(first).unwrap();
		let pending = r.pending("/f").unwrap();
		assert_eq!(pending.mime_type(), "text/plain");
		assert_eq!(pending.size(), 99);
		match r.accept(chunk("/f", 0, 2, "AA==")).unwrap() {
			ChunkOutcome::Complete { content: Event::FileContent { mime_type, size, truncated, .. }, .. } => {
				assert_eq!(mime_type, "text/plain");
				assert_eq!(size, 99);
				assert!(!truncated);
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn test_reset_drops_partials() {
		let mut r = ChunkReassembler::new();
		r.accept(chunk("/a", 0, 2, "AA==")).unwrap();
		r.accept(chunk("/b", 0, 2, "AA==")).unwrap();
		assert_eq!(r.reset(), 2);
		assert!(r.is_idle());
		assert_eq!(r.stats().dropped_transfers, 2);
	}
}

// vim: ts=4
