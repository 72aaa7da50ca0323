//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use agentwire::logging::*;
//!
//! info!("Connected");
//! warn!("Dropping frame");
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` takes precedence over `default_filter` when set:
///
/// ```bash
/// RUST_LOG=debug agentwire replay frames.jsonl
/// RUST_LOG=agentwire::dispatcher=debug,agentwire::event_bus=trace agentwire replay -
/// ```
pub fn init_tracing(default_filter: &str) {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
		)
		.with_writer(std::io::stderr)
		.try_init();
}

// vim: ts=4
