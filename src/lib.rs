//! # agentwire - Client Protocol Layer for Remote Coding Agents
//!
//! agentwire speaks the JSON message protocol used between a remote
//! coding-agent server and its clients. It decodes inbound frames into typed
//! messages, reassembles chunked file transfers, coalesces git status
//! requests and publishes everything as ordered events.
//!
//! The crate never opens a socket: transports hand frames in and take
//! payloads out.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use agentwire::{AgentClient, ClientConfig, Event};
//! use agentwire::transport::ChannelTransport;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (transport, mut outbound) = ChannelTransport::channel();
//!     let client = AgentClient::new(&ClientConfig::default(), Arc::new(transport));
//!     let mut events = client.subscribe();
//!
//!     client.on_connected().await;
//!     client.chat("List the repository", Some("/work"), None, true).await?;
//!     client.on_frame(r#"{"type":"output","text":"Looking..."}"#).await;
//!
//!     while let Some(event) = events.try_recv() {
//!         println!("{:?}", event);
//!     }
//!     println!("sent: {:?}", outbound.try_recv());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod coalescer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod logging;
pub mod protocol;
pub mod reassembler;
pub mod transport;
pub mod util;

// Re-export commonly used types
pub use client::{AgentClient, ClientSnapshot};
pub use config::ClientConfig;
pub use error::ClientError;
pub use event::{ChunkProgress, ErrorOrigin, Event};
pub use event_bus::{EventBus, Subscription};
pub use protocol::{Command, ProtocolError, ServerMessage};

// vim: ts=4
