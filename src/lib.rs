//! # adk-client - Streaming client for conversational agent servers
//!
//! A small async client for agent servers that expose session creation and a
//! `/run_sse` endpoint streaming agent events as Server-Sent Events.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental SSE decoding that is independent of chunk boundaries
//! - Typed, UI-facing events: transient status lines and appendable text
//! - Malformed events are logged through `tracing` and skipped, never fatal
//!
//! ## Architecture
//!
//! Raw transport chunks flow through three stages before reaching the caller:
//!
//! 1. **`FrameBuffer`** splits the byte stream into complete blank-line
//!    delimited frames, carrying incomplete tails between chunks
//! 2. **`parse_frame`** keeps the payload of `data:` frames only
//! 3. **`classify`** maps each JSON payload to zero or more `ApplicationEvent`s
//!
//! [`EventStream`] drives the stages lazily: nothing is read from the
//! transport until the consumer polls for the next event.
//!
//! ## Example
//! ```no_run
//! use adk_client::{AdkClient, AgentService, ApplicationEvent};
//! use adk_client::options::{AgentOptions, TransportOptions};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AdkClient::new(
//!         AgentOptions::new("agent", "user-1"),
//!         TransportOptions::default(),
//!     )?;
//!
//!     let session = client.create_session().await?;
//!     let mut events = client.send_message(&session, "Hello!").await?;
//!
//!     while let Some(event) = events.next().await {
//!         match event? {
//!             ApplicationEvent::Status { message } => eprintln!("{}", message),
//!             ApplicationEvent::Text { content } => print!("{}", content),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod event;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use client::{AdkClient, AgentService, ClientError};
pub use event::{classify, AgentEvent, ApplicationEvent};
pub use model::Session;
pub use stream::{decode_events, EventStream, StreamState};
