//! Flowmark Core - Incremental Streaming Markdown Rendering
//!
//! This crate renders chat responses that arrive incrementally (token by
//! token from a generation backend) as progressively revealed rich text,
//! without flicker, without splitting words mid-render, and without
//! re-parsing content that has already been committed to the surface.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Hosting application                       │
//! │   (chat transport drips full-text snapshots as tokens land)  │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ feed(snapshot)
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                      StreamSession                            │
//! │   delta = unseen suffix ──▶ Chunker ──▶ word-safe chunks     │
//! │                                │                              │
//! │                              Pacer  (interval, mode, cancel) │
//! │                                │                              │
//! │                           RenderSink                          │
//! │                     converter ─┴─ RenderTarget               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`StreamSession`]: orchestrates one streaming render end-to-end
//! - [`PaceOptions`] / [`PaceMode`]: cadence configuration
//! - [`RenderSink`]: converter + target, with graceful degradation
//! - [`RenderTarget`]: the surface trait implemented by hosts
//! - [`MarkdownConvert`]: the conversion seam (default: pulldown-cmark)
//! - [`chunker::chunk`]: word-safe splitting of pending deltas
//!
//! # Quick Start
//!
//! ```ignore
//! use flowmark_core::{
//!     MemoryTarget, PaceOptions, PulldownConverter, RenderSink, StreamSession,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let sink = RenderSink::new(MemoryTarget::new(), PulldownConverter::new());
//!     let mut session = StreamSession::new(sink);
//!
//!     // One-shot pacing of a complete message:
//!     let opts = PaceOptions::default().with_interval(Duration::from_millis(10));
//!     session.stream_markdown("Hello **world**", opts).await.unwrap();
//!
//!     // Or drip-feed growing snapshots from a transport:
//!     session.begin(opts).await.unwrap();
//!     session.feed("Hello").unwrap();
//!     session.feed("Hello **world**").unwrap();
//!     session.complete().await.unwrap();
//! }
//! ```
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework. Surfaces implement [`RenderTarget`] and decide how blocks
//! become pixels or terminal cells; the core never knows.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chunker;
pub mod convert;
pub mod error;
pub mod pace;
pub mod session;
pub mod sink;
pub mod text;

// Re-exports for convenience
pub use chunker::{chunk, Chunk};
pub use convert::{MarkdownConvert, PulldownConverter};
pub use error::{ConvertError, SessionError};
pub use pace::{PaceMode, PaceOptions};
pub use session::{SessionState, StreamSession};
pub use sink::{MemoryTarget, RenderSink, RenderTarget};
pub use text::{Block, Span, SpanStyle};
