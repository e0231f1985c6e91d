//! Flowmark TUI - Terminal surface for the streaming markdown renderer
//!
//! This crate provides the terminal side of flowmark:
//!
//! - **Surface**: a shareable render target backed by styled terminal lines
//! - **Theme**: per-surface styling, passed at construction
//! - **App**: a demo that streams a canned answer through a simulated
//!   chat transport with live interrupt and restart

pub mod app;
pub mod surface;
pub mod theme;

pub use app::App;
pub use surface::MessageSurface;
pub use theme::Theme;
