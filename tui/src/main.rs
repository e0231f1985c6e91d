//! flowmark-tui entry point
//!
//! Terminal setup and teardown around the demo [`App`]. Pacing can be
//! tuned from the environment:
//!
//! - `FLOWMARK_INTERVAL_MS`: pause between chunk releases (default 10)
//! - `FLOWMARK_CHUNK_SIZE`: word-safe chunk target in chars (default 50)
//! - `FLOWMARK_MODE`: `chunk`, `char`, or `instant` (default `chunk`)

use std::io;
use std::time::Duration;

use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use flowmark_core::{PaceMode, PaceOptions};
use flowmark_tui::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(pace_options_from_env());
    let result = app.run(&mut terminal).await;

    io::stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    result
}

/// Pacing options with environment overrides
fn pace_options_from_env() -> PaceOptions {
    let interval: u64 = std::env::var("FLOWMARK_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    let chunk_size: usize = std::env::var("FLOWMARK_CHUNK_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);
    let mode = match std::env::var("FLOWMARK_MODE").as_deref() {
        Ok("char") | Ok("character") => PaceMode::Character,
        Ok("instant") => PaceMode::Instant,
        _ => PaceMode::Chunk,
    };

    PaceOptions::default()
        .with_mode(mode)
        .with_interval(Duration::from_millis(interval))
        .with_chunk_size(chunk_size)
}
