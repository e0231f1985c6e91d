//! Demo Application
//!
//! Drives one [`StreamSession`] against a terminal surface while a
//! simulated chat transport drips growing full-text snapshots, the way a
//! generation backend streams tokens. The app stays a thin client:
//! terminal events in, session control out, layout from the shared
//! surface every frame.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span as RSpan};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;
use tokio::sync::mpsc;

use flowmark_core::{
    PaceOptions, PulldownConverter, RenderSink, SessionState, StreamSession,
};

use crate::surface::MessageSurface;
use crate::theme::Theme;

/// Frame cadence, ~30 FPS
const FRAME: Duration = Duration::from_millis(33);

/// The canned assistant answer the simulated transport streams
const DEMO_ANSWER: &str = "# Streaming markdown\n\n\
This message arrives a few words at a time, the way a chat backend \
streams tokens, and renders progressively without ever splitting a word.\n\n\
What lands on the surface:\n\n\
- headings and *emphasis*\n\
- **bold** and `inline code`\n\
- fenced blocks\n\n\
```rust\nlet chunks = chunk(delta, 50);\n```\n\n\
Links work too: [ratatui](https://ratatui.rs) renders the cells.\n\n\
---\n\n\
Press `s` to stop the stream mid-flight, `r` to run it again.";

/// How many characters the simulated transport adds per tick
const TOKEN_STEP: usize = 7;

/// Pause between simulated tokens
const TOKEN_GAP: Duration = Duration::from_millis(24);

/// Main application state
pub struct App {
    /// Is the app still running?
    running: bool,
    /// The streaming session, owning write access to the surface
    session: StreamSession<MessageSurface, PulldownConverter>,
    /// Read handle onto the same surface, for layout
    surface: MessageSurface,
    theme: Theme,
    opts: PaceOptions,
    /// Snapshot feed from the simulated transport, while one is live
    transport: Option<mpsc::Receiver<String>>,
    /// Scroll offset in laid-out lines
    scroll: usize,
    /// Pin the view to the newest content while streaming
    follow: bool,
}

impl App {
    /// Create the app with the given pacing options
    pub fn new(opts: PaceOptions) -> Self {
        let surface = MessageSurface::new();
        let sink = RenderSink::new(surface.clone(), PulldownConverter::new());
        Self {
            running: true,
            session: StreamSession::new(sink),
            surface,
            theme: Theme::default(),
            opts,
            transport: None,
            scroll: 0,
            follow: true,
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();

        self.start_stream().await?;
        self.render(terminal)?;

        while self.running {
            tokio::select! {
                biased;

                maybe_event = events.next() => {
                    if let Some(Ok(Event::Key(key))) = maybe_event {
                        if key.kind == KeyEventKind::Press {
                            self.handle_key(key).await?;
                        }
                    }
                }

                () = tokio::time::sleep(FRAME) => {}
            }

            // Drain whatever the transport produced since last frame.
            self.pump_transport().await?;

            self.render(terminal)?;
        }

        // Leave no pacer behind.
        self.session.interrupt().await?;
        Ok(())
    }

    /// Start (or restart) the simulated stream
    async fn start_stream(&mut self) -> anyhow::Result<()> {
        // Dropping the old receiver stops a previous producer task.
        self.transport = None;

        let (tx, rx) = mpsc::channel::<String>(32);
        tokio::spawn(async move {
            let chars: Vec<char> = DEMO_ANSWER.chars().collect();
            let mut end = 0;
            while end < chars.len() {
                end = (end + TOKEN_STEP).min(chars.len());
                let snapshot: String = chars[..end].iter().collect();
                if tx.send(snapshot).await.is_err() {
                    // Receiver gone: the user stopped or restarted.
                    return;
                }
                tokio::time::sleep(TOKEN_GAP).await;
            }
        });

        self.session.begin(self.opts).await?;
        self.surface.set_streaming(true);
        self.transport = Some(rx);
        self.scroll = 0;
        self.follow = true;
        tracing::debug!("demo stream started");
        Ok(())
    }

    /// Stop the stream mid-flight, annotating the cut
    async fn stop_stream(&mut self) -> anyhow::Result<()> {
        if self.transport.take().is_none() {
            return Ok(());
        }
        self.session.interrupt().await?;
        self.surface.set_streaming(false);
        if let Some(sink) = self.session.sink_mut() {
            sink.append("*— stream stopped —*");
        }
        Ok(())
    }

    /// Feed pending snapshots; close out the session when the transport ends
    async fn pump_transport(&mut self) -> anyhow::Result<()> {
        let mut finished = false;
        let mut latest = None;
        if let Some(rx) = self.transport.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(snapshot) => latest = Some(snapshot),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        finished = true;
                        break;
                    }
                }
            }
        }

        if let Some(snapshot) = latest {
            self.session.feed(&snapshot)?;
        }
        if finished {
            self.transport = None;
            let state = self.session.complete().await?;
            self.surface.set_streaming(false);
            tracing::debug!(?state, "demo stream finished");
        }
        Ok(())
    }

    async fn handle_key(&mut self, key: event::KeyEvent) -> anyhow::Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('s') => self.stop_stream().await?,
            KeyCode::Char('r') => self.start_stream().await?,
            KeyCode::Up | KeyCode::Char('k') => {
                self.follow = false;
                self.scroll = self.scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_add(1);
            }
            KeyCode::Home => {
                self.follow = false;
                self.scroll = 0;
            }
            KeyCode::End => self.follow = true,
            _ => {}
        }
        Ok(())
    }

    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let lines = self.surface.lines(
            terminal.size().map(|s| s.width).unwrap_or(80).saturating_sub(2),
            &self.theme,
        );
        let state = self.session.state();
        let streaming = self.session.is_streaming();

        terminal.draw(|frame| {
            let area = frame.area();
            if area.height < 2 {
                return;
            }
            let body = Rect::new(area.x + 1, area.y, area.width.saturating_sub(2), area.height - 1);
            let status_area = Rect::new(area.x, area.y + area.height - 1, area.width, 1);

            let max_scroll = lines.len().saturating_sub(body.height as usize);
            if self.follow {
                self.scroll = max_scroll;
            } else {
                self.scroll = self.scroll.min(max_scroll);
            }

            let paragraph = Paragraph::new(lines).scroll((self.scroll as u16, 0));
            frame.render_widget(paragraph, body);

            let status = match (streaming, state) {
                (true, _) => "streaming…",
                (false, SessionState::Interrupted) => "interrupted",
                (false, SessionState::Completed) => "done",
                (false, _) => "idle",
            };
            let footer = Line::from(vec![
                RSpan::styled(format!(" {status} "), self.theme.cursor),
                RSpan::styled(
                    " q quit · s stop · r restart · ↑/↓ scroll",
                    self.theme.marker,
                ),
            ]);
            frame.render_widget(Paragraph::new(footer), status_area);
        })?;
        Ok(())
    }
}
