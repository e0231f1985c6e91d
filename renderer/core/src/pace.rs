//! Pacing
//!
//! The cancellable scheduling primitive that releases chunks to the render
//! sink at a configured cadence. Between releases the pacer suspends with
//! `tokio::time::sleep` — cooperative yielding, never a blocked thread —
//! so the hosting application keeps running between chunk renders.
//!
//! Cancellation is a watch flag checked between releases: an in-flight
//! release finishes, nothing further is released, and whatever was already
//! rendered stays rendered.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::chunker::Chunk;
use crate::convert::MarkdownConvert;
use crate::sink::{RenderSink, RenderTarget};

/// Release cadence for a stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaceMode {
    /// One character per tick, re-rendering the full accumulated text each
    /// time. Legacy compatibility path: O(n) suspension points and O(n²)
    /// conversion work over a session.
    Character,
    /// One chunk (or one batch of chunks) per tick, one append per
    /// release. Bounds re-renders by chunk count instead of character
    /// count; the default.
    #[default]
    Chunk,
    /// Everything in a single update, for already-complete messages.
    Instant,
}

/// Pacing configuration for one stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceOptions {
    /// Release cadence
    pub mode: PaceMode,
    /// Suspension between releases
    pub interval: Duration,
    /// Word-safe chunk target, in characters
    pub target_chunk_size: usize,
    /// Chunks coalesced into one release (chunk mode only)
    pub batch: usize,
}

impl Default for PaceOptions {
    fn default() -> Self {
        Self {
            mode: PaceMode::default(),
            interval: Duration::from_millis(10),
            target_chunk_size: 50,
            batch: 1,
        }
    }
}

impl PaceOptions {
    /// Options for instant (single-update) rendering
    pub fn instant() -> Self {
        Self {
            mode: PaceMode::Instant,
            ..Default::default()
        }
    }

    /// Set the release cadence
    pub fn with_mode(mut self, mode: PaceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the suspension between releases
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the word-safe chunk target (clamped to at least 1)
    pub fn with_chunk_size(mut self, target: usize) -> Self {
        self.target_chunk_size = target.max(1);
        self
    }

    /// Set the chunk batching factor (clamped to at least 1)
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch.max(1);
        self
    }
}

/// How a pacing run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PaceOutcome {
    /// The queue closed and every chunk was released
    Completed,
    /// Cancellation stopped the run; released content stays rendered
    Cancelled,
}

/// Drives a chunk queue into a render sink at the configured cadence.
///
/// Owns the sink for the lifetime of the run; the session gets it back
/// with the outcome when the run ends.
pub(crate) struct Pacer<T, C> {
    sink: RenderSink<T, C>,
    queue: mpsc::UnboundedReceiver<Chunk>,
    cancel: watch::Receiver<bool>,
    commit: watch::Sender<usize>,
    opts: PaceOptions,
    /// Full accumulated text, maintained for character-mode re-renders
    released: String,
    committed: usize,
}

impl<T: RenderTarget, C: MarkdownConvert> Pacer<T, C> {
    pub(crate) fn new(
        sink: RenderSink<T, C>,
        queue: mpsc::UnboundedReceiver<Chunk>,
        cancel: watch::Receiver<bool>,
        commit: watch::Sender<usize>,
        opts: PaceOptions,
    ) -> Self {
        Self {
            sink,
            queue,
            cancel,
            commit,
            opts,
            released: String::new(),
            committed: 0,
        }
    }

    /// Run until the queue closes or cancellation wins.
    pub(crate) async fn run(mut self) -> (RenderSink<T, C>, PaceOutcome) {
        let outcome = match self.opts.mode {
            PaceMode::Instant => self.run_instant().await,
            PaceMode::Chunk => self.run_chunks().await,
            PaceMode::Character => self.run_characters().await,
        };
        tracing::debug!(?outcome, bytes = self.committed, "pacer finished");
        (self.sink, outcome)
    }

    /// Instant cadence: every chunk renders the moment it arrives.
    async fn run_instant(&mut self) -> PaceOutcome {
        loop {
            let chunk = match self.next_chunk().await {
                Ok(chunk) => chunk,
                Err(outcome) => return outcome,
            };
            self.sink.append(&chunk.text);
            self.advance(chunk.text.len());
        }
    }

    /// Chunk cadence: one append per release, optionally batched.
    async fn run_chunks(&mut self) -> PaceOutcome {
        loop {
            let first = match self.next_chunk().await {
                Ok(chunk) => chunk,
                Err(outcome) => return outcome,
            };
            let mut text = first.text;
            for _ in 1..self.opts.batch.max(1) {
                match self.queue.try_recv() {
                    Ok(chunk) => text.push_str(&chunk.text),
                    Err(_) => break,
                }
            }
            self.sink.append(&text);
            self.advance(text.len());
            tracing::debug!(bytes = text.len(), "released chunk");
            if !self.pause().await {
                return PaceOutcome::Cancelled;
            }
        }
    }

    /// Character cadence: each character is its own release and re-renders
    /// the whole accumulated text.
    async fn run_characters(&mut self) -> PaceOutcome {
        loop {
            let chunk = match self.next_chunk().await {
                Ok(chunk) => chunk,
                Err(outcome) => return outcome,
            };
            for ch in chunk.text.chars() {
                if *self.cancel.borrow() {
                    return PaceOutcome::Cancelled;
                }
                self.released.push(ch);
                self.sink.replace_all(&self.released);
                self.advance(ch.len_utf8());
                if !self.pause().await {
                    return PaceOutcome::Cancelled;
                }
            }
        }
    }

    /// Wait for the next chunk, the queue to close, or cancellation.
    async fn next_chunk(&mut self) -> Result<Chunk, PaceOutcome> {
        loop {
            if *self.cancel.borrow() {
                return Err(PaceOutcome::Cancelled);
            }
            tokio::select! {
                biased;

                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        // Flag raised, or the controller vanished entirely.
                        return Err(PaceOutcome::Cancelled);
                    }
                }

                next = self.queue.recv() => match next {
                    Some(chunk) => return Ok(chunk),
                    None => return Err(PaceOutcome::Completed),
                },
            }
        }
    }

    /// Suspend between releases. Returns `false` when cancellation fired
    /// during the pause.
    async fn pause(&mut self) -> bool {
        if self.opts.interval.is_zero() {
            // Still yield so other work interleaves between releases.
            tokio::task::yield_now().await;
            return !*self.cancel.borrow();
        }
        tokio::select! {
            biased;

            changed = self.cancel.changed() => {
                changed.is_err() || !*self.cancel.borrow()
            }

            () = tokio::time::sleep(self.opts.interval) => true,
        }
    }

    /// Advance the commit watermark by `bytes` of rendered text.
    fn advance(&mut self, bytes: usize) {
        self.committed += bytes;
        self.commit.send_replace(self.committed);
    }
}
