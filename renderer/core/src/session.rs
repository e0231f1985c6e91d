//! Stream Session
//!
//! Orchestrates one streaming render end-to-end: tracks the text accepted
//! so far, cuts deltas out of newly supplied full-text snapshots, feeds
//! the pacer, and exposes cancellation and an awaitable completion.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ── begin ──▶ Streaming ── complete ──▶ Completed
//!                      │  ▲                       │
//!                      │  └── feed (re-entrant)   │
//!                      └──── interrupt ──▶ Interrupted
//!                                  (reset returns any state to Idle)
//! ```
//!
//! At most one pacer is active per session; `begin` while streaming first
//! cancels the previous pacer so two streams can never interleave writes
//! on the same render target.
//!
//! # Bookkeeping
//!
//! The session tracks two watermarks. `seen` is the last accepted snapshot
//! and is the cut point for deltas, so the same text is never enqueued
//! twice. The commit watermark advances only as chunks actually render and
//! is what [`StreamSession::committed_len`] reports: non-decreasing for
//! the lifetime of a stream and never beyond the latest snapshot.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::chunker::{chunk, Chunk};
use crate::convert::MarkdownConvert;
use crate::error::SessionError;
use crate::pace::{PaceMode, PaceOptions, PaceOutcome, Pacer};
use crate::sink::{RenderSink, RenderTarget};

/// Session lifecycle state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No stream has run yet, or the session was reset
    #[default]
    Idle,
    /// A pacer is active and accepting deltas
    Streaming,
    /// The stream drained completely
    Completed,
    /// The stream was cancelled; released content stays rendered
    Interrupted,
}

/// Control side of one running pacer
struct ActivePacer<T, C> {
    feed: mpsc::UnboundedSender<Chunk>,
    cancel: watch::Sender<bool>,
    commit: watch::Receiver<usize>,
    task: JoinHandle<(RenderSink<T, C>, PaceOutcome)>,
}

/// One streaming render of one message onto one render target.
///
/// The session owns its [`RenderSink`] exclusively. While a stream is
/// active the sink lives inside the pacer task; it comes back when the
/// stream completes or is interrupted, so annotations (for example a
/// "stream stopped" marker) can be appended as ordinary content.
pub struct StreamSession<T, C> {
    state: SessionState,
    /// Last accepted snapshot; deltas are cut against its length
    seen: String,
    /// Bytes rendered, frozen here whenever no pacer is active
    committed: usize,
    opts: PaceOptions,
    sink: Option<RenderSink<T, C>>,
    pacer: Option<ActivePacer<T, C>>,
}

impl<T: RenderTarget, C: MarkdownConvert> StreamSession<T, C> {
    /// Create an idle session owning `sink`
    pub fn new(sink: RenderSink<T, C>) -> Self {
        Self {
            state: SessionState::Idle,
            seen: String::new(),
            committed: 0,
            opts: PaceOptions::default(),
            sink: Some(sink),
            pacer: None,
        }
    }

    /// Set the default pacing options used by [`StreamSession::begin`]
    pub fn with_options(mut self, opts: PaceOptions) -> Self {
        self.opts = opts;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a pacer is currently active
    pub fn is_streaming(&self) -> bool {
        self.pacer.is_some()
    }

    /// Bytes of snapshot text actually rendered so far.
    ///
    /// Non-decreasing over a stream's lifetime and never larger than the
    /// latest accepted snapshot.
    pub fn committed_len(&self) -> usize {
        match &self.pacer {
            Some(pacer) => *pacer.commit.borrow(),
            None => self.committed,
        }
    }

    /// Start streaming a new message with the given options.
    ///
    /// Cancels any previous pacer first, clears the render surface, and
    /// resets the delta bookkeeping. Fails with
    /// [`SessionError::TargetMissing`] when the surface is gone, in which
    /// case no state is touched.
    pub async fn begin(&mut self, opts: PaceOptions) -> Result<(), SessionError> {
        if self.pacer.is_some() {
            self.interrupt().await?;
        }

        // Sink is always home when no pacer is active.
        match self.sink.as_ref() {
            Some(sink) if sink.target_attached() => {}
            _ => return Err(SessionError::TargetMissing),
        }
        let mut sink = self.sink.take().ok_or(SessionError::TargetMissing)?;

        sink.replace_all("");
        self.seen.clear();
        self.committed = 0;
        self.opts = opts;

        let (feed_tx, feed_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (commit_tx, commit_rx) = watch::channel(0);

        let pacer = Pacer::new(sink, feed_rx, cancel_rx, commit_tx, opts);
        let task = tokio::spawn(pacer.run());

        self.pacer = Some(ActivePacer {
            feed: feed_tx,
            cancel: cancel_tx,
            commit: commit_rx,
            task,
        });
        self.state = SessionState::Streaming;
        tracing::debug!(mode = ?opts.mode, interval_ms = opts.interval.as_millis() as u64, "stream started");
        Ok(())
    }

    /// Supply a new full-text snapshot of the message being streamed.
    ///
    /// The unseen suffix is chunked and enqueued to the active pacer; text
    /// already accepted is never re-enqueued or re-parsed. Re-supplying
    /// the identical snapshot is a no-op with no pacer activity. Snapshots
    /// that shrink or rewrite accepted content are rejected.
    pub fn feed(&mut self, snapshot: &str) -> Result<(), SessionError> {
        let pacer = self.pacer.as_ref().ok_or(SessionError::NotStreaming)?;

        if snapshot.len() < self.seen.len() {
            return Err(SessionError::SnapshotRegression {
                seen: self.seen.len(),
                snapshot: snapshot.len(),
            });
        }
        if !snapshot.starts_with(self.seen.as_str()) {
            return Err(SessionError::SnapshotDiverged {
                seen: self.seen.len(),
            });
        }

        let delta = &snapshot[self.seen.len()..];
        if delta.is_empty() {
            return Ok(());
        }

        // Instant cadence renders each delta whole; the other cadences get
        // word-safe chunks.
        let pieces = if self.opts.mode == PaceMode::Instant {
            vec![Chunk {
                text: delta.to_string(),
                index: 0,
            }]
        } else {
            chunk(delta, self.opts.target_chunk_size)
        };

        for piece in pieces {
            pacer
                .feed
                .send(piece)
                .map_err(|_| SessionError::PacerFailed("chunk queue closed".to_string()))?;
        }
        tracing::debug!(delta_bytes = delta.len(), "delta accepted");
        self.seen = snapshot.to_string();
        Ok(())
    }

    /// Close the feed and wait for the pacer to drain.
    ///
    /// Resolves once the last enqueued chunk has rendered — the point
    /// where a host can drop its "streaming" indicator. No-op outside a
    /// stream.
    pub async fn complete(&mut self) -> Result<SessionState, SessionError> {
        let Some(pacer) = self.pacer.take() else {
            return Ok(self.state);
        };
        drop(pacer.feed);
        let (sink, outcome) = pacer
            .task
            .await
            .map_err(|err| SessionError::PacerFailed(err.to_string()))?;
        self.committed = *pacer.commit.borrow();
        self.sink = Some(sink);
        self.state = match outcome {
            PaceOutcome::Completed => SessionState::Completed,
            PaceOutcome::Cancelled => SessionState::Interrupted,
        };
        tracing::debug!(state = ?self.state, bytes = self.committed, "stream finished");
        Ok(self.state)
    }

    /// Cancel the active stream.
    ///
    /// The in-flight release finishes, nothing further is released, and
    /// everything already rendered stays in place. No-op outside a stream.
    pub async fn interrupt(&mut self) -> Result<SessionState, SessionError> {
        let Some(pacer) = self.pacer.take() else {
            return Ok(self.state);
        };
        let _ = pacer.cancel.send(true);
        let (sink, _) = pacer
            .task
            .await
            .map_err(|err| SessionError::PacerFailed(err.to_string()))?;
        self.committed = *pacer.commit.borrow();
        self.sink = Some(sink);
        self.state = SessionState::Interrupted;
        tracing::debug!(bytes = self.committed, "stream interrupted");
        Ok(self.state)
    }

    /// Return the session to `Idle` for a new message.
    ///
    /// Interrupts any active stream. Surface content is left in place;
    /// the next [`StreamSession::begin`] clears it.
    pub async fn reset(&mut self) -> Result<(), SessionError> {
        if self.pacer.is_some() {
            self.interrupt().await?;
        }
        self.seen.clear();
        self.committed = 0;
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Pace a complete markdown string in one call.
    ///
    /// Starts a fresh stream (cancelling any active one), feeds the whole
    /// text, and waits for the pacer to drain.
    pub async fn stream_markdown(
        &mut self,
        text: &str,
        opts: PaceOptions,
    ) -> Result<SessionState, SessionError> {
        self.begin(opts).await?;
        self.feed(text)?;
        self.complete().await
    }

    /// One-shot chunked pacing with explicit size and interval.
    pub async fn stream_by_chunks(
        &mut self,
        text: &str,
        target_chunk_size: usize,
        interval: std::time::Duration,
    ) -> Result<SessionState, SessionError> {
        let opts = self
            .opts
            .with_mode(PaceMode::Chunk)
            .with_chunk_size(target_chunk_size)
            .with_interval(interval);
        self.stream_markdown(text, opts).await
    }

    /// The sink, available whenever no pacer is active
    pub fn sink(&self) -> Option<&RenderSink<T, C>> {
        self.sink.as_ref()
    }

    /// Exclusive access to the sink, available whenever no pacer is active
    pub fn sink_mut(&mut self) -> Option<&mut RenderSink<T, C>> {
        self.sink.as_mut()
    }

    /// Tear the session apart, returning the sink if no pacer holds it
    pub fn into_sink(mut self) -> Option<RenderSink<T, C>> {
        self.sink.take()
    }
}

impl<T, C> Drop for StreamSession<T, C> {
    fn drop(&mut self) {
        // An orphaned pacer task should stop promptly rather than keep
        // rendering to a surface nobody controls anymore.
        if let Some(pacer) = &self.pacer {
            let _ = pacer.cancel.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::PulldownConverter;
    use crate::sink::MemoryTarget;
    use crate::text::Block;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn session() -> StreamSession<MemoryTarget, PulldownConverter> {
        StreamSession::new(RenderSink::new(MemoryTarget::new(), PulldownConverter::new()))
    }

    fn fast_opts() -> PaceOptions {
        PaceOptions::default().with_interval(Duration::ZERO)
    }

    fn target_words(s: &StreamSession<MemoryTarget, PulldownConverter>) -> Vec<String> {
        s.sink()
            .expect("sink home")
            .target()
            .blocks()
            .iter()
            .map(Block::plain_text)
            .collect()
    }

    #[tokio::test]
    async fn test_one_shot_instant_stream() {
        let mut s = session();
        let state = s
            .stream_markdown("# Title\n\nBody text.", PaceOptions::instant())
            .await
            .expect("stream");
        assert_eq!(state, SessionState::Completed);
        assert_eq!(s.state(), SessionState::Completed);

        let target = s.sink().expect("sink home").target();
        assert!(matches!(
            target.blocks()[0],
            Block::Heading { level: 1, .. }
        ));
        assert_eq!(s.committed_len(), "# Title\n\nBody text.".len());
    }

    #[tokio::test]
    async fn test_bold_survives_chunked_streaming() {
        let mut s = session();
        s.stream_by_chunks("Hello **world**", 6, Duration::ZERO)
            .await
            .expect("stream");

        let target = s.sink().expect("sink home").target();
        let blocks = target.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].plain_text(), "Hello");
        match &blocks[1] {
            Block::Paragraph { spans } => {
                assert_eq!(spans[0].text, "world");
                assert!(spans[0].style.strong);
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reentrant_feed_cuts_deltas_once() {
        let mut s = session();
        s.begin(fast_opts()).await.expect("begin");

        s.feed("Hi").expect("feed");
        s.feed("Hi there").expect("feed");
        s.feed("Hi there!").expect("feed");
        // Re-supplying the identical snapshot adds nothing.
        s.feed("Hi there!").expect("feed");

        let state = s.complete().await.expect("complete");
        assert_eq!(state, SessionState::Completed);

        let target = s.sink().expect("sink home").target();
        // One clear at begin, then one append per delta: "Hi", " there", "!".
        assert_eq!(target.replace_count(), 1);
        assert_eq!(target.append_count(), 3);
        assert_eq!(s.committed_len(), "Hi there!".len());
    }

    #[tokio::test]
    async fn test_commit_watermark_is_monotonic() {
        let mut s = session();
        s.begin(fast_opts()).await.expect("begin");

        let mut last = 0;
        let snapshots = ["alpha ", "alpha beta ", "alpha beta gamma"];
        for snap in snapshots {
            s.feed(snap).expect("feed");
            tokio::task::yield_now().await;
            let now = s.committed_len();
            assert!(now >= last, "commit watermark went backwards");
            assert!(now <= snap.len(), "commit watermark passed the snapshot");
            last = now;
        }
        s.complete().await.expect("complete");
        assert_eq!(s.committed_len(), "alpha beta gamma".len());
    }

    #[tokio::test]
    async fn test_shrinking_snapshot_is_rejected() {
        let mut s = session();
        s.begin(fast_opts()).await.expect("begin");
        s.feed("Hello world").expect("feed");

        let err = s.feed("Hello").expect_err("shrink must be rejected");
        assert!(matches!(
            err,
            SessionError::SnapshotRegression {
                seen: 11,
                snapshot: 5
            }
        ));
        // The session is untouched and keeps streaming.
        assert!(s.is_streaming());
        s.feed("Hello world again").expect("feed still works");
        s.complete().await.expect("complete");
    }

    #[tokio::test]
    async fn test_diverging_snapshot_is_rejected() {
        let mut s = session();
        s.begin(fast_opts()).await.expect("begin");
        s.feed("Hello world").expect("feed");

        let err = s
            .feed("Goodbye world")
            .expect_err("rewrite must be rejected");
        assert!(matches!(err, SessionError::SnapshotDiverged { seen: 11 }));
        s.complete().await.expect("complete");
    }

    #[tokio::test]
    async fn test_feed_without_stream_errors() {
        let mut s = session();
        assert!(matches!(
            s.feed("text"),
            Err(SessionError::NotStreaming)
        ));
    }

    #[tokio::test]
    async fn test_interrupt_preserves_released_prefix() {
        let mut s = session();
        let opts = PaceOptions::default()
            .with_interval(Duration::from_millis(5))
            .with_chunk_size(4);
        s.begin(opts).await.expect("begin");
        s.feed("one two three four five six seven eight")
            .expect("feed");

        tokio::time::sleep(Duration::from_millis(12)).await;
        let state = s.interrupt().await.expect("interrupt");
        assert_eq!(state, SessionState::Interrupted);

        let words = target_words(&s);
        assert!(!words.is_empty(), "released chunks stay rendered");
        assert!(words.len() < 8, "cancellation stopped the release");

        // The caller may annotate the interruption as ordinary content.
        s.sink_mut()
            .expect("sink home")
            .append("*stream stopped*");
        let words = target_words(&s);
        assert_eq!(words.last().map(String::as_str), Some("stream stopped"));
    }

    #[tokio::test]
    async fn test_new_stream_cancels_previous_pacer() {
        let mut s = session();
        let slow = PaceOptions::default()
            .with_interval(Duration::from_millis(50))
            .with_chunk_size(3);
        s.begin(slow).await.expect("begin");
        s.feed("first message body with many words").expect("feed");

        // Starting over must cancel the previous pacer before any of its
        // remaining chunks can interleave with the new stream.
        let state = s
            .stream_markdown("replacement", fast_opts())
            .await
            .expect("second stream");
        assert_eq!(state, SessionState::Completed);

        let words = target_words(&s);
        assert_eq!(words, ["replacement"]);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let mut s = session();
        s.stream_markdown("some text", PaceOptions::instant())
            .await
            .expect("stream");
        assert_eq!(s.state(), SessionState::Completed);

        s.reset().await.expect("reset");
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.committed_len(), 0);

        // A fresh stream works after reset.
        s.stream_markdown("next message", PaceOptions::instant())
            .await
            .expect("stream");
        assert_eq!(target_words(&s), ["next message"]);
    }

    /// Target that reports itself gone
    #[derive(Debug, Default)]
    struct DetachedTarget;

    impl RenderTarget for DetachedTarget {
        fn replace_all(&mut self, _blocks: Vec<Block>) {}
        fn append(&mut self, _blocks: Vec<Block>) {}
        fn attached(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_detached_target_fails_at_start() {
        let mut s =
            StreamSession::new(RenderSink::new(DetachedTarget, PulldownConverter::new()));
        let err = s.begin(fast_opts()).await.expect_err("must fail");
        assert!(matches!(err, SessionError::TargetMissing));
        // No partial state: still idle, sink still available.
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.sink().is_some());
    }
}
