//! Render Sink
//!
//! Couples a markdown converter to a mutable render target. The sink is
//! the only place conversion output touches the surface, and the only
//! place malformed fragments are downgraded to literal text.
//!
//! # Why append exists
//!
//! Re-converting the entire accumulated message on every release (the
//! character-by-character legacy path) costs O(total²) over a session.
//! `append` converts only the new fragment and pushes the resulting blocks
//! onto the surface, keeping each step O(fragment) — the whole reason the
//! sink is distinct from the converter.

use crate::convert::MarkdownConvert;
use crate::text::Block;

/// A mutable output surface that receives rendered blocks
///
/// The surface is exclusively owned by the active stream session: while a
/// session is live, nothing else may write to it. That is a contract on
/// the caller, not something the core enforces.
pub trait RenderTarget: Send + 'static {
    /// Replace the entire surface content
    fn replace_all(&mut self, blocks: Vec<Block>);

    /// Append blocks after the existing surface content
    fn append(&mut self, blocks: Vec<Block>);

    /// Whether the surface still exists and can be written.
    ///
    /// Sessions check this once at start and refuse to begin against a
    /// detached surface.
    fn attached(&self) -> bool {
        true
    }
}

/// Converter plus target: the write side of one rendered message
#[derive(Debug)]
pub struct RenderSink<T, C> {
    target: T,
    converter: C,
}

impl<T: RenderTarget, C: MarkdownConvert> RenderSink<T, C> {
    /// Create a sink over a target and a converter
    pub fn new(target: T, converter: C) -> Self {
        Self { target, converter }
    }

    /// Re-convert the full markdown string and replace the surface content
    pub fn replace_all(&mut self, markdown: &str) {
        let blocks = self.convert_or_literal(markdown);
        self.target.replace_all(blocks);
    }

    /// Convert the fragment in isolation and append the resulting blocks.
    ///
    /// Previously rendered content is never re-parsed. An empty fragment
    /// is a no-op and causes no target activity.
    pub fn append(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        let blocks = self.convert_or_literal(fragment);
        if !blocks.is_empty() {
            self.target.append(blocks);
        }
    }

    /// Whether the underlying target is still attached
    pub fn target_attached(&self) -> bool {
        self.target.attached()
    }

    /// Shared access to the target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Exclusive access to the target
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Tear the sink apart, returning the target
    pub fn into_target(self) -> T {
        self.target
    }

    fn convert_or_literal(&mut self, markdown: &str) -> Vec<Block> {
        match self.converter.convert(markdown) {
            Ok(blocks) => blocks,
            Err(err) => {
                // Degrade, never abort: a partial construct mid-stream is
                // shown verbatim and the session keeps going.
                tracing::warn!(error = %err, "fragment degraded to literal text");
                vec![Block::literal(markdown)]
            }
        }
    }
}

/// An in-memory render target
///
/// Collects blocks and counts write operations. Used by headless hosts and
/// by tests asserting the re-render bounds of each pacing mode.
#[derive(Clone, Debug, Default)]
pub struct MemoryTarget {
    blocks: Vec<Block>,
    replace_count: usize,
    append_count: usize,
}

impl MemoryTarget {
    /// Create an empty target
    pub fn new() -> Self {
        Self::default()
    }

    /// The blocks currently on the surface
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Plain text of the surface content, one line per block
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// How many times the surface content was replaced
    pub fn replace_count(&self) -> usize {
        self.replace_count
    }

    /// How many times blocks were appended
    pub fn append_count(&self) -> usize {
        self.append_count
    }

    /// Total write operations against this surface
    pub fn render_count(&self) -> usize {
        self.replace_count + self.append_count
    }
}

impl RenderTarget for MemoryTarget {
    fn replace_all(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.replace_count += 1;
    }

    fn append(&mut self, blocks: Vec<Block>) {
        self.blocks.extend(blocks);
        self.append_count += 1;
    }
}
