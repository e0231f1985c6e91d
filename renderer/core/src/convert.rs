//! Markdown Conversion
//!
//! Trait definition for the base markdown-to-rich-text conversion, plus the
//! default implementation bound to `pulldown-cmark`.
//!
//! # Design Philosophy
//!
//! The streaming machinery never parses markdown itself; it hands strings
//! to a [`MarkdownConvert`] implementation and forwards the resulting
//! [`Block`]s to the render target. Keeping the converter behind a trait
//! lets hosts swap parsers (or inject failing ones in tests) without
//! touching the pacing or session logic.
//!
//! Converters are handed fragments mid-stream, so they must tolerate
//! unterminated constructs. Whatever a converter cannot represent should
//! degrade to literal text — the sink treats a [`ConvertError`] the same
//! way, so either side of the seam may do the degrading.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::ConvertError;
use crate::text::{Block, Span, SpanStyle};

/// Markdown-to-rich-text conversion seam
///
/// Implementations convert one markdown string (a full document or an
/// isolated fragment) into renderable blocks. They must be total over
/// partial markdown: an unterminated emphasis marker or code fence is a
/// normal mid-stream input, not an error case.
pub trait MarkdownConvert: Send + 'static {
    /// Convert markdown into renderable blocks.
    ///
    /// Returning `Err` is allowed but the render sink downgrades it to a
    /// literal rendering of the input; it never aborts a stream.
    fn convert(&self, markdown: &str) -> Result<Vec<Block>, ConvertError>;
}

/// Default converter bound to `pulldown-cmark`
///
/// Walks the parser's event stream into the block model. Inline HTML and
/// other constructs outside the block vocabulary degrade to plain text.
/// This converter never returns `Err`: `pulldown-cmark` is total over
/// arbitrary input.
#[derive(Clone, Debug)]
pub struct PulldownConverter {
    options: Options,
}

impl Default for PulldownConverter {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }
}

impl PulldownConverter {
    /// Create a converter with the default option set
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkdownConvert for PulldownConverter {
    fn convert(&self, markdown: &str) -> Result<Vec<Block>, ConvertError> {
        let mut builder = BlockBuilder::default();
        for event in Parser::new_ext(markdown, self.options) {
            builder.event(event);
        }
        Ok(builder.finish())
    }
}

/// Accumulates parser events into blocks
#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    style: SpanStyle,
    link: Option<String>,
    heading: Option<u8>,
    quote_depth: usize,
    /// Next ordinal per open list level; `None` for bullet lists
    list_stack: Vec<Option<u64>>,
    in_item: bool,
    item_ordinal: Option<u64>,
    code: Option<(Option<String>, String)>,
}

impl BlockBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                let mut style = self.style;
                style.code = true;
                self.spans.push(Span {
                    text: code.to_string(),
                    style,
                    link: self.link.clone(),
                });
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            // Outside the block vocabulary: keep the text, drop the markup.
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " });
            }
            Event::FootnoteReference(label) => {
                self.push_text(&format!("[^{label}]"));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(heading_depth(level));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::List(start) => self.list_stack.push(start),
            Tag::Item => {
                self.flush();
                self.in_item = true;
                self.item_ordinal = self.list_stack.last().copied().flatten();
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        Some(info.to_string())
                    }
                    _ => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::Emphasis => self.style.emphasis = true,
            Tag::Strong => self.style.strong = true,
            Tag::Strikethrough => self.style.strikethrough = true,
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            Tag::Image { dest_url, .. } => self.link = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
            }
            TagEnd::Item => {
                self.flush();
                self.in_item = false;
                if let Some(Some(ordinal)) = self.list_stack.last_mut() {
                    *ordinal += 1;
                }
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut text)) = self.code.take() {
                    if text.ends_with('\n') {
                        text.pop();
                    }
                    self.blocks.push(Block::CodeBlock { language, text });
                }
            }
            TagEnd::Emphasis => self.style.emphasis = false,
            TagEnd::Strong => self.style.strong = false,
            TagEnd::Strikethrough => self.style.strikethrough = false,
            TagEnd::Link | TagEnd::Image => self.link = None,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, buffer)) = self.code.as_mut() {
            buffer.push_str(text);
            return;
        }
        // Merge into the previous span when the styling matches.
        if let Some(last) = self.spans.last_mut() {
            if last.style == self.style && last.link == self.link {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(Span {
            text: text.to_string(),
            style: self.style,
            link: self.link.clone(),
        });
    }

    /// Close the current span run into a block for the active context
    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        let block = if let Some(level) = self.heading {
            Block::Heading { level, spans }
        } else if self.in_item {
            Block::ListItem {
                ordinal: self.item_ordinal,
                depth: self.list_stack.len().saturating_sub(1),
                spans,
            }
        } else if self.quote_depth > 0 {
            Block::Quote { spans }
        } else {
            Block::Paragraph { spans }
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        if let Some((language, text)) = self.code.take() {
            // Unterminated fence at end of input; keep what arrived.
            self.blocks.push(Block::CodeBlock { language, text });
        }
        self.blocks
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
