//! Rich-Text Block Model
//!
//! Surface-agnostic rendered content. The converter produces these blocks,
//! the render sink hands them to whatever surface the caller supplied, and
//! the surface decides how to paint them (terminal cells, GUI widgets, ...).
//!
//! # Design Philosophy
//!
//! Blocks are plain serializable data with no dependency on any UI
//! framework. A TUI maps them to styled terminal lines, a test maps them
//! back to strings, and neither needs to know how the other works.

use serde::{Deserialize, Serialize};

/// Inline style flags for a span of text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanStyle {
    /// Bold (`**text**`)
    pub strong: bool,
    /// Italic (`*text*`)
    pub emphasis: bool,
    /// Struck through (`~~text~~`)
    pub strikethrough: bool,
    /// Inline code (`` `text` ``)
    pub code: bool,
}

impl SpanStyle {
    /// Whether no style flag is set
    pub fn is_plain(&self) -> bool {
        !(self.strong || self.emphasis || self.strikethrough || self.code)
    }
}

/// A styled run of text within a block
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// The text content
    pub text: String,
    /// Style flags applied to the whole run
    pub style: SpanStyle,
    /// Link destination, if this run is link text
    pub link: Option<String>,
}

impl Span {
    /// Create an unstyled span
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
            link: None,
        }
    }

    /// Create a styled span
    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
        }
    }

    /// Create a link span
    pub fn link(text: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
            link: Some(dest.into()),
        }
    }
}

/// A block-level rich-text element
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// A paragraph of styled spans
    Paragraph {
        /// Inline content
        spans: Vec<Span>,
    },
    /// A heading, depth 1-6
    Heading {
        /// Heading depth (1 = largest)
        level: u8,
        /// Inline content
        spans: Vec<Span>,
    },
    /// A fenced or indented code block
    CodeBlock {
        /// Fence info string, if any (e.g. `rust`)
        language: Option<String>,
        /// Verbatim code content
        text: String,
    },
    /// A block quote, flattened to styled spans
    Quote {
        /// Inline content
        spans: Vec<Span>,
    },
    /// A single list item
    ListItem {
        /// `Some(n)` for ordered items, `None` for bullets
        ordinal: Option<u64>,
        /// Nesting depth, 0 = top level
        depth: usize,
        /// Inline content
        spans: Vec<Span>,
    },
    /// A thematic break (`---`)
    Rule,
    /// Verbatim text preserved as-is (degraded or malformed fragments)
    Literal {
        /// The raw text
        text: String,
    },
}

impl Block {
    /// Create a paragraph from spans
    pub fn paragraph(spans: Vec<Span>) -> Self {
        Self::Paragraph { spans }
    }

    /// Create a literal block that renders the text verbatim
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal { text: text.into() }
    }

    /// Concatenated plain text of this block, styles discarded.
    ///
    /// Test helpers and accessibility layers use this; surfaces should
    /// render the spans instead.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Paragraph { spans }
            | Self::Heading { spans, .. }
            | Self::Quote { spans }
            | Self::ListItem { spans, .. } => {
                spans.iter().map(|s| s.text.as_str()).collect()
            }
            Self::CodeBlock { text, .. } | Self::Literal { text } => text.clone(),
            Self::Rule => String::new(),
        }
    }
}
