//! Theme and Colors
//!
//! Terminal styling for rendered markdown blocks. A `Theme` is passed once
//! when the surface is constructed and applies to that surface only —
//! there is no process-global stylesheet, so independent surfaces with
//! different themes can coexist.

use flowmark_core::SpanStyle;
use ratatui::style::{Color, Modifier, Style};

// ============================================================================
// Palette
// ============================================================================

/// Body text
pub const TEXT: Color = Color::Rgb(220, 220, 215);

/// Headings
pub const HEADING: Color = Color::Rgb(255, 200, 120);

/// Inline code and code blocks
pub const CODE: Color = Color::Rgb(235, 110, 100);

/// Code block background tint
pub const CODE_BG: Color = Color::Rgb(38, 38, 42);

/// Quoted text
pub const QUOTE: Color = Color::Rgb(150, 150, 145);

/// Links
pub const LINK: Color = Color::Rgb(110, 170, 250);

/// Rules, list markers, status text
pub const DIM: Color = Color::Rgb(110, 110, 105);

/// Streaming cursor glyph
pub const CURSOR: Color = Color::Rgb(130, 220, 130);

// ============================================================================
// Theme
// ============================================================================

/// Styles for one render surface
#[derive(Clone, Debug)]
pub struct Theme {
    /// Body text style
    pub text: Style,
    /// Heading style (depth 1 additionally underlines)
    pub heading: Style,
    /// Inline code style
    pub code: Style,
    /// Code block style
    pub code_block: Style,
    /// Block quote style
    pub quote: Style,
    /// Link style
    pub link: Style,
    /// Rule and list marker style
    pub marker: Style,
    /// Trailing cursor shown while streaming
    pub cursor: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Style::default().fg(TEXT),
            heading: Style::default().fg(HEADING).add_modifier(Modifier::BOLD),
            code: Style::default().fg(CODE),
            code_block: Style::default().fg(CODE).bg(CODE_BG),
            quote: Style::default().fg(QUOTE).add_modifier(Modifier::ITALIC),
            link: Style::default().fg(LINK).add_modifier(Modifier::UNDERLINED),
            marker: Style::default().fg(DIM),
            cursor: Style::default().fg(CURSOR).add_modifier(Modifier::BOLD),
        }
    }
}

impl Theme {
    /// Style for a heading of the given depth
    pub fn heading_style(&self, level: u8) -> Style {
        if level <= 1 {
            self.heading.add_modifier(Modifier::UNDERLINED)
        } else {
            self.heading
        }
    }

    /// Terminal style for an inline span
    pub fn span_style(&self, style: SpanStyle, is_link: bool) -> Style {
        if style.code {
            return self.code;
        }
        let mut out = if is_link { self.link } else { self.text };
        if style.strong {
            out = out.add_modifier(Modifier::BOLD);
        }
        if style.emphasis {
            out = out.add_modifier(Modifier::ITALIC);
        }
        if style.strikethrough {
            out = out.add_modifier(Modifier::CROSSED_OUT);
        }
        out
    }
}
