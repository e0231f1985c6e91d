//! Terminal Render Surface
//!
//! A shareable [`RenderTarget`] backed by terminal lines. The stream
//! session holds one handle with exclusive write access; the app holds
//! another to lay the content out each frame. This mirrors how a DOM
//! surface works: the renderer mutates the node, the framework paints it.

use std::sync::{Arc, Mutex};

use flowmark_core::{Block, RenderTarget, Span};
use ratatui::text::{Line, Span as RSpan};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Blocks plus presentation state for one message
#[derive(Debug, Default)]
struct SurfaceState {
    blocks: Vec<Block>,
    /// Show a trailing cursor glyph after the last line
    streaming: bool,
}

/// A shared handle onto one terminal message surface.
///
/// Clones point at the same surface. While a stream session is active it
/// is the only writer; other handles only read for layout.
#[derive(Clone, Debug, Default)]
pub struct MessageSurface {
    inner: Arc<Mutex<SurfaceState>>,
}

impl MessageSurface {
    /// Create an empty surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the trailing streaming cursor
    pub fn set_streaming(&self, streaming: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.streaming = streaming;
        }
    }

    /// Number of blocks currently on the surface
    pub fn block_count(&self) -> usize {
        self.inner.lock().map(|s| s.blocks.len()).unwrap_or(0)
    }

    /// Lay the surface content out as styled terminal lines.
    ///
    /// Lines are pre-wrapped to `width`, so callers can scroll and blit
    /// them without further measurement.
    pub fn lines(&self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        let Ok(state) = self.inner.lock() else {
            return Vec::new();
        };
        let width = width.max(1) as usize;
        let mut out = Vec::new();

        for block in &state.blocks {
            layout_block(block, width, theme, &mut out);
        }

        if state.streaming {
            let cursor = RSpan::styled("▍", theme.cursor);
            match out.last_mut() {
                Some(last) => last.spans.push(cursor),
                None => out.push(Line::from(cursor)),
            }
        }
        out
    }
}

impl RenderTarget for MessageSurface {
    fn replace_all(&mut self, blocks: Vec<Block>) {
        if let Ok(mut state) = self.inner.lock() {
            state.blocks = blocks;
        }
    }

    fn append(&mut self, blocks: Vec<Block>) {
        if let Ok(mut state) = self.inner.lock() {
            state.blocks.extend(blocks);
        }
    }

    fn attached(&self) -> bool {
        !self.inner.is_poisoned()
    }
}

fn layout_block(block: &Block, width: usize, theme: &Theme, out: &mut Vec<Line<'static>>) {
    match block {
        Block::Paragraph { spans } => {
            out.extend(wrap_spans(spans, width, theme, "", "", None));
        }
        Block::Heading { level, spans } => {
            let style = theme.heading_style(*level);
            let mut line = Line::default();
            for span in spans {
                line.spans.push(RSpan::styled(span.text.clone(), style));
            }
            out.push(line);
        }
        Block::CodeBlock { language, text } => {
            if let Some(language) = language {
                out.push(Line::from(RSpan::styled(
                    format!("· {language}"),
                    theme.marker,
                )));
            }
            for code_line in text.lines() {
                out.push(Line::from(RSpan::styled(
                    format!("  {code_line}"),
                    theme.code_block,
                )));
            }
        }
        Block::Quote { spans } => {
            out.extend(wrap_spans(
                spans,
                width.saturating_sub(2),
                theme,
                "▌ ",
                "▌ ",
                Some(theme.quote),
            ));
        }
        Block::ListItem {
            ordinal,
            depth,
            spans,
        } => {
            let indent = "  ".repeat(*depth);
            let marker = match ordinal {
                Some(n) => format!("{indent}{n}. "),
                None => format!("{indent}• "),
            };
            let marker_width = UnicodeWidthStr::width(marker.as_str());
            let hang = " ".repeat(marker_width);
            let body_width = width.saturating_sub(marker_width);
            out.extend(wrap_spans(spans, body_width, theme, &marker, &hang, None));
        }
        Block::Rule => {
            out.push(Line::from(RSpan::styled(
                "─".repeat(width.min(40)),
                theme.marker,
            )));
        }
        Block::Literal { text } => {
            for raw_line in text.lines() {
                for wrapped in textwrap::wrap(raw_line, width) {
                    out.push(Line::from(RSpan::styled(
                        wrapped.to_string(),
                        theme.text,
                    )));
                }
            }
        }
    }
}

/// Greedy word wrap over styled spans.
///
/// `first` prefixes the first emitted line, `rest` the continuation lines
/// (hanging indent for list items, bar for quotes). `base` overrides the
/// style of unstyled spans, for containers like quotes that tint their
/// whole body.
fn wrap_spans(
    spans: &[Span],
    width: usize,
    theme: &Theme,
    first: &str,
    rest: &str,
    base: Option<ratatui::style::Style>,
) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current: Vec<RSpan<'static>> = vec![];
    let mut col = 0usize;

    let mut flush = |current: &mut Vec<RSpan<'static>>, lines: &mut Vec<Line<'static>>| {
        let prefix = if lines.is_empty() { first } else { rest };
        let mut line = Line::default();
        if !prefix.is_empty() {
            line.spans.push(RSpan::styled(prefix.to_string(), theme.marker));
        }
        line.spans.append(current);
        lines.push(line);
    };

    for span in spans {
        let style = match base {
            Some(base) if span.style.is_plain() && span.link.is_none() => base,
            _ => theme.span_style(span.style, span.link.is_some()),
        };
        for token in span.text.split_inclusive(char::is_whitespace) {
            let hard_break = token.ends_with('\n');
            let word = token.trim_end_matches(['\n', '\r']);
            if !word.is_empty() {
                let w = UnicodeWidthStr::width(word);
                if col + w > width && col > 0 {
                    flush(&mut current, &mut lines);
                    col = 0;
                }
                // Merge into the previous run when the style matches.
                match current.last_mut() {
                    Some(last) if last.style == style => {
                        last.content.to_mut().push_str(word);
                    }
                    _ => current.push(RSpan::styled(word.to_string(), style)),
                }
                col += w;
            }
            if hard_break {
                flush(&mut current, &mut lines);
                col = 0;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        flush(&mut current, &mut lines);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowmark_core::SpanStyle;
    use pretty_assertions::assert_eq;

    fn plain(text: &str) -> Span {
        Span::plain(text)
    }

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_paragraph_wraps_at_width() {
        let surface = MessageSurface::new();
        let mut writer = surface.clone();
        writer.replace_all(vec![Block::Paragraph {
            spans: vec![plain("alpha beta gamma delta epsilon")],
        }]);

        let lines = surface.lines(12, &Theme::default());
        assert!(lines.len() > 1, "long paragraph must wrap");
        for line in &lines {
            let text = line_text(line);
            assert!(
                UnicodeWidthStr::width(text.trim_end()) <= 12,
                "line too wide: {text:?}"
            );
        }
    }

    #[test]
    fn test_list_items_get_markers() {
        let surface = MessageSurface::new();
        let mut writer = surface.clone();
        writer.replace_all(vec![
            Block::ListItem {
                ordinal: None,
                depth: 0,
                spans: vec![plain("bullet")],
            },
            Block::ListItem {
                ordinal: Some(2),
                depth: 0,
                spans: vec![plain("second")],
            },
        ]);

        let lines = surface.lines(40, &Theme::default());
        assert_eq!(line_text(&lines[0]), "• bullet");
        assert_eq!(line_text(&lines[1]), "2. second");
    }

    #[test]
    fn test_streaming_cursor_trails_last_line() {
        let surface = MessageSurface::new();
        let mut writer = surface.clone();
        writer.append(vec![Block::Paragraph {
            spans: vec![plain("typing")],
        }]);

        surface.set_streaming(true);
        let lines = surface.lines(40, &Theme::default());
        assert!(line_text(lines.last().unwrap()).ends_with('▍'));

        surface.set_streaming(false);
        let lines = surface.lines(40, &Theme::default());
        assert!(!line_text(lines.last().unwrap()).ends_with('▍'));
    }

    #[test]
    fn test_shared_handles_see_the_same_content() {
        let surface = MessageSurface::new();
        let mut writer = surface.clone();
        writer.append(vec![Block::Paragraph {
            spans: vec![Span::styled(
                "bold",
                SpanStyle {
                    strong: true,
                    ..Default::default()
                },
            )],
        }]);
        assert_eq!(surface.block_count(), 1);
    }
}
