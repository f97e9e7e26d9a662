//! Terminal rendering of display blocks.
//!
//! Styling is only applied when stdout is a terminal and `NO_COLOR` is unset,
//! so piped output stays plain text.

use std::io::{self, Write};

use crossterm::style::{Attribute, Attributes, Color, ContentStyle};
use crossterm::tty::IsTty;
use jtutor_core::render::{self, CalloutKind, ListMarker, RenderBlock, Span};

const CALLOUT_BAR: &str = "│ ";
const BULLET: &str = "•";

#[derive(Debug, Clone, Copy)]
pub struct Printer {
    styled: bool,
}

impl Printer {
    /// Printer for the process's stdout.
    pub fn stdout() -> Self {
        let styled = io::stdout().is_tty() && std::env::var_os("NO_COLOR").is_none();
        Self { styled }
    }

    pub fn plain() -> Self {
        Self { styled: false }
    }

    fn paint(self, text: &str, style: ContentStyle) -> String {
        if self.styled {
            style.apply(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn spans(self, spans: &[Span], base: ContentStyle) -> String {
        spans
            .iter()
            .map(|span| match span {
                Span::Plain(text) => self.paint(text, base),
                Span::Bold(text) => self.paint(text, with_attr(base, Attribute::Bold)),
            })
            .collect()
    }

    pub fn error(self, text: &str) -> String {
        self.paint(text, fg(Color::Red))
    }

    pub fn dim(self, text: &str) -> String {
        self.paint(text, with_attr(ContentStyle::default(), Attribute::Dim))
    }

    pub fn bold(self, text: &str) -> String {
        self.paint(text, with_attr(ContentStyle::default(), Attribute::Bold))
    }

    /// Writes one block followed by a newline.
    pub fn write_block(self, out: &mut impl Write, block: &RenderBlock) -> io::Result<()> {
        match block {
            RenderBlock::Spacer => writeln!(out),
            RenderBlock::Paragraph { spans } => {
                writeln!(out, "{}", self.spans(spans, ContentStyle::default()))
            }
            RenderBlock::Header { level, text } => {
                let style = if *level <= 2 {
                    with_attr(fg(Color::Cyan), Attribute::Bold)
                } else {
                    with_attr(ContentStyle::default(), Attribute::Bold)
                };
                writeln!(out, "{}", self.paint(text, style))
            }
            RenderBlock::ListItem { marker, spans } => {
                let marker = match marker {
                    ListMarker::Bullet => BULLET.to_string(),
                    ListMarker::Ordered(number) => format!("{number}."),
                };
                writeln!(
                    out,
                    "  {} {}",
                    self.paint(&marker, fg(Color::Cyan)),
                    self.spans(spans, ContentStyle::default())
                )
            }
            RenderBlock::Callout { kind, spans } => {
                let color = callout_color(*kind);
                let bar = self.paint(CALLOUT_BAR, fg(color));
                if let Some(title) = kind.title() {
                    writeln!(
                        out,
                        "{bar}{}",
                        self.paint(title, with_attr(fg(color), Attribute::Bold))
                    )?;
                }
                writeln!(out, "{bar}{}", self.spans(spans, ContentStyle::default()))
            }
            RenderBlock::Code {
                language,
                text,
                complete,
            } => {
                writeln!(out, "{}", self.dim(&format!("── {language} ──")))?;
                for line in text.trim_end_matches('\n').lines() {
                    writeln!(out, "    {}", self.paint(line, fg(Color::Yellow)))?;
                }
                if !complete {
                    writeln!(out, "    {}", self.dim("…"))?;
                }
                Ok(())
            }
            RenderBlock::Diagram { text, complete } => {
                for line in text.trim_end_matches('\n').lines() {
                    writeln!(out, "  {}", self.paint(line, fg(Color::Green)))?;
                }
                if !complete {
                    writeln!(out, "  {}", self.dim("…"))?;
                }
                Ok(())
            }
        }
    }

    pub fn write_blocks(self, out: &mut impl Write, blocks: &[RenderBlock]) -> io::Result<()> {
        for block in blocks {
            self.write_block(out, block)?;
        }
        Ok(())
    }

    /// Renders and writes a whole document.
    pub fn write_text(self, out: &mut impl Write, text: &str) -> io::Result<()> {
        self.write_blocks(out, &render::render(text))
    }
}

/// Prints a streamed document block by block.
///
/// The last block of a partial document may still change, so only the blocks
/// before it are printed while the stream runs; `finish` prints the rest.
#[derive(Debug)]
pub struct StreamPrinter {
    printer: Printer,
    printed: usize,
}

impl StreamPrinter {
    pub fn new(printer: Printer) -> Self {
        Self {
            printer,
            printed: 0,
        }
    }

    /// Prints blocks of `text` that can no longer change.
    pub fn update(&mut self, out: &mut impl Write, text: &str) -> io::Result<()> {
        let blocks = render::render(text);
        let settled = blocks.len().saturating_sub(1);
        if settled > self.printed {
            self.printer
                .write_blocks(out, &blocks[self.printed..settled])?;
            self.printed = settled;
            out.flush()?;
        }
        Ok(())
    }

    /// Prints whatever is left of the final `text`.
    pub fn finish(&mut self, out: &mut impl Write, text: &str) -> io::Result<()> {
        let blocks = render::render(text);
        if blocks.len() > self.printed {
            self.printer.write_blocks(out, &blocks[self.printed..])?;
            self.printed = blocks.len();
        }
        out.flush()
    }
}

fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

fn with_attr(style: ContentStyle, attribute: Attribute) -> ContentStyle {
    ContentStyle {
        attributes: style.attributes | Attributes::from(attribute),
        ..style
    }
}

fn callout_color(kind: CalloutKind) -> Color {
    match kind {
        CalloutKind::Concept => Color::Blue,
        CalloutKind::Analogy => Color::Magenta,
        CalloutKind::Importance => Color::Cyan,
        CalloutKind::Warning => Color::Red,
        CalloutKind::Tip => Color::Green,
        CalloutKind::Generic => Color::DarkGrey,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LESSON: &str = "> **Warning**: be careful\n\n## Loops\n- use **for**\n1. count\n```java\nint i = 0;\n```\nDone.";

    fn plain(text: &str) -> String {
        let mut out = Vec::new();
        Printer::plain().write_text(&mut out, text).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_rendering_of_each_block() {
        let printed = plain(LESSON);
        assert_eq!(
            printed,
            "│ Warning\n│ be careful\n\nLoops\n  • use for\n  1. count\n\n── java ──\n    int i = 0;\n\nDone.\n"
        );
    }

    #[test]
    fn test_open_fence_marked_incomplete() {
        let printed = plain("```diagram\n[A] -> [B]");
        assert_eq!(printed, "  [A] -> [B]\n  …\n");
    }

    #[test]
    fn test_streamed_output_matches_whole_document() {
        let mut streamed = Vec::new();
        let mut stream = StreamPrinter::new(Printer::plain());
        let mut text = String::new();
        for chunk in LESSON.as_bytes().chunks(3) {
            text.push_str(std::str::from_utf8(chunk).unwrap());
            stream.update(&mut streamed, &text).unwrap();
        }
        stream.finish(&mut streamed, &text).unwrap();

        assert_eq!(String::from_utf8(streamed).unwrap(), plain(LESSON));
    }

    #[test]
    fn test_finish_after_empty_stream_prints_nothing() {
        let mut out = Vec::new();
        let mut stream = StreamPrinter::new(Printer::plain());
        stream.finish(&mut out, "").unwrap();
        assert!(out.is_empty());
    }
}
