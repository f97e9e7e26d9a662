//! Structured text rendering.
//!
//! Turns the tutor's markdown-like dialect into display blocks. Rendering is
//! a pure function of the text: it never fails and is re-run on every
//! streamed fragment, so a truncated document must render sensibly.
//!
//! Supported markup:
//! - fenced regions (```` ``` ````), with `diagram` as a special language
//! - `> ` callouts with bold labels (`**Core Concept**`, `**Warning**`, ...)
//! - `## ` / `### ` headers, `- ` and `1. ` list items
//! - inline `**bold**`
//!
//! Markup inside a callout is not parsed beyond bold runs.

mod blocks;
mod classify;
mod fence;
mod inline;

pub use blocks::{CalloutKind, ListMarker, RenderBlock, Span};
pub use classify::classify_line;
pub use fence::{DEFAULT_LANGUAGE, Segment};
pub use inline::parse_bold;

const DIAGRAM_LANGUAGE: &str = "diagram";

/// Renders `text` into blocks in document order.
pub fn render(text: &str) -> Vec<RenderBlock> {
    let mut blocks = Vec::new();

    for segment in fence::split(text) {
        match segment {
            Segment::Prose(prose) => {
                blocks.extend(prose.split('\n').map(classify_line));
            }
            Segment::Fenced {
                language,
                body,
                closed,
            } => {
                let block = if language == DIAGRAM_LANGUAGE {
                    RenderBlock::Diagram {
                        text: body.to_string(),
                        complete: closed,
                    }
                } else {
                    RenderBlock::Code {
                        language,
                        text: body.to_string(),
                        complete: closed,
                    }
                };
                blocks.push(block);
            }
        }
    }

    blocks
}
