//! Display blocks produced by the renderer.

/// A run of inline text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Bold(String),
}

impl Span {
    pub fn text(&self) -> &str {
        match self {
            Span::Plain(text) | Span::Bold(text) => text,
        }
    }
}

/// Flavor of a `> ` callout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutKind {
    Concept,
    Analogy,
    Importance,
    Warning,
    Tip,
    Generic,
}

impl CalloutKind {
    /// Heading shown above the callout body. `Generic` has none.
    pub fn title(self) -> Option<&'static str> {
        match self {
            CalloutKind::Concept => Some("Core Concept"),
            CalloutKind::Analogy => Some("Real World Analogy"),
            CalloutKind::Importance => Some("Why it Matters"),
            CalloutKind::Warning => Some("Warning"),
            CalloutKind::Tip => Some("Pro Tip"),
            CalloutKind::Generic => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    /// Numeral as written in the source, e.g. `"3"`.
    Ordered(String),
}

/// One rendered block.
///
/// `Code` and `Diagram` carry `complete: false` when their closing fence has
/// not arrived yet (a stream cut mid-block).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    Spacer,
    Paragraph {
        spans: Vec<Span>,
    },
    Header {
        level: u8,
        text: String,
    },
    ListItem {
        marker: ListMarker,
        spans: Vec<Span>,
    },
    Callout {
        kind: CalloutKind,
        spans: Vec<Span>,
    },
    Code {
        language: String,
        text: String,
        complete: bool,
    },
    Diagram {
        text: String,
        complete: bool,
    },
}

impl RenderBlock {
    /// True for blocks that came from a fenced region.
    pub fn is_fenced(&self) -> bool {
        matches!(self, RenderBlock::Code { .. } | RenderBlock::Diagram { .. })
    }

    /// Concatenated text without styling.
    pub fn plain_text(&self) -> String {
        match self {
            RenderBlock::Spacer => String::new(),
            RenderBlock::Paragraph { spans }
            | RenderBlock::ListItem { spans, .. }
            | RenderBlock::Callout { spans, .. } => spans.iter().map(Span::text).collect(),
            RenderBlock::Header { text, .. }
            | RenderBlock::Code { text, .. }
            | RenderBlock::Diagram { text, .. } => text.clone(),
        }
    }
}
