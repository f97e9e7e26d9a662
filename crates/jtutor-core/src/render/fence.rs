//! Splitting text into prose and fenced segments.

const FENCE: &str = "```";

/// Language assumed when a fence has no info string.
pub const DEFAULT_LANGUAGE: &str = "java";

/// A slice of the input, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Prose(&'a str),
    Fenced {
        /// First word of the info string, or [`DEFAULT_LANGUAGE`].
        language: String,
        body: &'a str,
        /// False when the input ended before the closing fence.
        closed: bool,
    },
}

/// Splits `text` on fence pairs matched left to right.
///
/// Empty prose between adjacent fences is omitted.
pub fn split(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        if open > 0 {
            segments.push(Segment::Prose(&rest[..open]));
        }
        let inner = &rest[open + FENCE.len()..];
        match inner.find(FENCE) {
            Some(close) => {
                segments.push(fenced(&inner[..close], true));
                rest = &inner[close + FENCE.len()..];
            }
            None => {
                segments.push(fenced(inner, false));
                rest = "";
            }
        }
    }

    if !rest.is_empty() {
        segments.push(Segment::Prose(rest));
    }
    segments
}

fn fenced(inner: &str, closed: bool) -> Segment<'_> {
    let Some((info, body)) = inner.split_once('\n') else {
        return Segment::Fenced {
            language: DEFAULT_LANGUAGE.to_string(),
            body: inner,
            closed,
        };
    };

    let language = info
        .split_whitespace()
        .next()
        .map_or_else(|| DEFAULT_LANGUAGE.to_string(), str::to_string);
    Segment::Fenced {
        language,
        body,
        closed,
    }
}
