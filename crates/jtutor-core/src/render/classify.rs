//! Prose line classification.
//!
//! Rules are tried in table order; the first match wins and anything left is a
//! paragraph. `### ` must come before `## `.

use super::blocks::{CalloutKind, ListMarker, RenderBlock};
use super::inline::parse_bold;

type LineRule = fn(&str) -> Option<RenderBlock>;

const LINE_RULES: &[LineRule] = &[callout, header3, header2, bullet, ordered];

/// Callout labels. A label may appear anywhere in the quoted text; every full
/// lesson label is tried before the short chat aliases.
const CALLOUT_LABELS: &[(&str, CalloutKind)] = &[
    ("**Core Concept**", CalloutKind::Concept),
    ("**Real World Analogy**", CalloutKind::Analogy),
    ("**Why it Matters**", CalloutKind::Importance),
    ("**Warning**", CalloutKind::Warning),
    ("**Pro Tip**", CalloutKind::Tip),
    ("**Concept**", CalloutKind::Concept),
    ("**Analogy**", CalloutKind::Analogy),
    ("**Tip**", CalloutKind::Tip),
];

/// Classifies one prose line.
pub fn classify_line(line: &str) -> RenderBlock {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return RenderBlock::Spacer;
    }

    LINE_RULES
        .iter()
        .find_map(|rule| rule(trimmed))
        .unwrap_or_else(|| RenderBlock::Paragraph {
            spans: parse_bold(line.trim_end()),
        })
}

fn callout(line: &str) -> Option<RenderBlock> {
    let content = line.strip_prefix("> ")?.trim_start();

    for &(label, kind) in CALLOUT_LABELS {
        let Some(at) = content.find(label) else {
            continue;
        };
        let mut after = &content[at + label.len()..];
        if let Some(stripped) = after.strip_prefix(':') {
            after = stripped;
        }
        let body = format!("{}{}", &content[..at], after);
        return Some(RenderBlock::Callout {
            kind,
            spans: parse_bold(body.trim()),
        });
    }

    Some(RenderBlock::Callout {
        kind: CalloutKind::Generic,
        spans: parse_bold(content),
    })
}

fn header3(line: &str) -> Option<RenderBlock> {
    header(line, "### ", 3)
}

fn header2(line: &str) -> Option<RenderBlock> {
    header(line, "## ", 2)
}

fn header(line: &str, prefix: &str, level: u8) -> Option<RenderBlock> {
    let text = line.strip_prefix(prefix)?;
    Some(RenderBlock::Header {
        level,
        text: text.trim().to_string(),
    })
}

fn bullet(line: &str) -> Option<RenderBlock> {
    let text = line.strip_prefix("- ")?;
    Some(RenderBlock::ListItem {
        marker: ListMarker::Bullet,
        spans: parse_bold(text),
    })
}

fn ordered(line: &str) -> Option<RenderBlock> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let text = line[digits..].strip_prefix(". ")?;
    Some(RenderBlock::ListItem {
        marker: ListMarker::Ordered(line[..digits].to_string()),
        spans: parse_bold(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::blocks::Span;

    fn callout_of(line: &str) -> (CalloutKind, String) {
        match classify_line(line) {
            RenderBlock::Callout { kind, spans } => {
                (kind, spans.iter().map(Span::text).collect())
            }
            other => panic!("expected callout, got {other:?}"),
        }
    }

    #[test]
    fn test_warning_callout_strips_label() {
        assert_eq!(
            callout_of("> **Warning**: be careful"),
            (CalloutKind::Warning, "be careful".to_string())
        );
    }

    #[test]
    fn test_callout_labels_and_aliases() {
        let cases = [
            ("> **Core Concept**: a", CalloutKind::Concept),
            ("> **Concept**: a", CalloutKind::Concept),
            ("> **Real World Analogy**: a", CalloutKind::Analogy),
            ("> **Analogy** a", CalloutKind::Analogy),
            ("> **Why it Matters**: a", CalloutKind::Importance),
            ("> **Pro Tip**: a", CalloutKind::Tip),
            ("> **Tip**: a", CalloutKind::Tip),
        ];
        for (line, kind) in cases {
            assert_eq!(callout_of(line), (kind, "a".to_string()), "{line}");
        }
    }

    #[test]
    fn test_full_label_wins_over_alias_in_body() {
        assert_eq!(
            classify_line("> **Real World Analogy**: like a **Concept** car"),
            RenderBlock::Callout {
                kind: CalloutKind::Analogy,
                spans: vec![
                    Span::Plain("like a ".to_string()),
                    Span::Bold("Concept".to_string()),
                    Span::Plain(" car".to_string()),
                ],
            }
        );
    }

    #[test]
    fn test_unlabeled_quote_is_generic_with_bold() {
        let block = classify_line(">   Remember **this**");
        assert_eq!(
            block,
            RenderBlock::Callout {
                kind: CalloutKind::Generic,
                spans: vec![
                    Span::Plain("Remember ".to_string()),
                    Span::Bold("this".to_string())
                ],
            }
        );
    }

    #[test]
    fn test_quote_without_space_is_paragraph() {
        assert!(matches!(
            classify_line(">no space"),
            RenderBlock::Paragraph { .. }
        ));
    }

    #[test]
    fn test_headers_levels() {
        assert_eq!(
            classify_line("### How it Works"),
            RenderBlock::Header {
                level: 3,
                text: "How it Works".to_string()
            }
        );
        assert_eq!(
            classify_line("  ## Syntax Blueprint  "),
            RenderBlock::Header {
                level: 2,
                text: "Syntax Blueprint".to_string()
            }
        );
        assert!(matches!(
            classify_line("#### deep"),
            RenderBlock::Paragraph { .. }
        ));
    }

    #[test]
    fn test_list_items() {
        assert_eq!(
            classify_line("- **JVM** runs bytecode"),
            RenderBlock::ListItem {
                marker: ListMarker::Bullet,
                spans: vec![
                    Span::Bold("JVM".to_string()),
                    Span::Plain(" runs bytecode".to_string())
                ],
            }
        );
        assert_eq!(
            classify_line("12. twelfth"),
            RenderBlock::ListItem {
                marker: ListMarker::Ordered("12".to_string()),
                spans: vec![Span::Plain("twelfth".to_string())],
            }
        );
        assert!(matches!(
            classify_line("3.14 is pi"),
            RenderBlock::Paragraph { .. }
        ));
    }

    #[test]
    fn test_blank_line_is_spacer() {
        assert_eq!(classify_line("   \t"), RenderBlock::Spacer);
        assert_eq!(classify_line(""), RenderBlock::Spacer);
    }
}
