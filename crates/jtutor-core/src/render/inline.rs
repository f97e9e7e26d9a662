//! Inline `**bold**` parsing.

use super::blocks::Span;

const BOLD: &str = "**";

/// Splits `text` into plain and bold spans.
///
/// Delimiters pair left to right within the text; a `**` with no partner is
/// kept literally. Empty runs produce no span.
pub fn parse_bold(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(open) = rest.find(BOLD) {
        let after_open = &rest[open + BOLD.len()..];
        let Some(close) = after_open.find(BOLD) else {
            break;
        };

        plain.push_str(&rest[..open]);
        let bold = &after_open[..close];
        if !bold.is_empty() {
            if !plain.is_empty() {
                spans.push(Span::Plain(std::mem::take(&mut plain)));
            }
            spans.push(Span::Bold(bold.to_string()));
        }
        rest = &after_open[close + BOLD.len()..];
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        spans.push(Span::Plain(plain));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(s: &str) -> Span {
        Span::Plain(s.to_string())
    }

    fn bold(s: &str) -> Span {
        Span::Bold(s.to_string())
    }

    #[test]
    fn test_bold_runs_become_bold_spans() {
        assert_eq!(
            parse_bold("A **class** is a **blueprint**."),
            vec![
                plain("A "),
                bold("class"),
                plain(" is a "),
                bold("blueprint"),
                plain(".")
            ]
        );
    }

    #[test]
    fn test_unmatched_delimiter_stays_literal() {
        assert_eq!(
            parse_bold("a **b** c ** d"),
            vec![plain("a "), bold("b"), plain(" c ** d")]
        );
        assert_eq!(parse_bold("2 ** 3"), vec![plain("2 ** 3")]);
    }

    #[test]
    fn test_delimiters_pair_left_to_right() {
        assert_eq!(
            parse_bold("**x **y** z"),
            vec![bold("x "), plain("y** z")]
        );
    }

    #[test]
    fn test_empty_bold_is_dropped() {
        assert_eq!(parse_bold("a****b"), vec![plain("ab")]);
        assert!(parse_bold("").is_empty());
    }
}
