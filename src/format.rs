//! Pipe alignment
//!
//! The only formatting the service performs: every top-level `|` starts its
//! own line, indented like the line that began the statement. Pipes inside
//! string literals, comments and parentheses (join sub-queries) are left
//! alone.

use crate::token::mask_literals;

/// Put each top-level pipe of `text` on its own line
#[must_use]
pub fn align_pipes(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut head_indent = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") || depth > 0 {
            depth = update_depth(depth, &mask_literals(line));
            out.push(line.trim_end().to_string());
            continue;
        }

        let masked = mask_literals(line);
        let mut pieces = Vec::new();
        let mut last = 0;
        for ((byte, _), m) in line.char_indices().zip(masked.chars()) {
            match m {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                '|' if depth == 0 => {
                    pieces.push(&line[last..byte]);
                    last = byte + 1;
                }
                _ => {}
            }
        }
        pieces.push(&line[last..]);

        let mut pieces = pieces.into_iter();
        if let Some(head) = pieces.next() {
            if !head.trim().is_empty() {
                head_indent = leading_whitespace(line).to_string();
                out.push(head.trim_end().to_string());
            }
        }
        for piece in pieces {
            let piece = piece.trim();
            if piece.is_empty() {
                out.push(format!("{head_indent}|"));
            } else {
                out.push(format!("{head_indent}| {piece}"));
            }
        }
    }

    let mut formatted = out.join("\n");
    if text.ends_with('\n') {
        formatted.push('\n');
    }
    formatted
}

fn update_depth(depth: usize, masked: &str) -> usize {
    masked.chars().fold(depth, |d, c| match c {
        '(' => d + 1,
        ')' => d.saturating_sub(1),
        _ => d,
    })
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_inline_pipes() {
        assert_eq!(
            align_pipes("Resources | where type == 'a|b' | project name"),
            "Resources\n| where type == 'a|b'\n| project name"
        );
    }

    #[test]
    fn test_normalizes_existing_pipe_lines() {
        assert_eq!(
            align_pipes("Resources\n    |   where x == 1\n|project name\n"),
            "Resources\n| where x == 1\n| project name\n"
        );
    }

    #[test]
    fn test_keeps_join_subquery_intact() {
        let text = "Resources\n| join (ResourceContainers | project id) on id";
        assert_eq!(align_pipes(text), text);
    }

    #[test]
    fn test_multiline_subquery_and_comments() {
        let text = "Resources\n| join (\n    ResourceContainers\n    | project id\n) on id\n// a | b";
        assert_eq!(align_pipes(text), text);
    }

    #[test]
    fn test_indented_statement() {
        assert_eq!(
            align_pipes("  Resources | take 1"),
            "  Resources\n  | take 1"
        );
    }
}
