//! Extracting the token under the cursor
//!
//! Besides plain identifiers, KQL operator names may carry a `!` negation
//! prefix (`!contains`), internal hyphens (`mv-expand`, `project-away`) and a
//! `~` case-insensitivity suffix (`in~`).

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!?\w+(?:-\w+)*~?$").expect("valid regex"));

/// A token located on a single line
///
/// Columns are character offsets; `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text including any `!` / `~` decoration
    pub text: String,
    /// First column of the token
    pub start: usize,
    /// Column just past the token
    pub end: usize,
}

impl Token {
    /// Token text with the `!` prefix and `~` suffix removed
    #[must_use]
    pub fn base_name(&self) -> &str {
        base_name(&self.text)
    }
}

/// Strip a leading `!` and trailing `~` from a symbol name
#[must_use]
pub fn base_name(name: &str) -> &str {
    let name = name.strip_prefix('!').unwrap_or(name);
    name.strip_suffix('~').unwrap_or(name)
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Blank out string literal contents and trailing `//` comments
///
/// Characters are replaced one-for-one with spaces so that character columns
/// of the masked line match the original.
pub(crate) fn mask_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    out.push(' ');
                } else if c == '\\' {
                    escaped = true;
                    out.push(' ');
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    out.push(' ');
                }
            }
            None => {
                if c == '/' && chars.peek() == Some(&'/') {
                    let rest = 1 + chars.count();
                    out.extend(std::iter::repeat(' ').take(rest));
                    break;
                }
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

/// Extract the token at `column` in `line`
///
/// When the cursor sits on a delimiter the preceding character is tried, so a
/// cursor just past the end of a word still finds it.
#[must_use]
pub fn extract_token(line: &str, column: usize) -> Option<Token> {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let col = column.min(len);
    let at = |i: usize| chars.get(i).copied();
    let ident_at = |i: usize| at(i).is_some_and(is_ident_char);

    let anchor = if ident_at(col) {
        col
    } else if at(col) == Some('!') && ident_at(col + 1) {
        col + 1
    } else if col > 0 && ident_at(col - 1) {
        col - 1
    } else if col > 1 && at(col - 1) == Some('~') && ident_at(col - 2) {
        col - 2
    } else {
        return None;
    };

    let mut start = anchor;
    while start > 0 {
        let prev = chars[start - 1];
        if is_ident_char(prev) || (prev == '-' && start >= 2 && is_ident_char(chars[start - 2])) {
            start -= 1;
        } else {
            break;
        }
    }
    if start > 0 && chars[start - 1] == '!' {
        start -= 1;
    }

    let mut end = anchor + 1;
    while end < len {
        let c = chars[end];
        if is_ident_char(c) || (c == '-' && ident_at(end + 1)) {
            end += 1;
        } else if c == '~' {
            // `~` is always token-final
            end += 1;
            break;
        } else {
            break;
        }
    }

    let text: String = chars[start..end].iter().collect();
    if !TOKEN_SHAPE.is_match(&text) || !text.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(Token { text, start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(line: &str, column: usize) -> Option<String> {
        extract_token(line, column).map(|t| t.text)
    }

    #[test]
    fn test_plain_identifier() {
        let token = extract_token("Resources | where name", 3).unwrap();
        assert_eq!(token.text, "Resources");
        assert_eq!((token.start, token.end), (0, 9));
    }

    #[test]
    fn test_hyphenated_operator() {
        assert_eq!(text_at("| mv-expand tags", 4).as_deref(), Some("mv-expand"));
        assert_eq!(text_at("| project-away id", 10).as_deref(), Some("project-away"));
    }

    #[test]
    fn test_hyphen_needs_identifier_on_both_sides() {
        assert_eq!(text_at("x - y", 0).as_deref(), Some("x"));
        assert_eq!(text_at("count-", 2).as_deref(), Some("count"));
    }

    #[test]
    fn test_negation_and_case_suffix() {
        let line = "| where name !contains~ 'a'";
        assert_eq!(text_at(line, 13).as_deref(), Some("!contains~"));
        assert_eq!(text_at(line, 16).as_deref(), Some("!contains~"));
        assert_eq!(text_at(line, 23).as_deref(), Some("!contains~"));
        assert_eq!(text_at("where type in~ ('a')", 12).as_deref(), Some("in~"));
        // Tilde terminates the scan
        assert_eq!(text_at("has~x", 0).as_deref(), Some("has~"));
    }

    #[test]
    fn test_cursor_after_token() {
        let line = "| summarize count(";
        assert_eq!(text_at(line, 17).as_deref(), Some("count"));
        assert_eq!(text_at("| where", 7).as_deref(), Some("where"));
    }

    #[test]
    fn test_rejects_non_tokens() {
        assert_eq!(text_at("", 0), None);
        assert_eq!(text_at("  |  ", 2), None);
        assert_eq!(text_at("| take 100", 8), None);
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("!contains~"), "contains");
        assert_eq!(base_name("in~"), "in");
        assert_eq!(base_name("where"), "where");
    }

    #[test]
    fn test_mask_literals_keeps_columns() {
        assert_eq!(mask_literals("a 'x|y' b"), "a '   ' b");
        assert_eq!(mask_literals("a // | c"), "a       ");
        assert_eq!(mask_literals(r#"x "a\"|" y"#), r#"x "    " y"#);
    }
}
