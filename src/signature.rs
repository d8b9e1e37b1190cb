//! Signature help for the call enclosing the cursor

use crate::schema::Schema;
use crate::token::{is_ident_char, mask_literals};
use serde::{Deserialize, Serialize};

/// Signature of the function or operator being called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureHelp {
    /// Syntax line, or `name()` when the catalog has none
    pub label: String,
    /// Description and parameter documentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Zero-based index of the argument under the cursor
    pub active_parameter: usize,
}

/// Find the innermost unclosed call before the cursor and describe it
///
/// String literal contents and `//` comments are ignored when matching
/// parentheses and counting argument separators.
#[must_use]
pub fn signature_help(schema: &Schema, text_before_cursor: &str) -> Option<SignatureHelp> {
    let masked: Vec<char> = text_before_cursor
        .split('\n')
        .map(mask_literals)
        .collect::<Vec<_>>()
        .join("\n")
        .chars()
        .collect();

    let mut depth = 0usize;
    let mut commas = 0usize;
    let mut open = None;
    for (i, &c) in masked.iter().enumerate().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => {
                open = Some(i);
                break;
            }
            '(' => depth -= 1,
            ',' if depth == 0 => commas += 1,
            _ => {}
        }
    }

    let open = open?;
    let mut name_end = open;
    while name_end > 0 && masked[name_end - 1].is_whitespace() {
        name_end -= 1;
    }
    let mut name_start = name_end;
    while name_start > 0 && (is_ident_char(masked[name_start - 1]) || masked[name_start - 1] == '-') {
        name_start -= 1;
    }
    if name_start == name_end {
        return None;
    }
    let name: String = masked[name_start..name_end].iter().collect();

    let entry = schema
        .find_function(&name)
        .or_else(|| schema.find_operator(&name))?;

    let documentation = match (&entry.description, &entry.parameters_doc) {
        (Some(d), Some(p)) => Some(format!("{d}\n\n{p}")),
        (Some(d), None) => Some(d.clone()),
        (None, Some(p)) => Some(p.clone()),
        (None, None) => None,
    };

    Some(SignatureHelp {
        label: entry
            .syntax
            .clone()
            .unwrap_or_else(|| format!("{}()", entry.name)),
        documentation,
        active_parameter: commas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Entry;

    fn schema() -> Schema {
        Schema::new()
            .function(
                Entry::new("strcat", "String")
                    .syntax("strcat(arg1, arg2, ...)")
                    .description("Concatenates strings")
                    .parameters("`argN`: expressions to concatenate"),
            )
            .function(Entry::new("tolower", "String"))
    }

    #[test]
    fn test_active_parameter() {
        let help = signature_help(&schema(), "| extend x = strcat(name, ', ', ").unwrap();
        assert_eq!(help.label, "strcat(arg1, arg2, ...)");
        assert_eq!(help.active_parameter, 2);
        assert!(help.documentation.unwrap().contains("Concatenates"));
    }

    #[test]
    fn test_nested_call_uses_innermost() {
        let help = signature_help(&schema(), "| extend x = strcat(tolower(name").unwrap();
        assert_eq!(help.label, "tolower()");
        assert_eq!(help.active_parameter, 0);
    }

    #[test]
    fn test_closed_call_falls_back_to_outer() {
        let help = signature_help(&schema(), "strcat(tolower(name), ").unwrap();
        assert_eq!(help.label, "strcat(arg1, arg2, ...)");
        assert_eq!(help.active_parameter, 1);
    }

    #[test]
    fn test_no_call() {
        assert!(signature_help(&schema(), "Resources | where ").is_none());
        assert!(signature_help(&schema(), "| where unknownfn(").is_none());
        assert!(signature_help(&schema(), "| where (").is_none());
    }
}
