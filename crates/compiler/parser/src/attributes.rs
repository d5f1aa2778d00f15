//! Parsing of `@name(args)` semantic tokens and `[Name(args)]` framework tokens.

use crate::grammar::{parse_attribute_run, parse_call_list};
use crate::model::Attribute;
use crate::syntax::{find_top_level, matching_close, take_trailing_quoted, SyntaxError};

/// Parse a run of `@name` / `@name(args)` tokens separated by whitespace or commas.
pub fn parse_semantic_attributes(text: &str) -> Result<Vec<Attribute>, SyntaxError> {
    parse_attribute_run(text)
}

/// Split the semantic-attribute region off the end of `text`.
///
/// The region starts at the first top-level `@`. A quoted string closing the
/// region is returned separately as a description.
pub fn split_semantic_attributes(
    text: &str,
) -> Result<(&str, Vec<Attribute>, Option<String>), SyntaxError> {
    let Some(at) = find_top_level(text, '@') else {
        return Ok((text, Vec::new(), None));
    };
    let (region, quoted) = take_trailing_quoted(&text[at..]);
    let attributes = parse_semantic_attributes(region)?;
    Ok((&text[..at], attributes, quoted))
}

/// Remove every `[...]` token outside quotes and parentheses.
///
/// A single bracket may hold several comma-separated attributes:
/// `[Required, MaxLength(50)]`. The removed tokens are replaced by a space.
pub fn extract_framework_attributes(text: &str) -> Result<(String, Vec<Attribute>), SyntaxError> {
    let mut remaining = String::with_capacity(text.len());
    let mut attributes = Vec::new();
    let mut cursor = 0;

    while let Some(open) = find_open_bracket(&text[cursor..]).map(|idx| idx + cursor) {
        let close = matching_close(text, open)?;
        let inner = text[open + 1..close].trim();
        if inner.is_empty() {
            return Err(SyntaxError::UnexpectedText {
                text: "[]".to_string(),
            });
        }
        attributes.extend(parse_call_list(inner)?);
        remaining.push_str(&text[cursor..open]);
        remaining.push(' ');
        cursor = close + 1;
    }
    remaining.push_str(&text[cursor..]);

    Ok((remaining, attributes))
}

/// First `[` not inside quotes or parentheses.
fn find_open_bracket(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '`' => quote = Some(ch),
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}
