//! Quote- and bracket-aware string helpers shared by the line grammars.
//!
//! Every helper treats `"..."` and `` `...` `` as opaque and tracks nesting of
//! `()`, `[]` and `{}`, so that a character is only "top level" when it sits
//! outside all of them.

use modelmark_compiler_diagnostics::{DiagnosticCode, SchemaError, SourceLocation};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("unterminated {quote} string")]
    UnterminatedQuote { quote: char, at: usize },

    #[error("'{open}' is never closed")]
    Unclosed { open: char, at: usize },

    #[error("unexpected '{close}'")]
    Unexpected { close: char, at: usize },

    #[error("unexpected '{text}'")]
    UnexpectedText { text: String },
}

impl SyntaxError {
    /// Promote to a fatal error reported at the given line.
    pub fn at_line(self, location: &SourceLocation) -> SchemaError {
        let code = match self {
            Self::UnexpectedText { .. } => DiagnosticCode::StructuralParseError,
            _ => DiagnosticCode::UnterminatedDelimiter,
        };
        SchemaError::structural_with_code(code, self.to_string(), location.clone())
    }
}

const fn is_quote(ch: char) -> bool {
    matches!(ch, '"' | '`')
}

const fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

const fn is_closer(ch: char) -> bool {
    matches!(ch, ')' | ']' | '}')
}

/// Iterator over the characters of a string that sit outside quotes and brackets.
/// Quote and bracket characters themselves are never yielded.
pub struct TopLevel<'a> {
    chars: std::str::CharIndices<'a>,
    depth: usize,
    quote: Option<char>,
    escaped: bool,
}

impl Iterator for TopLevel<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, ch) in self.chars.by_ref() {
            if let Some(quote) = self.quote {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == quote {
                    self.quote = None;
                }
                continue;
            }
            if is_quote(ch) {
                self.quote = Some(ch);
            } else if closer_for(ch).is_some() {
                self.depth += 1;
            } else if is_closer(ch) {
                self.depth = self.depth.saturating_sub(1);
            } else if self.depth == 0 {
                return Some((idx, ch));
            }
        }
        None
    }
}

pub fn top_level_chars(text: &str) -> TopLevel<'_> {
    TopLevel {
        chars: text.char_indices(),
        depth: 0,
        quote: None,
        escaped: false,
    }
}

/// Check that every quote is terminated and every bracket is closed in order.
pub fn check_balanced(text: &str) -> Result<(), SyntaxError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if let Some((q, _)) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if is_quote(ch) {
            quote = Some((ch, idx));
        } else if closer_for(ch).is_some() {
            stack.push((ch, idx));
        } else if is_closer(ch) {
            match stack.pop() {
                Some((open, _)) if closer_for(open) == Some(ch) => {}
                _ => return Err(SyntaxError::Unexpected { close: ch, at: idx }),
            }
        }
    }

    if let Some((quote, at)) = quote {
        return Err(SyntaxError::UnterminatedQuote { quote, at });
    }
    if let Some((open, at)) = stack.pop() {
        return Err(SyntaxError::Unclosed { open, at });
    }
    Ok(())
}

/// Index of the bracket closing the one at `open_idx`.
pub fn matching_close(text: &str, open_idx: usize) -> Result<usize, SyntaxError> {
    let Some(open) = text[open_idx..].chars().next() else {
        return Err(SyntaxError::Unclosed {
            open: '(',
            at: open_idx,
        });
    };
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text[open_idx..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if is_quote(ch) {
            quote = Some(ch);
        } else if closer_for(ch).is_some() {
            depth += 1;
        } else if is_closer(ch) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Ok(open_idx + offset);
            }
        }
    }

    match quote {
        Some(quote) => Err(SyntaxError::UnterminatedQuote {
            quote,
            at: open_idx,
        }),
        None => Err(SyntaxError::Unclosed { open, at: open_idx }),
    }
}

pub fn find_top_level(text: &str, target: char) -> Option<usize> {
    top_level_chars(text)
        .find(|(_, ch)| *ch == target)
        .map(|(idx, _)| idx)
}

/// Split on a top-level separator, trimming pieces and dropping empty ones.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, ch) in top_level_chars(text) {
        if ch == separator {
            pieces.push(&text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Position of a top-level `#` that is not part of a `##` run.
pub fn find_description_hash(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    top_level_chars(text)
        .find(|&(idx, ch)| {
            ch == '#'
                && (idx == 0 || bytes[idx - 1] != b'#')
                && !matches!(bytes.get(idx + 1), Some(b'#'))
        })
        .map(|(idx, _)| idx)
}

/// Strip a trailing `#description`.
pub fn split_description(text: &str) -> (&str, Option<String>) {
    match find_description_hash(text) {
        Some(idx) => (&text[..idx], non_empty(text[idx + 1..].trim())),
        None => (text, None),
    }
}

/// Strip a trailing `"quoted"` string, returning its unescaped contents.
pub fn take_trailing_quoted(text: &str) -> (&str, Option<String>) {
    let trimmed = text.trim_end();
    if !trimmed.ends_with('"') {
        return (text, None);
    }

    let mut last_open = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    for (idx, ch) in trimmed.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        if is_quote(ch) {
            quote = Some(ch);
            if ch == '"' && depth == 0 {
                last_open = Some(idx);
            }
        } else if closer_for(ch).is_some() {
            depth += 1;
        } else if is_closer(ch) {
            depth = depth.saturating_sub(1);
        }
    }

    match last_open {
        Some(open) if quote.is_none() && open + 1 < trimmed.len() => {
            let inner = &trimmed[open + 1..trimmed.len() - 1];
            (&trimmed[..open], Some(inner.replace("\\\"", "\"")))
        }
        _ => (text, None),
    }
}

/// Remove one pair of surrounding double quotes.
pub fn unquote(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Contents of a backtick-quoted expression.
pub fn unquote_expression(text: &str) -> Option<&str> {
    let text = text.trim();
    (text.len() >= 2 && text.starts_with('`') && text.ends_with('`'))
        .then(|| &text[1..text.len() - 1])
}

/// `[A-Za-z_][A-Za-z0-9_.]*`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Split `Name(Label)` into name and label. `None` if the name is not an identifier.
pub fn split_name_label(text: &str) -> Option<(&str, Option<String>)> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        return is_identifier(text).then_some((text, None));
    };
    if !text.ends_with(')') {
        return None;
    }
    let name = text[..open].trim();
    let label = unquote(&text[open + 1..text.len() - 1]);
    is_identifier(name).then(|| (name, non_empty(label)))
}

/// Split `key: value` or `key = value`, whichever separator comes first at top level.
pub fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let (idx, _) = top_level_chars(text).find(|(_, ch)| matches!(ch, ':' | '='))?;
    let key = text[..idx].trim();
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    valid_key.then(|| (key, text[idx + 1..].trim()))
}

pub fn parse_bool(text: &str) -> Option<bool> {
    match unquote(text).to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
