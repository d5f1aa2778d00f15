//! Entity header lines: `Name(Label) ::interface : Base1, Base2 @attr(args) #description`.

use modelmark_compiler_diagnostics::{SchemaError, SchemaResult, SourceLocation};
use tracing::trace;

use crate::attributes::parse_semantic_attributes;
use crate::dialect::{Grammar, KindMarker};
use crate::model::{Attribute, EntityKind};
use crate::syntax::{
    check_balanced, find_top_level, is_identifier, split_description, split_name_label,
    split_top_level, take_trailing_quoted, top_level_chars,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub kind: EntityKind,
    pub name: String,
    pub label: Option<String>,
    pub inherits: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub description: Option<String>,
}

impl Header {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.is(name))
    }
}

pub fn parse_header(
    text: &str,
    grammar: &dyn Grammar,
    location: &SourceLocation,
) -> SchemaResult<Header> {
    let (text, marker) = strip_kind_marker(text, location)?;
    let text = text.as_str();

    let (head, region) = match find_top_level(text, '@') {
        Some(at) => text.split_at(at),
        None => (text, ""),
    };
    let (region, trailing) = split_description(region);
    let (head, leading) = split_description(head);
    let mut description = trailing.or(leading);

    let (region, quoted) = take_trailing_quoted(region);
    check_balanced(region).map_err(|err| err.at_line(location))?;
    let attributes = parse_semantic_attributes(region).map_err(|err| err.at_line(location))?;
    description = description.or(quoted);

    check_balanced(head).map_err(|err| err.at_line(location))?;
    let (head, quoted) = take_trailing_quoted(head);
    description = description.or(quoted);

    let (name_part, inherits_part) = match find_top_level(head, ':') {
        Some(colon) => (&head[..colon], Some(&head[colon + 1..])),
        None => (head, None),
    };

    let Some((name, label)) = split_name_label(name_part) else {
        return Err(SchemaError::structural(
            format!("'{}' is not a valid entity name", name_part.trim()),
            location.clone(),
        ));
    };

    let mut inherits = Vec::new();
    for parent in inherits_part.map(|p| split_top_level(p, ',')).unwrap_or_default() {
        if !is_identifier(parent) {
            return Err(SchemaError::structural(
                format!("'{parent}' is not a valid inherited entity name"),
                location.clone(),
            ));
        }
        inherits.push(parent.to_string());
    }

    let kind = grammar
        .entity_kind(name, marker)
        .map_err(|message| SchemaError::structural(message, location.clone()))?;

    trace!("header {kind} '{name}' inherits {inherits:?}");

    Ok(Header {
        kind,
        name: name.to_string(),
        label,
        inherits,
        attributes,
        description,
    })
}

/// Remove a `::interface` / `::enum` marker from outside quotes and parentheses.
fn strip_kind_marker(
    text: &str,
    location: &SourceLocation,
) -> SchemaResult<(String, Option<KindMarker>)> {
    let mut previous_colon = None;
    for (idx, ch) in top_level_chars(text) {
        if ch != ':' {
            previous_colon = None;
            continue;
        }
        let Some(start) = previous_colon.filter(|start| start + 1 == idx) else {
            previous_colon = Some(idx);
            continue;
        };
        let word_start = idx + 1;
        let word_len = text[word_start..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(text.len() - word_start);
        let word = &text[word_start..word_start + word_len];
        let Some(marker) = KindMarker::parse(word) else {
            return Err(SchemaError::structural(
                format!("unknown entity kind marker '::{word}'"),
                location.clone(),
            ));
        };
        let mut stripped = String::with_capacity(text.len());
        stripped.push_str(&text[..start]);
        stripped.push(' ');
        stripped.push_str(&text[word_start + word_len..]);
        return Ok((stripped, Some(marker)));
    }
    Ok((text.to_string(), None))
}
