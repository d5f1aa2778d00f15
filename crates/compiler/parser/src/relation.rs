//! Entity-level relations, indexes and unique constraints.
//!
//! These come from three places: `@relation` / `@index` / `@unique` directives
//! (in the header or as a bullet line), terse lines in a `### Relations`
//! section, and `Name: A, B` lines in an `### Indexes` section.

use modelmark_compiler_diagnostics::{SchemaError, SchemaResult, SourceLocation};

use crate::attributes::split_semantic_attributes;
use crate::dialect::Grammar;
use crate::model::{keys_match, Attribute, Index, ReferentialAction, Relation, RelationKind};
use crate::syntax::{
    check_balanced, find_top_level, is_identifier, non_empty, parse_bool, split_description,
    split_key_value, split_top_level, take_trailing_quoted, unquote,
};

/// What an entity-level `@` directive turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Index(Index),
    Relation(Relation),
    /// Any other attribute, kept raw on the entity.
    Other(Attribute),
}

pub fn parse_directive(
    attribute: &Attribute,
    grammar: &dyn Grammar,
    location: &SourceLocation,
) -> SchemaResult<Directive> {
    if attribute.is("unique") || attribute.is("index") {
        let fields = attribute
            .positional_args()
            .map(|field| parse_field_reference(field, location))
            .collect::<SchemaResult<Vec<_>>>()?;
        let is_unique = attribute.is("unique")
            || attribute
                .named_arg("unique")
                .and_then(parse_bool)
                .unwrap_or(false);
        return build_index(
            attribute.named_arg("name").map(str::to_string),
            fields,
            is_unique,
            attribute.named_arg("description").map(str::to_string),
            grammar,
            location,
        )
        .map(Directive::Index);
    }

    if attribute.is("relation") {
        return parse_relation_directive(attribute, location).map(Directive::Relation);
    }

    Ok(Directive::Other(attribute.clone()))
}

fn parse_relation_directive(
    attribute: &Attribute,
    location: &SourceLocation,
) -> SchemaResult<Relation> {
    let mut name = attribute.named_arg("name").map(str::to_string);
    let mut target = None;

    for arg in attribute.positional_args() {
        if let Some((kind, rest)) = split_direction(arg) {
            target = Some((kind, parse_target(rest, location)?));
        } else if name.is_none() {
            name = Some(unquote(arg).to_string());
        } else {
            return Err(SchemaError::structural(
                format!("unexpected relation argument '{arg}'"),
                location.clone(),
            ));
        }
    }

    let (kind, target) = match (target, attribute.named_arg("target")) {
        (Some(target), _) => target,
        (None, Some(target)) => (RelationKind::ToOne, parse_target(target, location)?),
        (None, None) => {
            return Err(SchemaError::structural(
                format!("relation '{}' has no '->Target' or '<-Target'", attribute.raw),
                location.clone(),
            ))
        }
    };

    let mut relation = new_relation(kind, target, location);
    if let Some(name) = name {
        relation.name = name;
    }
    relation.from_field = attribute.named_arg("from").map(str::to_string);
    relation.on_delete = attribute
        .named_arg("onDelete")
        .map(|action| parse_action(action, location))
        .transpose()?;
    relation.on_update = attribute
        .named_arg("onUpdate")
        .map(|action| parse_action(action, location))
        .transpose()?;
    relation.description = attribute.named_arg("description").and_then(non_empty);
    Ok(relation)
}

/// `->X` / `>X` is to-one, `<-X` / `<X` is to-many.
fn split_direction(text: &str) -> Option<(RelationKind, &str)> {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("->").or_else(|| text.strip_prefix('>')) {
        Some((RelationKind::ToOne, rest))
    } else if let Some(rest) = text.strip_prefix("<-").or_else(|| text.strip_prefix('<')) {
        Some((RelationKind::ToMany, rest))
    } else {
        None
    }
}

fn parse_target(text: &str, location: &SourceLocation) -> SchemaResult<String> {
    let target = unquote(text.trim());
    if is_identifier(target) {
        Ok(target.to_string())
    } else {
        Err(SchemaError::structural(
            format!("'{target}' is not a valid relation target"),
            location.clone(),
        ))
    }
}

fn parse_action(text: &str, location: &SourceLocation) -> SchemaResult<ReferentialAction> {
    ReferentialAction::parse(text).ok_or_else(|| {
        SchemaError::structural(
            format!("unknown referential action '{}'", text.trim()),
            location.clone(),
        )
    })
}

fn new_relation(kind: RelationKind, target: String, location: &SourceLocation) -> Relation {
    Relation {
        name: target.clone(),
        kind,
        target,
        from_field: None,
        on_delete: None,
        on_update: None,
        description: None,
        location: location.clone(),
    }
}

/// Terse relation line: `>Target "description"`, `<Target as Lines #description`.
///
/// Returns `Ok(None)` when the line does not start with a direction marker.
pub fn parse_relation_line(text: &str, location: &SourceLocation) -> SchemaResult<Option<Relation>> {
    let Some((kind, rest)) = split_direction(text) else {
        return Ok(None);
    };
    let (rest, description) = split_description(rest);
    check_balanced(rest).map_err(|err| err.at_line(location))?;
    let (rest, quoted) = take_trailing_quoted(rest);

    let mut words = rest.split_whitespace();
    let Some(target) = words.next() else {
        return Err(SchemaError::structural(
            "relation line has no target",
            location.clone(),
        ));
    };
    let mut relation = new_relation(kind, parse_target(target, location)?, location);

    match (words.next(), words.next(), words.next()) {
        (None, _, _) => {}
        (Some(keyword), Some(name), None) if keyword.eq_ignore_ascii_case("as") && is_identifier(name) => {
            relation.name = name.to_string();
        }
        _ => {
            return Err(SchemaError::structural(
                format!("unexpected text in relation line '{}'", text.trim()),
                location.clone(),
            ))
        }
    }

    relation.description = description.or(quoted);
    Ok(Some(relation))
}

/// Refine the last relation with a `key: value` line.
pub fn apply_relation_property(
    relation: &mut Relation,
    text: &str,
    location: &SourceLocation,
) -> SchemaResult<()> {
    let (key, value) = property(text, location)?;
    if keys_match(key, "from") {
        relation.from_field = non_empty(unquote(value));
    } else if keys_match(key, "onDelete") {
        relation.on_delete = Some(parse_action(value, location)?);
    } else if keys_match(key, "onUpdate") {
        relation.on_update = Some(parse_action(value, location)?);
    } else if keys_match(key, "description") || keys_match(key, "desc") {
        relation.description = non_empty(unquote(value));
    } else if keys_match(key, "name") {
        relation.name = unquote(value).to_string();
    } else {
        return Err(SchemaError::structural(
            format!("unknown relation property '{key}'"),
            location.clone(),
        ));
    }
    Ok(())
}

/// `Name: FieldA, FieldB @unique #description`, or just `FieldA, FieldB`.
pub fn parse_index_line(
    text: &str,
    grammar: &dyn Grammar,
    location: &SourceLocation,
) -> SchemaResult<Index> {
    let (body, description) = split_description(text);
    check_balanced(body).map_err(|err| err.at_line(location))?;
    let (body, attributes, quoted) =
        split_semantic_attributes(body).map_err(|err| err.at_line(location))?;

    let (name, fields_text) = match find_top_level(body, ':') {
        Some(colon) => (non_empty(unquote(&body[..colon])), &body[colon + 1..]),
        None => (None, body),
    };
    let fields = split_top_level(fields_text, ',')
        .into_iter()
        .map(|field| parse_field_reference(field, location))
        .collect::<SchemaResult<Vec<_>>>()?;
    let is_unique = attributes.iter().any(|attr| attr.is("unique"));

    build_index(name, fields, is_unique, description.or(quoted), grammar, location)
}

/// Refine the last index with a `key: value` line.
pub fn apply_index_property(
    index: &mut Index,
    text: &str,
    grammar: &dyn Grammar,
    location: &SourceLocation,
) -> SchemaResult<()> {
    let (key, value) = property(text, location)?;
    let generated_name = generated_index_name(grammar, &index.fields, index.is_unique);
    let was_generated = index.name == generated_name;

    if keys_match(key, "fields") {
        index.fields = split_top_level(value, ',')
            .into_iter()
            .map(|field| parse_field_reference(field, location))
            .collect::<SchemaResult<Vec<_>>>()?;
    } else if keys_match(key, "unique") {
        index.is_unique = parse_bool(value).ok_or_else(|| {
            SchemaError::structural(format!("'{value}' is not a boolean"), location.clone())
        })?;
    } else if keys_match(key, "description") || keys_match(key, "desc") {
        index.description = non_empty(unquote(value));
        return Ok(());
    } else if keys_match(key, "name") {
        index.name = unquote(value).to_string();
        return Ok(());
    } else {
        return Err(SchemaError::structural(
            format!("unknown index property '{key}'"),
            location.clone(),
        ));
    }

    if was_generated {
        index.name = generated_index_name(grammar, &index.fields, index.is_unique);
    }
    Ok(())
}

fn property<'a>(text: &'a str, location: &SourceLocation) -> SchemaResult<(&'a str, &'a str)> {
    check_balanced(text).map_err(|err| err.at_line(location))?;
    split_key_value(text.trim()).ok_or_else(|| {
        SchemaError::structural(
            format!("expected 'key: value', found '{}'", text.trim()),
            location.clone(),
        )
    })
}

fn parse_field_reference(text: &str, location: &SourceLocation) -> SchemaResult<String> {
    let field = unquote(text);
    if is_identifier(field) {
        Ok(field.to_string())
    } else {
        Err(SchemaError::structural(
            format!("'{field}' is not a valid field name in an index"),
            location.clone(),
        ))
    }
}

fn generated_index_name(grammar: &dyn Grammar, fields: &[String], is_unique: bool) -> String {
    if is_unique {
        grammar.unique_name(fields)
    } else {
        grammar.index_name(fields)
    }
}

fn build_index(
    name: Option<String>,
    fields: Vec<String>,
    is_unique: bool,
    description: Option<String>,
    grammar: &dyn Grammar,
    location: &SourceLocation,
) -> SchemaResult<Index> {
    if fields.is_empty() {
        return Err(SchemaError::structural(
            "index declares no fields",
            location.clone(),
        ));
    }
    let name = name.unwrap_or_else(|| generated_index_name(grammar, &fields, is_unique));
    Ok(Index {
        name,
        fields,
        is_unique,
        description,
        location: location.clone(),
    })
}
