//! Field declarations.
//!
//! The simple form packs everything on one line:
//!
//! ```text
//! - Name(Label): Type(length)? = default @attr(args) [Framework(args)] #description
//! ```
//!
//! A line carrying only a name opens the extended form, whose deeper bullet
//! lines supply the properties one per line. Extraction order on a simple
//! line matters: bracketed framework attributes go first since their argument
//! lists may hold `=` or `#`, then the description, then `@` attributes, then
//! the default value, and what survives is the type.

use modelmark_compiler_diagnostics::{DiagnosticCode, SchemaError, SchemaResult, SourceLocation};

use crate::attributes::{extract_framework_attributes, split_semantic_attributes};
use crate::grammar::{parse_type_syntax, TypeSyntax};
use crate::model::{keys_match, DefaultValue, EnumValue, Field, Length};
use crate::syntax::{
    check_balanced, find_top_level, non_empty, parse_bool, split_description,
    split_key_value, split_name_label, split_top_level, take_trailing_quoted, unquote,
    unquote_expression,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldForm {
    /// `- Name: Type ...`
    Simple,
    /// `- Name` followed by property lines.
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedField {
    pub field: Field,
    pub form: FieldForm,
}

pub fn parse_field(text: &str, location: &SourceLocation) -> SchemaResult<ParsedField> {
    let (body, framework_attributes) =
        extract_framework_attributes(text).map_err(|err| err.at_line(location))?;
    let (body, description) = split_description(&body);
    check_balanced(body).map_err(|err| err.at_line(location))?;
    let (body, semantic_attributes, quoted) =
        split_semantic_attributes(body).map_err(|err| err.at_line(location))?;

    let mut description = description.or(quoted);

    let (name_part, form, type_part) = match find_top_level(body, ':') {
        Some(colon) => (&body[..colon], FieldForm::Simple, Some(&body[colon + 1..])),
        None => {
            let (name_part, quoted) = take_trailing_quoted(body);
            description = description.or(quoted);
            (name_part, FieldForm::Extended, None)
        }
    };

    let Some((name, label)) = split_name_label(name_part) else {
        let message = match form {
            FieldForm::Simple => format!("'{}' is not a valid field name", name_part.trim()),
            FieldForm::Extended => format!("expected 'Name: Type', found '{}'", text.trim()),
        };
        return Err(SchemaError::structural(message, location.clone()));
    };

    let mut field = Field::new(name, "").with_location(location.clone());
    field.label = label;
    field.framework_attributes = framework_attributes;
    field.semantic_attributes = semantic_attributes;

    if let Some(type_part) = type_part {
        let (type_part, quoted) = split_trailing_description(type_part);
        description = description.or(quoted);
        apply_type_and_default(&mut field, type_part, location)?;
        if field.field_type.is_empty() {
            return Err(missing_type(&field.name, location));
        }
    }
    field.description = description;

    Ok(ParsedField { field, form })
}

/// Apply one property line of an extended field (or refine a simple one).
pub fn apply_field_property(
    field: &mut Field,
    text: &str,
    location: &SourceLocation,
) -> SchemaResult<()> {
    let text = text.trim();

    if text.starts_with('[') {
        let (rest, attributes) =
            extract_framework_attributes(text).map_err(|err| err.at_line(location))?;
        let (rest, description) = split_description(&rest);
        expect_consumed(rest, location)?;
        field.framework_attributes.extend(attributes);
        if description.is_some() {
            field.description = description;
        }
        return Ok(());
    }

    if text.starts_with('@') {
        check_balanced(text).map_err(|err| err.at_line(location))?;
        let (rest, attributes, quoted) =
            split_semantic_attributes(text).map_err(|err| err.at_line(location))?;
        expect_consumed(rest, location)?;
        field.semantic_attributes.extend(attributes);
        if quoted.is_some() {
            field.description = quoted;
        }
        return Ok(());
    }

    if field.is_enum() && find_top_level(text, ':').is_none() {
        field.enum_options.push(parse_enum_value(text, location)?);
        return Ok(());
    }

    check_balanced(text).map_err(|err| err.at_line(location))?;
    let Some((key, value)) = split_key_value(text) else {
        return Err(SchemaError::structural(
            format!("unrecognized property line '{text}' under field '{}'", field.name),
            location.clone(),
        ));
    };

    match property_key(key) {
        Some(Property::Type) => apply_type_and_default(field, value, location)?,
        Some(Property::Description) => field.description = non_empty(unquote(value)),
        Some(Property::Default) => field.default_value = Some(parse_default(value, location)?),
        Some(Property::Label) => field.label = non_empty(unquote(value)),
        Some(Property::Nullable) => {
            field.nullable = parse_bool(value).ok_or_else(|| {
                SchemaError::structural(
                    format!("'{value}' is not a boolean"),
                    location.clone(),
                )
            })?;
        }
        Some(Property::Length) => field.length = Some(parse_length(value, location)?),
        Some(Property::Values) => field.enum_options.extend(parse_enum_options(value, location)?),
        None => {
            field
                .metadata
                .insert(key.to_string(), unquote(value).to_string());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Property {
    Type,
    Description,
    Default,
    Label,
    Nullable,
    Length,
    Values,
}

fn property_key(key: &str) -> Option<Property> {
    const KEYS: &[(&str, Property)] = &[
        ("type", Property::Type),
        ("description", Property::Description),
        ("desc", Property::Description),
        ("default", Property::Default),
        ("label", Property::Label),
        ("nullable", Property::Nullable),
        ("length", Property::Length),
        ("values", Property::Values),
        ("options", Property::Values),
    ];
    KEYS.iter()
        .find(|(name, _)| keys_match(name, key))
        .map(|(_, property)| *property)
}

fn expect_consumed(rest: &str, location: &SourceLocation) -> SchemaResult<()> {
    if rest.trim().is_empty() {
        Ok(())
    } else {
        Err(SchemaError::structural(
            format!("unexpected '{}' after attributes", rest.trim()),
            location.clone(),
        ))
    }
}

fn missing_type(name: &str, location: &SourceLocation) -> SchemaError {
    SchemaError::structural_with_code(
        DiagnosticCode::MissingType,
        format!("field '{name}' has no type"),
        location.clone(),
    )
}

/// Report an extended field whose property lines never supplied a type.
pub fn ensure_typed(field: &Field) -> SchemaResult<()> {
    if field.field_type.is_empty() {
        Err(missing_type(&field.name, &field.location))
    } else {
        Ok(())
    }
}

/// A quoted string closing the type part is a description unless it is the default value.
fn split_trailing_description(text: &str) -> (&str, Option<String>) {
    let (rest, quoted) = take_trailing_quoted(text);
    match quoted {
        Some(_) if rest.trim_end().ends_with('=') => (text, None),
        Some(_) if rest.trim().is_empty() => (text, None),
        _ => (rest, quoted),
    }
}

fn apply_type_and_default(
    field: &mut Field,
    text: &str,
    location: &SourceLocation,
) -> SchemaResult<()> {
    let (type_text, default) = split_default(text, location)?;
    parse_type(field, type_text, location)?;
    if default.is_some() {
        field.default_value = default;
    }
    Ok(())
}

/// Split at the first top-level `=`, unless the type is an unparenthesized
/// enum option list such as `enum A=1|B=2`.
fn split_default<'a>(
    text: &'a str,
    location: &SourceLocation,
) -> SchemaResult<(&'a str, Option<DefaultValue>)> {
    let Some(eq) = find_top_level(text, '=') else {
        return Ok((text, None));
    };
    let type_word = leading_word(text.trim_start());
    if type_word.eq_ignore_ascii_case("enum") && find_top_level(text, '|').is_some() {
        return Ok((text, None));
    }
    let default = parse_default(&text[eq + 1..], location)?;
    Ok((&text[..eq], Some(default)))
}

fn parse_default(text: &str, location: &SourceLocation) -> SchemaResult<DefaultValue> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SchemaError::structural(
            "missing default value after '='",
            location.clone(),
        ));
    }
    if let Some(expression) = unquote_expression(text) {
        return Ok(DefaultValue {
            value: expression.to_string(),
            is_expression: true,
        });
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        return Ok(DefaultValue {
            value: unquote(text).replace("\\\"", "\""),
            is_expression: false,
        });
    }
    Ok(DefaultValue {
        value: text.to_string(),
        is_expression: text.contains('('),
    })
}

fn leading_word(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(text.len());
    &text[..end]
}

/// `Type`, `Type?`, `Type(length)`, `Type(length)?`, `enum(A|B)`, `enum A=1|B=2`.
fn parse_type(field: &mut Field, text: &str, location: &SourceLocation) -> SchemaResult<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(missing_type(&field.name, location));
    }

    let Some(TypeSyntax {
        name: word,
        nullable,
        inner,
        rest,
    }) = parse_type_syntax(text)
    else {
        return Err(SchemaError::structural(
            format!("'{text}' is not a valid type for field '{}'", field.name),
            location.clone(),
        ));
    };

    if word.eq_ignore_ascii_case("enum") {
        let options = match (inner, rest.is_empty()) {
            (Some(_), false) => {
                return Err(SchemaError::structural(
                    format!("unexpected '{rest}' after enum options"),
                    location.clone(),
                ))
            }
            (Some(options), true) => parse_enum_options(options, location)?,
            (None, false) => parse_enum_options(rest, location)?,
            (None, true) => Vec::new(),
        };
        field.enum_options = options;
        field.length = None;
    } else {
        if !rest.is_empty() {
            return Err(SchemaError::structural(
                format!("unexpected '{rest}' after type '{word}'"),
                location.clone(),
            ));
        }
        field.length = inner.map(|len| parse_length(len, location)).transpose()?;
    }

    field.field_type = word.to_string();
    field.nullable |= nullable;
    Ok(())
}

fn parse_length(text: &str, location: &SourceLocation) -> SchemaResult<Length> {
    Length::parse(unquote(text)).ok_or_else(|| {
        SchemaError::structural_with_code(
            DiagnosticCode::InvalidLength,
            format!("'{}' is not a valid length", text.trim()),
            location.clone(),
        )
    })
}

/// `A|B|C`, `A=1|B=2`, or a comma-separated list when no `|` is present.
pub fn parse_enum_options(text: &str, location: &SourceLocation) -> SchemaResult<Vec<EnumValue>> {
    let separator = if find_top_level(text, '|').is_some() {
        '|'
    } else {
        ','
    };
    split_top_level(text, separator)
        .into_iter()
        .map(|option| parse_enum_value(option, location))
        .collect()
}

/// `Name(Label)? (= value)? @group(G)? ("description" | #description)`
pub fn parse_enum_value(text: &str, location: &SourceLocation) -> SchemaResult<EnumValue> {
    let (body, description) = split_description(text);
    check_balanced(body).map_err(|err| err.at_line(location))?;
    let (body, attributes, quoted) =
        split_semantic_attributes(body).map_err(|err| err.at_line(location))?;
    let (body, trailing) = if description.is_some() || quoted.is_some() {
        (body, None)
    } else {
        take_trailing_quoted(body)
    };

    let (head, value) = match find_top_level(body, '=') {
        Some(eq) => (&body[..eq], non_empty(unquote(&body[eq + 1..]))),
        None => (body, None),
    };
    let Some((name, label)) = split_name_label(head) else {
        return Err(SchemaError::structural(
            format!("'{}' is not a valid enum value", head.trim()),
            location.clone(),
        ));
    };

    let mut value_def = EnumValue::new(name);
    value_def.label = label;
    value_def.value = value;
    value_def.description = description.or(quoted).or(trailing);
    value_def.group = attributes
        .iter()
        .find(|attr| attr.is("group"))
        .and_then(|attr| attr.first_positional())
        .map(|group| unquote(group).to_string());
    Ok(value_def)
}
