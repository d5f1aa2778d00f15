//! The two surface grammars and how a source picks one.
//!
//! Both grammars feed the same document model. They differ only in which
//! headings open blocks, how an entity's kind is written, which field-name
//! suffixes suggest a foreign key, and how indexes are auto-named.

use crate::model::{Dialect, EntityKind};
use crate::scanner::{Line, LineScanner};

/// `::interface` / `::enum` written in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindMarker {
    Interface,
    Enum,
}

impl KindMarker {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "interface" => Some(Self::Interface),
            "enum" => Some(Self::Enum),
            _ => None,
        }
    }
}

pub trait Grammar: Sync {
    fn dialect(&self) -> Dialect;

    /// Whether the line opens an entity block.
    fn is_block_start(&self, line: &Line<'_>) -> bool;

    /// Whether the line is the document title.
    fn is_title(&self, _line: &Line<'_>) -> bool {
        false
    }

    /// Decide an entity's kind from its name and optional header marker.
    fn entity_kind(&self, name: &str, marker: Option<KindMarker>) -> Result<EntityKind, String>;

    /// For a field named like a foreign key, the entity-name prefix.
    fn foreign_key_prefix<'a>(&self, field_name: &'a str) -> Option<&'a str>;

    fn index_name(&self, fields: &[String]) -> String;

    fn unique_name(&self, fields: &[String]) -> String {
        format!("UK_{}", fields.join("_"))
    }

    /// Whether interfaces may declare relations and indexes.
    fn interfaces_carry_constraints(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyGrammar;

const CURRENT_FK_SUFFIXES: &[&str] = &["_id", "_key"];
const LEGACY_FK_SUFFIXES: &[&str] = &["_id", "_key", "Id", "Key"];

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (prefix, tail) = name.split_at(split);
    (tail.eq_ignore_ascii_case(suffix) && !prefix.is_empty()).then_some(prefix)
}

impl Grammar for CurrentGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Current
    }

    fn is_block_start(&self, line: &Line<'_>) -> bool {
        line.heading_level() == Some(2)
    }

    fn is_title(&self, line: &Line<'_>) -> bool {
        line.heading_level() == Some(1)
    }

    fn entity_kind(&self, _name: &str, marker: Option<KindMarker>) -> Result<EntityKind, String> {
        Ok(match marker {
            Some(KindMarker::Interface) => EntityKind::Interface,
            Some(KindMarker::Enum) => EntityKind::Enum,
            None => EntityKind::Model,
        })
    }

    fn foreign_key_prefix<'a>(&self, field_name: &'a str) -> Option<&'a str> {
        CURRENT_FK_SUFFIXES
            .iter()
            .find_map(|suffix| strip_suffix_ignore_case(field_name, suffix))
    }

    fn index_name(&self, fields: &[String]) -> String {
        fields.join("_")
    }

    fn interfaces_carry_constraints(&self) -> bool {
        true
    }
}

impl Grammar for LegacyGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    fn is_block_start(&self, line: &Line<'_>) -> bool {
        matches!(line.heading_level(), Some(1 | 2))
    }

    fn entity_kind(&self, name: &str, marker: Option<KindMarker>) -> Result<EntityKind, String> {
        if marker.is_some() {
            return Err(format!(
                "kind markers are not supported in the legacy dialect (header '{name}')"
            ));
        }
        let mut chars = name.chars();
        let interface_prefix = chars.next() == Some('I')
            && chars.next().is_some_and(|c| c.is_ascii_uppercase());
        Ok(if interface_prefix {
            EntityKind::Interface
        } else {
            EntityKind::Model
        })
    }

    fn foreign_key_prefix<'a>(&self, field_name: &'a str) -> Option<&'a str> {
        LEGACY_FK_SUFFIXES.iter().find_map(|suffix| {
            if suffix.starts_with('_') {
                strip_suffix_ignore_case(field_name, suffix)
            } else {
                field_name
                    .strip_suffix(suffix)
                    .filter(|prefix| !prefix.is_empty())
            }
        })
    }

    fn index_name(&self, fields: &[String]) -> String {
        format!("IX_{}", fields.join("_"))
    }

    fn interfaces_carry_constraints(&self) -> bool {
        false
    }
}

pub fn grammar_for(dialect: Dialect) -> &'static dyn Grammar {
    match dialect {
        Dialect::Current => &CurrentGrammar,
        Dialect::Legacy => &LegacyGrammar,
    }
}

/// Pick the dialect of an already scanned source.
///
/// Any `##` heading or header kind marker means current; otherwise a `#`
/// heading means legacy. Sources with no headings at all are current.
pub fn detect_dialect(scanner: &LineScanner<'_>) -> Dialect {
    let mut saw_top_heading = false;
    for line in scanner.lines() {
        match line.heading_level() {
            Some(2) => return Dialect::Current,
            Some(1) => {
                if has_kind_marker(line.content) {
                    return Dialect::Current;
                }
                saw_top_heading = true;
            }
            _ => {}
        }
    }
    if saw_top_heading {
        Dialect::Legacy
    } else {
        Dialect::Current
    }
}

fn has_kind_marker(header: &str) -> bool {
    header.contains("::interface") || header.contains("::enum")
}
