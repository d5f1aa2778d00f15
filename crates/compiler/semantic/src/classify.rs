//! # Attribute Classification
//!
//! Turns raw `[Name(args)]` and `@name(args)` field tokens into typed field
//! state. Each recognized name maps to an [`AttributeHandler`] in an
//! [`AttributeRegistry`]; tokens nobody handles are kept verbatim in
//! `Field::unrecognized_attributes` for downstream generators.
//!
//! Classification runs after inheritance resolution so that inherited copies
//! in `full_fields` end up identical to their declarations.

use modelmark_compiler_diagnostics::{Diagnostic, DiagnosticCollection};
use modelmark_compiler_parser::syntax::{unquote, unquote_expression};
use modelmark_compiler_parser::{Attribute, Document, Field, FieldFlags};
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

/// Typed interpretation of one attribute name family.
pub trait AttributeHandler {
    /// Attribute names this handler answers to, compared case-insensitively.
    fn names(&self) -> &'static [&'static str];

    /// Apply the attribute to the field. An `Err` carries the reason the
    /// arguments were rejected; the field must then be left unchanged.
    fn apply(&self, field: &mut Field, attribute: &Attribute) -> Result<(), String>;

    /// Get the name of this handler (for debugging/logging)
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Registry mapping attribute names to their handlers
#[derive(Default)]
pub struct AttributeRegistry {
    handlers: Vec<Box<dyn AttributeHandler>>,
    by_name: FxHashMap<String, usize>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler; a later handler takes over names an earlier one registered.
    pub fn add_handler<H: AttributeHandler + 'static>(mut self, handler: H) -> Self {
        let index = self.handlers.len();
        for name in handler.names() {
            self.by_name.insert(name.to_ascii_lowercase(), index);
        }
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn handler_for(&self, name: &str) -> Option<&dyn AttributeHandler> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|index| self.handlers[*index].as_ref())
    }

    /// Classify every attribute of one field, returning a warning per token
    /// whose arguments were rejected.
    pub fn classify_field(&self, field: &mut Field) -> Vec<Diagnostic> {
        let attributes: Vec<Attribute> = field
            .framework_attributes
            .iter()
            .chain(&field.semantic_attributes)
            .cloned()
            .collect();

        let mut diagnostics = Vec::new();
        let mut unrecognized = Vec::new();
        for attribute in attributes {
            let Some(handler) = self.handler_for(&attribute.name) else {
                unrecognized.push(attribute);
                continue;
            };
            if let Err(reason) = handler.apply(field, &attribute) {
                diagnostics.push(Diagnostic::invalid_attribute_arguments(
                    &attribute.raw,
                    &reason,
                    field.location.clone(),
                ));
                unrecognized.push(attribute);
            } else {
                trace!("{}: applied {} to '{}'", handler.name(), attribute.raw, field.name);
            }
        }
        field.unrecognized_attributes = unrecognized;
        diagnostics
    }

    /// Classify own fields, reporting problems, then the merged copies silently.
    pub fn classify_document(&self, document: &mut Document, diagnostics: &mut DiagnosticCollection) {
        let mut classified = 0usize;
        for model in document.model_defs_mut() {
            for field in &mut model.fields {
                for diagnostic in self.classify_field(field) {
                    warn!("{diagnostic}");
                    diagnostics.add(diagnostic);
                }
                classified += 1;
            }
            for field in &mut model.full_fields {
                self.classify_field(field);
            }
        }
        debug!("classified attributes of {classified} fields");
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Create the registry holding every built-in handler
pub fn create_default_attribute_registry() -> AttributeRegistry {
    AttributeRegistry::new()
        .add_handler(PrimaryKeyHandler)
        .add_handler(ForeignKeyHandler)
        .add_handler(FlagHandler::UNIQUE)
        .add_handler(FlagHandler::INDEXED)
        .add_handler(MaxLengthHandler)
        .add_handler(ColumnTypeHandler)
        .add_handler(RequiredHandler)
        .add_handler(ExpressionHandler::INSERT)
        .add_handler(ExpressionHandler::UPDATE)
        .add_handler(FlagHandler::EXCLUDED)
        .add_handler(FlagHandler::JSON_IGNORE)
}

/// `[PK]`: primary keys are never nullable.
pub struct PrimaryKeyHandler;

impl AttributeHandler for PrimaryKeyHandler {
    fn names(&self) -> &'static [&'static str] {
        &["PK", "Key", "PrimaryKey", "primary"]
    }

    fn apply(&self, field: &mut Field, _attribute: &Attribute) -> Result<(), String> {
        field.flags |= FieldFlags::PRIMARY_KEY;
        field.nullable = false;
        Ok(())
    }
}

/// `[FK]` / `[FK(Target)]`: an explicit target overrides the inferred one.
pub struct ForeignKeyHandler;

impl AttributeHandler for ForeignKeyHandler {
    fn names(&self) -> &'static [&'static str] {
        modelmark_compiler_parser::FOREIGN_KEY_ATTRIBUTES
    }

    fn apply(&self, field: &mut Field, attribute: &Attribute) -> Result<(), String> {
        let target = attribute
            .first_positional()
            .or_else(|| attribute.named_arg("target"))
            .map(unquote);
        if let Some(target) = target {
            if target.is_empty() {
                return Err("empty foreign key target".to_string());
            }
            field.reference_target = Some(target.to_string());
        }
        field.flags |= FieldFlags::FOREIGN_KEY;
        Ok(())
    }
}

/// Handlers that only set a flag and take no arguments.
pub struct FlagHandler {
    names: &'static [&'static str],
    flag: FieldFlags,
}

impl FlagHandler {
    pub const UNIQUE: Self = Self {
        names: &["UQ", "Unique"],
        flag: FieldFlags::UNIQUE,
    };
    pub const INDEXED: Self = Self {
        names: &["UI", "IDX", "Index"],
        flag: FieldFlags::INDEXED,
    };
    pub const EXCLUDED: Self = Self {
        names: &["NotMapped", "Ignore", "Exclude"],
        flag: FieldFlags::EXCLUDED,
    };
    pub const JSON_IGNORE: Self = Self {
        names: &["JsonIgnore"],
        flag: FieldFlags::JSON_IGNORE,
    };
}

impl AttributeHandler for FlagHandler {
    fn names(&self) -> &'static [&'static str] {
        self.names
    }

    fn apply(&self, field: &mut Field, _attribute: &Attribute) -> Result<(), String> {
        field.flags |= self.flag;
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.names[0]
    }
}

pub struct MaxLengthHandler;

impl AttributeHandler for MaxLengthHandler {
    fn names(&self) -> &'static [&'static str] {
        &["MaxLength", "StringLength"]
    }

    fn apply(&self, field: &mut Field, attribute: &Attribute) -> Result<(), String> {
        let Some(arg) = attribute.first_positional() else {
            return Err("expected a length".to_string());
        };
        match unquote(arg).parse::<u32>() {
            Ok(length) if length > 0 => {
                field.max_length = Some(length);
                Ok(())
            }
            _ => Err(format!("'{arg}' is not a positive length")),
        }
    }
}

/// `[Column(TypeName = "decimal(18,2)")]` or `[ColumnType("money")]`.
pub struct ColumnTypeHandler;

impl AttributeHandler for ColumnTypeHandler {
    fn names(&self) -> &'static [&'static str] {
        &["Column", "ColumnType"]
    }

    fn apply(&self, field: &mut Field, attribute: &Attribute) -> Result<(), String> {
        let column_type = attribute
            .named_arg("TypeName")
            .or_else(|| attribute.first_positional().map(unquote))
            .filter(|column_type| !column_type.is_empty());
        match column_type {
            Some(column_type) => {
                field.column_type = Some(column_type.to_string());
                Ok(())
            }
            None => Err("expected a column type".to_string()),
        }
    }
}

pub struct RequiredHandler;

impl AttributeHandler for RequiredHandler {
    fn names(&self) -> &'static [&'static str] {
        &["Required"]
    }

    fn apply(&self, field: &mut Field, _attribute: &Attribute) -> Result<(), String> {
        field.flags |= FieldFlags::REQUIRED;
        field.nullable = false;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Insert,
    Update,
}

/// `[Insert("CURRENT_TIMESTAMP")]` / `[Update(...)]`: values the store computes.
pub struct ExpressionHandler {
    trigger: Trigger,
}

impl ExpressionHandler {
    pub const INSERT: Self = Self {
        trigger: Trigger::Insert,
    };
    pub const UPDATE: Self = Self {
        trigger: Trigger::Update,
    };
}

impl AttributeHandler for ExpressionHandler {
    fn names(&self) -> &'static [&'static str] {
        match self.trigger {
            Trigger::Insert => &["Insert", "InsertDefault", "OnInsert"],
            Trigger::Update => &["Update", "UpdateDefault", "OnUpdate"],
        }
    }

    fn apply(&self, field: &mut Field, attribute: &Attribute) -> Result<(), String> {
        let Some(expression) = attribute
            .first_positional()
            .map(|arg| unquote_expression(arg).unwrap_or_else(|| unquote(arg)))
            .filter(|expression| !expression.is_empty())
        else {
            return Err("expected an expression".to_string());
        };
        let slot = match self.trigger {
            Trigger::Insert => &mut field.insert_expression,
            Trigger::Update => &mut field.update_expression,
        };
        *slot = Some(expression.to_string());
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.trigger {
            Trigger::Insert => "InsertExpression",
            Trigger::Update => "UpdateExpression",
        }
    }
}
