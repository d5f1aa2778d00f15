//! # Document Assembler
//!
//! Drives the line grammars over a whole source and produces an unresolved
//! [`Document`]. Assembly runs in passes over one per-document [`ParseContext`]:
//!
//! 1. every block header is parsed and its name recorded, so that
//! 2. block bodies can be assembled with the full name table available, and
//! 3. foreign keys can be inferred from field names regardless of declaration order.
//!
//! A structural error in any pass abandons the document.

use indexmap::IndexMap;
use modelmark_compiler_diagnostics::{
    Diagnostic, DiagnosticCollection, SchemaError, SchemaResult, SourceLocation,
};
use tracing::{debug, trace, warn};

use crate::attributes::parse_semantic_attributes;
use crate::dialect::{detect_dialect, grammar_for, Grammar};
use crate::field::{apply_field_property, ensure_typed, parse_enum_value, parse_field};
use crate::header::{parse_header, Header};
use crate::model::{
    keys_match, Attribute, Dialect, Document, Entity, EntityKind, EnumDef, EnumValue, FieldFlags,
    Index, ModelDef, ModelKind, Relation,
};
use crate::relation::{
    apply_index_property, apply_relation_property, parse_directive, parse_index_line,
    parse_relation_line, Directive,
};
use crate::scanner::{Line, LineKind, LineScanner};
use crate::syntax::{check_balanced, non_empty, split_description, split_key_value, unquote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialectSelection {
    #[default]
    Auto,
    Current,
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub dialect: DialectSelection,
    /// Mark `Owner_id`-style fields as foreign keys when `Owner` is a model.
    pub infer_foreign_keys: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            dialect: DialectSelection::Auto,
            infer_foreign_keys: true,
        }
    }
}

/// An assembled document and the warnings raised while assembling it.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub diagnostics: DiagnosticCollection,
}

pub fn parse_document(source: &str, options: &ParseOptions) -> SchemaResult<ParsedDocument> {
    let scanner = LineScanner::new(source);
    let dialect = match options.dialect {
        DialectSelection::Auto => detect_dialect(&scanner),
        DialectSelection::Current => Dialect::Current,
        DialectSelection::Legacy => Dialect::Legacy,
    };
    debug!("parsing {} lines as {dialect} dialect", scanner.lines().len());

    let mut context = ParseContext::new(scanner, grammar_for(dialect));
    context.collect_headers()?;
    context.assemble_blocks()?;
    if options.infer_foreign_keys {
        context.infer_foreign_keys();
    }
    Ok(context.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Fields,
    Relations,
    Indexes,
    Metadata,
    /// Unknown section; its lines are skipped.
    Skipped,
}

impl Section {
    fn from_heading(heading: &str) -> Option<Self> {
        match heading.trim().to_ascii_lowercase().as_str() {
            "fields" | "columns" | "properties" => Some(Self::Fields),
            "relations" | "relationships" => Some(Self::Relations),
            "indexes" | "indices" => Some(Self::Indexes),
            "metadata" | "meta" => Some(Self::Metadata),
            _ => None,
        }
    }
}

/// The constraint a directive line produced, refined by its nested lines.
#[derive(Debug, Clone, Copy)]
enum Constraint {
    Relation,
    Index,
}

#[derive(Debug, Clone)]
struct NameEntry {
    kind: EntityKind,
    location: SourceLocation,
}

/// Every entity name in the document, in declaration order.
#[derive(Debug, Default)]
struct NameTable {
    entries: IndexMap<String, NameEntry>,
}

impl NameTable {
    fn declare(&mut self, header: &Header, location: &SourceLocation) -> SchemaResult<()> {
        if let Some(existing) = self.entries.get(&header.name) {
            return Err(SchemaError::DuplicateEntity {
                name: header.name.clone(),
                location: location.clone(),
                first: existing.location.clone(),
            });
        }
        self.entries.insert(
            header.name.clone(),
            NameEntry {
                kind: header.kind,
                location: location.clone(),
            },
        );
        Ok(())
    }

    /// Canonical name of the model called `name`, ignoring case.
    fn model_named(&self, name: &str) -> Option<&str> {
        let is_model = |(_, entry): &(&String, &NameEntry)| entry.kind == EntityKind::Model;
        self.entries
            .get_key_value(name)
            .filter(is_model)
            .or_else(|| {
                self.entries
                    .iter()
                    .filter(is_model)
                    .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            })
            .map(|(canonical, _)| canonical.as_str())
    }
}

struct Block {
    header: Header,
    /// Index of the header line.
    start: usize,
    location: SourceLocation,
}

/// All mutable state of one parse.
struct ParseContext<'src> {
    scanner: LineScanner<'src>,
    grammar: &'static dyn Grammar,
    names: NameTable,
    blocks: Vec<Block>,
    document: Document,
    diagnostics: DiagnosticCollection,
}

impl<'src> ParseContext<'src> {
    fn new(scanner: LineScanner<'src>, grammar: &'static dyn Grammar) -> Self {
        Self {
            scanner,
            grammar,
            names: NameTable::default(),
            blocks: Vec::new(),
            document: Document::new(grammar.dialect()),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    fn collect_headers(&mut self) -> SchemaResult<()> {
        for (idx, line) in self.scanner.lines().iter().enumerate() {
            if self.grammar.is_title(line) {
                if self.blocks.is_empty() && self.document.namespace.is_none() {
                    self.document.namespace = Some(parse_title(line.content));
                }
                continue;
            }
            if !self.grammar.is_block_start(line) {
                continue;
            }
            let location = line.location();
            let header = parse_header(line.content, self.grammar, &location)?;
            self.names.declare(&header, &location)?;
            self.blocks.push(Block {
                header,
                start: idx,
                location,
            });
        }
        debug!("collected {} entity headers", self.blocks.len());
        Ok(())
    }

    fn assemble_blocks(&mut self) -> SchemaResult<()> {
        let blocks = std::mem::take(&mut self.blocks);
        let ends: Vec<usize> = blocks
            .iter()
            .skip(1)
            .map(|block| block.start)
            .chain(std::iter::once(self.scanner.lines().len()))
            .collect();

        for (block, end) in blocks.into_iter().zip(ends) {
            self.scanner.seek(block.start + 1);
            let entity = match block.header.kind {
                EntityKind::Enum => Entity::Enum(self.assemble_enum(block, end)?),
                EntityKind::Model | EntityKind::Interface => {
                    Entity::Model(self.assemble_model(block, end)?)
                }
            };
            self.document.insert(entity);
        }
        Ok(())
    }

    fn assemble_model(&mut self, block: Block, end: usize) -> SchemaResult<ModelDef> {
        let Block {
            header, location, ..
        } = block;
        let kind = match header.kind {
            EntityKind::Interface => ModelKind::Interface,
            _ => ModelKind::Model,
        };

        let mut model = ModelDef::new(header.name, kind);
        model.label = header.label;
        model.description = header.description;
        model.inherits = header.inherits;
        model.location = location.clone();
        model.is_abstract = header.attributes.iter().any(|attr| attr.is("abstract"));
        model.is_default = header.attributes.iter().any(|attr| attr.is("default"));
        for attribute in &header.attributes {
            self.apply_directive(&mut model, attribute, &location)?;
        }
        model.attributes = header.attributes;

        let mut section = Section::Fields;
        while self.scanner.position() < end {
            let Some(line) = self.scanner.advance() else {
                break;
            };
            match line.kind {
                LineKind::Ignorable => {}
                LineKind::Text => trace!("line {}: skipping prose", line.number),
                LineKind::Heading { .. } if line.is_section_header() => {
                    section = Section::from_heading(line.content).unwrap_or_else(|| {
                        let diagnostic = Diagnostic::unknown_section(line.content, line.location());
                        warn!("{diagnostic}");
                        self.diagnostics.add(diagnostic);
                        Section::Skipped
                    });
                }
                LineKind::Heading { .. } => {}
                LineKind::Quote { .. } => append_text(&mut model.description, line.content),
                LineKind::Item { depth } => {
                    if section == Section::Skipped {
                        self.take_nested(depth, end);
                        continue;
                    }
                    if depth > 1 {
                        return Err(orphan_line(&line));
                    }
                    self.assemble_model_item(&mut model, section, line, end)?;
                }
            }
        }

        debug!(
            "assembled {} '{}' with {} fields, {} relations, {} indexes",
            EntityKind::from(model.kind),
            model.name,
            model.fields.len(),
            model.relations.len(),
            model.indexes.len()
        );
        Ok(model)
    }

    fn assemble_model_item(
        &mut self,
        model: &mut ModelDef,
        section: Section,
        line: Line<'src>,
        end: usize,
    ) -> SchemaResult<()> {
        let location = line.location();
        let depth = line.depth().unwrap_or(1);

        if line.content.starts_with('@') && section != Section::Metadata {
            return self.assemble_directive_line(model, line, end);
        }

        match section {
            Section::Fields => {
                let mut field = parse_field(line.content, &location)?.field;
                field.declared_in = model.name.clone();
                for nested in self.take_nested(depth, end) {
                    match nested.kind {
                        LineKind::Quote { .. } => append_text(&mut field.description, nested.content),
                        _ => apply_field_property(&mut field, nested.content, &nested.location())?,
                    }
                }
                ensure_typed(&field)?;
                if model.field(&field.name).is_some() {
                    return Err(SchemaError::DuplicateField {
                        entity: model.name.clone(),
                        field: field.name,
                        location,
                    });
                }
                model.fields.push(field);
            }
            Section::Relations => {
                let Some(mut relation) = parse_relation_line(line.content, &location)? else {
                    return Err(SchemaError::structural(
                        format!("expected '>Target' or '<Target', found '{}'", line.content),
                        location,
                    ));
                };
                for nested in self.take_nested(depth, end) {
                    apply_relation_property(&mut relation, nested.content, &nested.location())?;
                }
                self.push_relation(model, relation)?;
            }
            Section::Indexes => {
                let mut index = parse_index_line(line.content, self.grammar, &location)?;
                for nested in self.take_nested(depth, end) {
                    apply_index_property(&mut index, nested.content, self.grammar, &nested.location())?;
                }
                self.push_index(model, index)?;
            }
            Section::Metadata => {
                let Some((key, value)) = split_key_value(line.content) else {
                    return Err(SchemaError::structural(
                        format!("expected 'key: value', found '{}'", line.content),
                        location,
                    ));
                };
                model
                    .metadata
                    .insert(key.to_string(), unquote(value).to_string());
                if let Some(nested) = self.take_nested(depth, end).first() {
                    return Err(orphan_line(nested));
                }
            }
            Section::Skipped => {}
        }
        Ok(())
    }

    /// `- @unique(...)`, `- @index(...)`, `- @relation(...)` bullet lines.
    fn assemble_directive_line(
        &mut self,
        model: &mut ModelDef,
        line: Line<'src>,
        end: usize,
    ) -> SchemaResult<()> {
        let location = line.location();
        let (body, description) = split_description(line.content);
        check_balanced(body).map_err(|err| err.at_line(&location))?;
        let attributes = parse_semantic_attributes(body).map_err(|err| err.at_line(&location))?;

        let mut last = None;
        for attribute in attributes {
            match self.apply_directive(model, &attribute, &location)? {
                Some(constraint) => last = Some(constraint),
                None => model.attributes.push(attribute),
            }
        }
        if let Some(description) = description {
            match last {
                Some(Constraint::Relation) => {
                    if let Some(relation) = model.relations.last_mut() {
                        relation.description = Some(description);
                    }
                }
                Some(Constraint::Index) => {
                    if let Some(index) = model.indexes.last_mut() {
                        index.description = Some(description);
                    }
                }
                None => {}
            }
        }

        for nested in self.take_nested(line.depth().unwrap_or(1), end) {
            let nested_location = nested.location();
            match last {
                Some(Constraint::Relation) => {
                    if let Some(relation) = model.relations.last_mut() {
                        apply_relation_property(relation, nested.content, &nested_location)?;
                    }
                }
                Some(Constraint::Index) => {
                    if let Some(index) = model.indexes.last_mut() {
                        apply_index_property(index, nested.content, self.grammar, &nested_location)?;
                    }
                }
                None => return Err(orphan_line(&nested)),
            }
        }
        Ok(())
    }

    /// Route an entity-level attribute into a relation or index. Returns which
    /// one it added, or `None` for any other attribute.
    fn apply_directive(
        &self,
        model: &mut ModelDef,
        attribute: &Attribute,
        location: &SourceLocation,
    ) -> SchemaResult<Option<Constraint>> {
        match parse_directive(attribute, self.grammar, location)? {
            Directive::Index(index) => {
                self.push_index(model, index)?;
                Ok(Some(Constraint::Index))
            }
            Directive::Relation(relation) => {
                self.push_relation(model, relation)?;
                Ok(Some(Constraint::Relation))
            }
            Directive::Other(_) => Ok(None),
        }
    }

    fn check_constraints_allowed(
        &self,
        model: &ModelDef,
        location: &SourceLocation,
    ) -> SchemaResult<()> {
        if model.is_interface() && !self.grammar.interfaces_carry_constraints() {
            return Err(SchemaError::structural(
                format!(
                    "interface '{}' cannot declare relations or indexes in the {} dialect",
                    model.name,
                    self.grammar.dialect()
                ),
                location.clone(),
            ));
        }
        Ok(())
    }

    fn push_relation(&self, model: &mut ModelDef, relation: Relation) -> SchemaResult<()> {
        self.check_constraints_allowed(model, &relation.location)?;
        model.relations.push(relation);
        Ok(())
    }

    fn push_index(&self, model: &mut ModelDef, index: Index) -> SchemaResult<()> {
        self.check_constraints_allowed(model, &index.location)?;
        model.indexes.push(index);
        Ok(())
    }

    fn assemble_enum(&mut self, block: Block, end: usize) -> SchemaResult<EnumDef> {
        let Block {
            header, location, ..
        } = block;
        if let Some(parent) = header.inherits.first() {
            return Err(SchemaError::InvalidInheritance {
                message: format!("enum '{}' cannot inherit from '{parent}'", header.name),
                location,
            });
        }

        let mut enum_def = EnumDef::new(header.name);
        enum_def.label = header.label;
        enum_def.description = header.description;
        enum_def.attributes = header.attributes;
        enum_def.location = location;

        let mut group: Option<String> = None;
        while self.scanner.position() < end {
            let Some(line) = self.scanner.advance() else {
                break;
            };
            match line.kind {
                LineKind::Ignorable | LineKind::Text => {}
                LineKind::Heading { .. } if line.is_section_header() => {
                    group = non_empty(line.content);
                }
                LineKind::Heading { .. } => {}
                LineKind::Quote { .. } => append_text(&mut enum_def.description, line.content),
                LineKind::Item { depth } => {
                    if depth > 1 {
                        return Err(orphan_line(&line));
                    }
                    let location = line.location();
                    if line.content.starts_with('@') {
                        check_balanced(line.content).map_err(|err| err.at_line(&location))?;
                        let attributes = parse_semantic_attributes(line.content)
                            .map_err(|err| err.at_line(&location))?;
                        enum_def.attributes.extend(attributes);
                        continue;
                    }

                    let mut value = parse_enum_value(line.content, &location)?;
                    if value.group.is_none() {
                        value.group.clone_from(&group);
                    }
                    for nested in self.take_nested(depth, end) {
                        apply_enum_value_property(&mut value, &nested)?;
                    }
                    if enum_def.values.iter().any(|v| v.name == value.name) {
                        return Err(SchemaError::DuplicateField {
                            entity: enum_def.name.clone(),
                            field: value.name,
                            location,
                        });
                    }
                    enum_def.values.push(value);
                }
            }
        }

        debug!(
            "assembled enum '{}' with {} values",
            enum_def.name,
            enum_def.values.len()
        );
        Ok(enum_def)
    }

    /// Consume the lines nested under an item opened at `parent_depth`.
    fn take_nested(&mut self, parent_depth: usize, end: usize) -> Vec<Line<'src>> {
        let mut nested = Vec::new();
        while self.scanner.position() < end {
            let Some(line) = self.scanner.current().copied() else {
                break;
            };
            if !line.is_ignorable() && !line.is_nested_under(parent_depth) {
                break;
            }
            if !line.is_ignorable() {
                nested.push(line);
            }
            self.scanner.advance();
        }
        nested
    }

    fn infer_foreign_keys(&mut self) {
        let grammar = self.grammar;
        let names = &self.names;
        for model in self.document.model_defs_mut() {
            for field in &mut model.fields {
                if field.name.starts_with('_') || field.has_explicit_foreign_key() {
                    continue;
                }
                let Some(prefix) = grammar.foreign_key_prefix(&field.name) else {
                    continue;
                };
                let Some(target) = names.model_named(prefix) else {
                    trace!("'{}.{}' names no model, not a foreign key", model.name, field.name);
                    continue;
                };
                debug!("inferred foreign key {}.{} -> {target}", model.name, field.name);
                field.flags |= FieldFlags::FOREIGN_KEY;
                field.reference_target = Some(target.to_string());
            }
        }
    }

    fn finish(self) -> ParsedDocument {
        ParsedDocument {
            document: self.document,
            diagnostics: self.diagnostics,
        }
    }
}

fn apply_enum_value_property(value: &mut EnumValue, line: &Line<'_>) -> SchemaResult<()> {
    if let LineKind::Quote { .. } = line.kind {
        append_text(&mut value.description, line.content);
        return Ok(());
    }
    let location = line.location();
    let Some((key, raw)) = split_key_value(line.content) else {
        return Err(orphan_line(line));
    };
    let text = non_empty(unquote(raw));
    if keys_match(key, "description") || keys_match(key, "desc") {
        value.description = text;
    } else if keys_match(key, "value") {
        value.value = text;
    } else if keys_match(key, "group") {
        value.group = text;
    } else if keys_match(key, "label") {
        value.label = text;
    } else {
        return Err(SchemaError::structural(
            format!("unknown enum value property '{key}'"),
            location,
        ));
    }
    Ok(())
}

/// `# Namespace: shop` or `# Shop`.
fn parse_title(content: &str) -> String {
    match split_key_value(content) {
        Some((key, value)) if keys_match(key, "namespace") => unquote(value).to_string(),
        _ => content.trim().to_string(),
    }
}

fn append_text(target: &mut Option<String>, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match target {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(text);
        }
        None => *target = Some(text.to_string()),
    }
}

fn orphan_line(line: &Line<'_>) -> SchemaError {
    SchemaError::structural(
        format!("nested line '{}' has no parent item", line.content),
        line.location(),
    )
}
