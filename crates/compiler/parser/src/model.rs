//! # Schema Document Model
//!
//! The canonical, dialect-independent representation of a parsed schema source.
//! Both grammar front-ends produce these types; the semantic passes fill in the
//! resolved parts (`full_fields`, `resolved_parents`, classified field flags).
//! Once compilation finishes the document is only ever read.

use std::fmt;

use bitflags::bitflags;
use indexmap::IndexMap;
use modelmark_compiler_diagnostics::SourceLocation;

/// Framework and semantic attribute names that mark a field as an explicit
/// foreign key. Name-based foreign-key inference is skipped for such fields.
pub const FOREIGN_KEY_ATTRIBUTES: &[&str] = &["fk", "foreignkey", "reference", "ref"];

/// The surface grammar a document was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `## Name` blocks, `::interface` / `::enum` kind markers.
    Current,
    /// `# Name` blocks, `IName` interfaces, inline enums only.
    Legacy,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => write!(f, "current"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Model,
    Interface,
    Enum,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Interface => write!(f, "interface"),
            Self::Enum => write!(f, "enum"),
        }
    }
}

/// Distinguishes persistence-bearing models from field-set contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Model,
    Interface,
}

impl From<ModelKind> for EntityKind {
    fn from(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Model => Self::Model,
            ModelKind::Interface => Self::Interface,
        }
    }
}

/// An `@name(args)` or `[Name(args)]` token as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub args: Vec<String>,
    /// The token text exactly as it appeared, without the sigil or brackets.
    pub raw: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, args: Vec<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args,
            raw: raw.into(),
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Arguments that are not written as `key: value` or `key = value`.
    pub fn positional_args(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .map(String::as_str)
            .filter(|arg| split_named_arg(arg).is_none())
    }

    pub fn first_positional(&self) -> Option<&str> {
        self.positional_args().next()
    }

    /// Value of a `key: value` / `key = value` argument, unquoted.
    /// Keys compare case-insensitively and ignore `_`.
    pub fn named_arg(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| {
            let (name, value) = split_named_arg(arg)?;
            keys_match(name, key).then(|| crate::syntax::unquote(value))
        })
    }
}

/// Split `key: value` or `key = value` when the key is a plain identifier.
pub(crate) fn split_named_arg(arg: &str) -> Option<(&str, &str)> {
    let idx = arg.find([':', '='])?;
    let key = arg[..idx].trim();
    if !crate::syntax::is_identifier(key) {
        return None;
    }
    let value = arg[idx + 1..].trim();
    if value.starts_with('=') {
        // `a == b` is an expression, not a named argument
        return None;
    }
    Some((key, value))
}

pub(crate) fn keys_match(a: &str, b: &str) -> bool {
    let normalize = |s: &str| {
        s.chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    normalize(a) == normalize(b)
}

/// Declared size of a field: `string(50)`, `decimal(18,2)`, `text(max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Unbounded storage.
    Max,
    Fixed(u32),
    Precision { precision: u32, scale: u32 },
}

impl Length {
    /// Parse the text between the parentheses of a type.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("max") {
            return Some(Self::Max);
        }
        match text.split_once(',') {
            Some((precision, scale)) => Some(Self::Precision {
                precision: precision.trim().parse().ok()?,
                scale: scale.trim().parse().ok()?,
            }),
            None => text.parse().ok().map(Self::Fixed),
        }
    }

    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Max)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Fixed(size) => write!(f, "{size}"),
            Self::Precision { precision, scale } => write!(f, "{precision},{scale}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefaultValue {
    pub value: String,
    /// Backtick-quoted or call-shaped defaults are evaluated by the target, not stored literally.
    pub is_expression: bool,
}

/// One value of an enum block, or one option of an inline `enum(...)` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub name: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
    pub group: Option<String>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            value: None,
            description: None,
            group: None,
        }
    }
}

bitflags! {
    /// Classified properties of a field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u16 {
        const PRIMARY_KEY = 1 << 0;
        const FOREIGN_KEY = 1 << 1;
        const UNIQUE = 1 << 2;
        const INDEXED = 1 << 3;
        const REQUIRED = 1 << 4;
        /// Excluded from code generation entirely.
        const EXCLUDED = 1 << 5;
        /// Excluded from serialized payloads.
        const JSON_IGNORE = 1 << 6;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub label: Option<String>,
    /// Type tag as written: `string`, `integer`, `guid`, `enum`, or an entity name.
    pub field_type: String,
    pub length: Option<Length>,
    pub nullable: bool,
    pub default_value: Option<DefaultValue>,
    /// Options of an inline `enum(...)` type, in declaration order.
    pub enum_options: Vec<EnumValue>,
    pub flags: FieldFlags,
    pub reference_target: Option<String>,
    pub max_length: Option<u32>,
    pub column_type: Option<String>,
    pub insert_expression: Option<String>,
    pub update_expression: Option<String>,
    pub semantic_attributes: Vec<Attribute>,
    pub framework_attributes: Vec<Attribute>,
    /// Attribute tokens no classifier handler recognized, kept for generators.
    pub unrecognized_attributes: Vec<Attribute>,
    pub description: Option<String>,
    pub metadata: IndexMap<String, String>,
    /// Name of the entity that declared this field.
    pub declared_in: String,
    pub location: SourceLocation,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            field_type: field_type.into(),
            length: None,
            nullable: false,
            default_value: None,
            enum_options: Vec::new(),
            flags: FieldFlags::empty(),
            reference_target: None,
            max_length: None,
            column_type: None,
            insert_expression: None,
            update_expression: None,
            semantic_attributes: Vec::new(),
            framework_attributes: Vec::new(),
            unrecognized_attributes: Vec::new(),
            description: None,
            metadata: IndexMap::new(),
            declared_in: String::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub const fn is_primary_key(&self) -> bool {
        self.flags.contains(FieldFlags::PRIMARY_KEY)
    }

    pub const fn is_foreign_key(&self) -> bool {
        self.flags.contains(FieldFlags::FOREIGN_KEY)
    }

    pub const fn is_unique(&self) -> bool {
        self.flags.contains(FieldFlags::UNIQUE)
    }

    pub const fn is_indexed(&self) -> bool {
        self.flags.contains(FieldFlags::INDEXED)
    }

    pub const fn is_required(&self) -> bool {
        self.flags.contains(FieldFlags::REQUIRED)
    }

    pub const fn is_excluded(&self) -> bool {
        self.flags.contains(FieldFlags::EXCLUDED)
    }

    pub const fn is_json_ignored(&self) -> bool {
        self.flags.contains(FieldFlags::JSON_IGNORE)
    }

    pub fn is_enum(&self) -> bool {
        self.field_type.eq_ignore_ascii_case("enum")
    }

    /// Whether any framework or semantic attribute carries this name.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.framework_attributes
            .iter()
            .chain(&self.semantic_attributes)
            .any(|attr| attr.is(name))
    }

    /// Whether the field names its foreign-key target explicitly.
    pub fn has_explicit_foreign_key(&self) -> bool {
        FOREIGN_KEY_ATTRIBUTES
            .iter()
            .any(|name| self.has_attribute(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    ToOne,
    ToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToOne => write!(f, "to-one"),
            Self::ToMany => write!(f, "to-many"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    /// Accepts `Cascade`, `set_null`, `SetNull`, `set null`, `no-action`, ...
    pub fn parse(text: &str) -> Option<Self> {
        let normalized: String = crate::syntax::unquote(text.trim())
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "cascade" => Some(Self::Cascade),
            "restrict" => Some(Self::Restrict),
            "setnull" => Some(Self::SetNull),
            "setdefault" => Some(Self::SetDefault),
            "noaction" | "none" => Some(Self::NoAction),
            _ => None,
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => write!(f, "CASCADE"),
            Self::Restrict => write!(f, "RESTRICT"),
            Self::SetNull => write!(f, "SET NULL"),
            Self::SetDefault => write!(f, "SET DEFAULT"),
            Self::NoAction => write!(f, "NO ACTION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,
    pub from_field: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub description: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub fields: Vec<String>,
    pub is_unique: bool,
    pub description: Option<String>,
    pub location: SourceLocation,
}

/// A model or interface block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub kind: ModelKind,
    pub is_abstract: bool,
    /// Marked `@default`: implicit parent of every model without a model parent.
    pub is_default: bool,
    /// Parent names as declared in the header.
    pub inherits: Vec<String>,
    /// Effective parents after cycle repair and default fallback.
    pub resolved_parents: Vec<String>,
    /// Own fields, in declaration order.
    pub fields: Vec<Field>,
    /// Own and inherited fields after inheritance resolution.
    pub full_fields: Vec<Field>,
    pub relations: Vec<Relation>,
    pub indexes: Vec<Index>,
    pub attributes: Vec<Attribute>,
    pub metadata: IndexMap<String, String>,
    pub location: SourceLocation,
}

impl ModelDef {
    pub fn new(name: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            kind,
            is_abstract: false,
            is_default: false,
            inherits: Vec::new(),
            resolved_parents: Vec::new(),
            fields: Vec::new(),
            full_fields: Vec::new(),
            relations: Vec::new(),
            indexes: Vec::new(),
            attributes: Vec::new(),
            metadata: IndexMap::new(),
            location: SourceLocation::unknown(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ModelKind::Interface
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field in the merged field set.
    pub fn full_field(&self, name: &str) -> Option<&Field> {
        self.full_fields.iter().find(|f| f.name == name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Field> {
        self.full_fields.iter().filter(|f| f.is_primary_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
    pub attributes: Vec<Attribute>,
    pub location: SourceLocation,
}

impl EnumDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            values: Vec::new(),
            attributes: Vec::new(),
            location: SourceLocation::unknown(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Model(ModelDef),
    Enum(EnumDef),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Self::Model(model) => &model.name,
            Self::Enum(enum_def) => &enum_def.name,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Model(model) => model.kind.into(),
            Self::Enum(_) => EntityKind::Enum,
        }
    }

    pub const fn location(&self) -> &SourceLocation {
        match self {
            Self::Model(model) => &model.location,
            Self::Enum(enum_def) => &enum_def.location,
        }
    }

    pub const fn as_model(&self) -> Option<&ModelDef> {
        match self {
            Self::Model(model) => Some(model),
            Self::Enum(_) => None,
        }
    }

    pub fn as_model_mut(&mut self) -> Option<&mut ModelDef> {
        match self {
            Self::Model(model) => Some(model),
            Self::Enum(_) => None,
        }
    }

    pub const fn as_enum(&self) -> Option<&EnumDef> {
        match self {
            Self::Enum(enum_def) => Some(enum_def),
            Self::Model(_) => None,
        }
    }
}

/// All entities parsed from one source file, indexed by name in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub dialect: Dialect,
    /// Title line of a current-dialect document (`# Namespace: shop`).
    pub namespace: Option<String>,
    entities: IndexMap<String, Entity>,
}

impl Document {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            namespace: None,
            entities: IndexMap::new(),
        }
    }

    /// Insert an entity, returning the previous entity of the same name.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.name().to_string(), entity)
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.get_mut(name)
    }

    /// Exact lookup first, then case-insensitive.
    pub fn lookup(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name).or_else(|| {
            self.entities
                .values()
                .find(|entity| entity.name().eq_ignore_ascii_case(name))
        })
    }

    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.get(name).and_then(Entity::as_model)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut ModelDef> {
        self.get_mut(name).and_then(Entity::as_model_mut)
    }

    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.get(name).and_then(Entity::as_enum)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Models and interfaces, in declaration order.
    pub fn model_defs(&self) -> impl Iterator<Item = &ModelDef> {
        self.entities.values().filter_map(Entity::as_model)
    }

    pub fn model_defs_mut(&mut self) -> impl Iterator<Item = &mut ModelDef> {
        self.entities.values_mut().filter_map(Entity::as_model_mut)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.model_defs().filter(|m| m.kind == ModelKind::Model)
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &ModelDef> {
        self.model_defs().filter(|m| m.kind == ModelKind::Interface)
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.entities.values().filter_map(Entity::as_enum)
    }

    /// The first model or interface marked `@default`.
    pub fn default_entity(&self) -> Option<&ModelDef> {
        self.model_defs().find(|m| m.is_default)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
