//! # Schema Markup Parser
//!
//! Turns schema markup source into an unresolved [`Document`]. Two surface
//! dialects are understood and converge on the same model:
//!
//! ```text
//! ## Customer(Client) : BaseEntity @unique(Email)     # current dialect
//! - Email: string(200) [Required]
//! - Status: enum(Active|Inactive) = Active
//!
//! # Customer : BaseEntity                             # legacy dialect
//! - RegionId: guid
//! ```
//!
//! Inheritance is not resolved here; see the semantic crate.

pub mod assembler;
pub mod attributes;
pub mod dialect;
pub mod field;
pub mod grammar;
pub mod header;
pub mod model;
pub mod relation;
pub mod scanner;
pub mod syntax;

pub use assembler::{parse_document, DialectSelection, ParseOptions, ParsedDocument};
pub use dialect::{detect_dialect, grammar_for, CurrentGrammar, Grammar, LegacyGrammar};
pub use model::{
    Attribute, DefaultValue, Dialect, Document, Entity, EntityKind, EnumDef, EnumValue, Field,
    FieldFlags, Index, Length, ModelDef, ModelKind, ReferentialAction, Relation, RelationKind,
    FOREIGN_KEY_ATTRIBUTES,
};
pub use scanner::{Line, LineKind, LineScanner};
pub use syntax::SyntaxError;
