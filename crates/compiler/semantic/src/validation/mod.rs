//! # Post-resolution Validation
//!
//! Cross-reference checks that run once inheritance is resolved and field
//! attributes are classified. Every finding is a warning: the document stays
//! usable, but a generator would emit a dangling reference.

pub mod foreign_key_validator;
pub mod index_validator;
pub mod relation_validator;
pub mod validator;

pub use foreign_key_validator::ForeignKeyTargetValidator;
pub use index_validator::IndexFieldValidator;
pub use relation_validator::RelationTargetValidator;
pub use validator::{create_default_registry, Validator, ValidatorRegistry};
