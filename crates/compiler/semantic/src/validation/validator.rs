//! # Validator Trait and Registry
//!
//! This module defines the trait for document validators and provides
//! a registry system for organizing multiple validators.

use modelmark_compiler_diagnostics::{Diagnostic, DiagnosticCollection};
use modelmark_compiler_parser::Document;
use tracing::{debug, warn};

/// Trait for document validators
pub trait Validator {
    /// Validate the resolved document and return diagnostics
    fn validate(&self, document: &Document) -> Vec<Diagnostic>;

    /// Get the name of this validator (for debugging/logging)
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Registry for managing multiple validators
#[derive(Default)]
pub struct ValidatorRegistry {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator to the registry
    pub fn add_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Run all validators and collect diagnostics
    pub fn validate_all(&self, document: &Document) -> DiagnosticCollection {
        let mut collection = DiagnosticCollection::new();

        for validator in &self.validators {
            let diagnostics = validator.validate(document);
            debug!("{} reported {} diagnostics", validator.name(), diagnostics.len());
            for diagnostic in &diagnostics {
                warn!("{diagnostic}");
            }
            collection.extend(diagnostics);
        }

        collection
    }

    /// Get the number of registered validators
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

/// Create a default validator registry with every reference check
pub fn create_default_registry() -> ValidatorRegistry {
    ValidatorRegistry::new()
        .add_validator(super::RelationTargetValidator)
        .add_validator(super::IndexFieldValidator)
        .add_validator(super::ForeignKeyTargetValidator)
}
