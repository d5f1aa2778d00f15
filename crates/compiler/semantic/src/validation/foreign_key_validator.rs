//! Explicit foreign-key targets must name a model.
//!
//! Inferred foreign keys always point at a model, so only own fields carrying
//! an explicit target can fail here. Inherited copies are not checked twice.

use modelmark_compiler_diagnostics::Diagnostic;
use modelmark_compiler_parser::{Document, ModelKind};

use super::Validator;

pub struct ForeignKeyTargetValidator;

impl Validator for ForeignKeyTargetValidator {
    fn validate(&self, document: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for model in document.model_defs() {
            for field in model.fields.iter().filter(|f| f.is_foreign_key()) {
                let Some(target) = &field.reference_target else {
                    continue;
                };
                let is_model = document
                    .lookup(target)
                    .and_then(|entity| entity.as_model())
                    .is_some_and(|target| target.kind == ModelKind::Model);
                if !is_model {
                    diagnostics.push(Diagnostic::unknown_foreign_key_target(
                        &format!("{}.{}", model.name, field.name),
                        target,
                        field.location.clone(),
                    ));
                }
            }
        }
        diagnostics
    }

    fn name(&self) -> &'static str {
        "ForeignKeyTargetValidator"
    }
}
