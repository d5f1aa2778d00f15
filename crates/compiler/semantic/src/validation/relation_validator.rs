//! Relation targets must name a model or interface of the document.

use modelmark_compiler_diagnostics::Diagnostic;
use modelmark_compiler_parser::{Document, Entity};

use super::Validator;

pub struct RelationTargetValidator;

impl Validator for RelationTargetValidator {
    fn validate(&self, document: &Document) -> Vec<Diagnostic> {
        document
            .model_defs()
            .flat_map(|model| {
                model
                    .relations
                    .iter()
                    .filter(|relation| !matches!(document.lookup(&relation.target), Some(Entity::Model(_))))
                    .map(|relation| {
                        Diagnostic::unknown_relation_target(
                            &model.name,
                            &relation.target,
                            relation.location.clone(),
                        )
                    })
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "RelationTargetValidator"
    }
}
