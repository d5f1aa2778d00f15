//! Index fields must exist among the entity's merged fields.

use modelmark_compiler_diagnostics::Diagnostic;
use modelmark_compiler_parser::Document;

use super::Validator;

pub struct IndexFieldValidator;

impl Validator for IndexFieldValidator {
    fn validate(&self, document: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for model in document.model_defs() {
            for index in &model.indexes {
                for field in &index.fields {
                    if model.full_field(field).is_none() {
                        diagnostics.push(Diagnostic::unknown_index_field(
                            &model.name,
                            &index.name,
                            field,
                            index.location.clone(),
                        ));
                    }
                }
            }
        }
        diagnostics
    }

    fn name(&self) -> &'static str {
        "IndexFieldValidator"
    }
}
