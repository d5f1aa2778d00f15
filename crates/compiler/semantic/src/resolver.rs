//! # Inheritance Resolution
//!
//! Computes `resolved_parents` and `full_fields` for every model and interface:
//!
//! 1. build the [`InheritanceGraph`] (fatal on dangling names, illegal edges,
//!    and a second `@default` entity),
//! 2. break cycles, reporting each removed edge as a warning,
//! 3. attach the default entity to parentless models,
//! 4. merge fields parents-first in topological order.
//!
//! Inherited fields are cloned into each descendant; the first occurrence of a
//! name wins and an own field replaces the inherited one in place. Running the
//! resolver again on its own output changes nothing.

use index_vec::IndexVec;
use modelmark_compiler_diagnostics::{Diagnostic, DiagnosticCollection, SchemaResult};
use modelmark_compiler_parser::{Document, Field};
use tracing::{debug, warn};

use crate::graph::{EntityId, InheritanceGraph};

pub fn resolve_inheritance(
    document: &mut Document,
    diagnostics: &mut DiagnosticCollection,
) -> SchemaResult<InheritanceGraph> {
    let mut graph = InheritanceGraph::build(document)?;

    for repair in graph.break_cycles() {
        let child = graph.name(repair.child).to_string();
        let removed = graph.name(repair.removed_parent).to_string();
        let mut diagnostic =
            Diagnostic::cycle_detected(&child, &removed, graph.location(repair.child).clone());
        if repair.reattached {
            if let Some(default) = graph.default_entity() {
                diagnostic = diagnostic.with_related(
                    graph.location(default).clone(),
                    format!("'{child}' now inherits from the default entity '{}'", graph.name(default)),
                );
            }
        }
        warn!("{diagnostic}");
        diagnostics.add(diagnostic);

        if let Some(model) = document.model_mut(&child) {
            model
                .inherits
                .retain(|parent| !parent.eq_ignore_ascii_case(&removed));
        }
    }

    let attached = graph.apply_default_fallback();
    debug!("default entity attached to {} models", attached.len());

    for id in graph.ids() {
        let parents = graph.parent_names(id);
        if let Some(model) = document.model_mut(graph.name(id)) {
            model.resolved_parents = parents;
        }
    }

    let merged = merge_fields(document, &graph);
    for (id, full_fields) in merged.into_iter_enumerated() {
        if let Some(model) = document.model_mut(graph.name(id)) {
            model.full_fields = full_fields;
        }
    }

    debug!("resolved inheritance for {} entities", graph.len());
    Ok(graph)
}

/// Merged field lists indexed like the graph, each computed once from the
/// already merged lists of its parents.
fn merge_fields(document: &Document, graph: &InheritanceGraph) -> IndexVec<EntityId, Vec<Field>> {
    let mut merged: IndexVec<EntityId, Vec<Field>> =
        IndexVec::from_vec(vec![Vec::new(); graph.len()]);

    for id in graph.topological_order() {
        let mut full_fields: Vec<Field> = Vec::new();
        for parent in graph.parents(id) {
            for field in &merged[*parent] {
                if !full_fields.iter().any(|existing| existing.name == field.name) {
                    full_fields.push(field.clone());
                }
            }
        }

        if let Some(model) = document.model(graph.name(id)) {
            for own in &model.fields {
                match full_fields.iter().position(|existing| existing.name == own.name) {
                    Some(position) => full_fields[position] = own.clone(),
                    None => full_fields.push(own.clone()),
                }
            }
        }

        merged[id] = full_fields;
    }
    merged
}
