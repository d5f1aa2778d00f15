//! # Inheritance Graph
//!
//! A child → parent graph over the models and interfaces of a document.
//! Enums never take part: inheriting from one is rejected while building.
//!
//! The graph is repaired in place: [`InheritanceGraph::break_cycles`] removes
//! back-edges and [`InheritanceGraph::apply_default_fallback`] attaches the
//! `@default` entity to models that have no model parent. Once both have run
//! the graph is acyclic and [`InheritanceGraph::topological_order`] lists
//! every entity after all of its ancestors.

use index_vec::IndexVec;
use modelmark_compiler_diagnostics::{SchemaError, SchemaResult, SourceLocation};
use modelmark_compiler_parser::{Document, EntityKind, ModelKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

index_vec::define_index_type! {
    /// Position of a model or interface in the inheritance graph.
    pub struct EntityId = usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    name: String,
    kind: ModelKind,
    is_abstract: bool,
    location: SourceLocation,
    /// Effective parents, declared ones first.
    parents: Vec<EntityId>,
}

/// One back-edge removed by [`InheritanceGraph::break_cycles`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleRepair {
    pub child: EntityId,
    pub removed_parent: EntityId,
    /// Whether the child was reattached to the default entity afterwards.
    pub reattached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceGraph {
    nodes: IndexVec<EntityId, Node>,
    by_name: FxHashMap<String, EntityId>,
    default: Option<EntityId>,
}

impl InheritanceGraph {
    /// Build the graph from the declared `inherits` lists.
    ///
    /// Fails on a parent name that resolves to nothing, on an edge no dialect
    /// allows, and on a second `@default` entity.
    pub fn build(document: &Document) -> SchemaResult<Self> {
        let mut graph = Self {
            nodes: IndexVec::new(),
            by_name: FxHashMap::default(),
            default: None,
        };

        for model in document.model_defs() {
            let id = graph.nodes.push(Node {
                name: model.name.clone(),
                kind: model.kind,
                is_abstract: model.is_abstract,
                location: model.location.clone(),
                parents: Vec::new(),
            });
            graph.by_name.insert(model.name.clone(), id);

            if model.is_default {
                if let Some(first) = graph.default {
                    return Err(SchemaError::DuplicateDefaultEntity {
                        first: graph.nodes[first].name.clone(),
                        second: model.name.clone(),
                        location: model.location.clone(),
                    });
                }
                graph.default = Some(id);
            }
        }

        for model in document.model_defs() {
            let child = graph.by_name[&model.name];
            let mut seen = FxHashSet::default();
            for parent_name in &model.inherits {
                let Some(parent) = graph.resolve(parent_name) else {
                    return Err(unresolved_parent(document, &model.name, parent_name, &model.location));
                };
                if model.is_interface() && graph.nodes[parent].kind == ModelKind::Model {
                    return Err(SchemaError::InvalidInheritance {
                        message: format!(
                            "interface '{}' cannot inherit from model '{}'",
                            model.name, graph.nodes[parent].name
                        ),
                        location: model.location.clone(),
                    });
                }
                if seen.insert(parent) {
                    graph.nodes[child].parents.push(parent);
                }
            }
        }

        Ok(graph)
    }

    /// Exact name first, then case-insensitive.
    pub fn resolve(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied().or_else(|| {
            self.nodes
                .iter_enumerated()
                .find(|(_, node)| node.name.eq_ignore_ascii_case(name))
                .map(|(id, _)| id)
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes.indices()
    }

    pub fn name(&self, id: EntityId) -> &str {
        &self.nodes[id].name
    }

    pub fn location(&self, id: EntityId) -> &SourceLocation {
        &self.nodes[id].location
    }

    pub fn parents(&self, id: EntityId) -> &[EntityId] {
        &self.nodes[id].parents
    }

    pub fn parent_names(&self, id: EntityId) -> Vec<String> {
        self.nodes[id]
            .parents
            .iter()
            .map(|parent| self.nodes[*parent].name.clone())
            .collect()
    }

    pub const fn default_entity(&self) -> Option<EntityId> {
        self.default
    }

    /// Whether `to` is `from` or one of its ancestors.
    pub fn reaches(&self, from: EntityId, to: EntityId) -> bool {
        let mut stack = vec![from];
        let mut visited = FxHashSet::default();
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if visited.insert(id) {
                stack.extend(self.nodes[id].parents.iter().copied());
            }
        }
        false
    }

    fn has_model_parent(&self, id: EntityId) -> bool {
        self.nodes[id]
            .parents
            .iter()
            .any(|parent| self.nodes[*parent].kind == ModelKind::Model)
    }

    /// Attach the default entity to `id` unless that would close a cycle.
    fn attach_default(&mut self, id: EntityId) -> bool {
        let Some(default) = self.default else {
            return false;
        };
        if id == default || self.nodes[id].parents.contains(&default) || self.reaches(default, id) {
            return false;
        }
        trace!(
            "attaching default entity '{}' to '{}'",
            self.nodes[default].name,
            self.nodes[id].name
        );
        self.nodes[id].parents.push(default);
        true
    }

    /// Depth-first search in declaration order; an edge to an entity still on
    /// the stack is removed from the entity that declared it. A non-abstract
    /// model left without a model parent is reattached to the default entity
    /// when that creates no new cycle, exactly as [`Self::apply_default_fallback`]
    /// would on a later run.
    pub fn break_cycles(&mut self) -> Vec<CycleRepair> {
        let mut state: IndexVec<EntityId, VisitState> =
            IndexVec::from_vec(vec![VisitState::Unvisited; self.nodes.len()]);
        let mut repairs = Vec::new();
        for id in self.nodes.indices() {
            if state[id] == VisitState::Unvisited {
                self.visit(id, &mut state, &mut repairs);
            }
        }

        for repair in &mut repairs {
            let child = repair.child;
            if self.needs_default(child) {
                repair.reattached = self.attach_default(child);
            }
        }
        repairs
    }

    fn visit(
        &mut self,
        root: EntityId,
        state: &mut IndexVec<EntityId, VisitState>,
        repairs: &mut Vec<CycleRepair>,
    ) {
        state[root] = VisitState::OnStack;
        let mut stack = vec![(root, 0usize)];
        while let Some(frame) = stack.last_mut() {
            let (id, position) = *frame;
            let Some(&parent) = self.nodes[id].parents.get(position) else {
                state[id] = VisitState::Done;
                stack.pop();
                continue;
            };
            match state[parent] {
                VisitState::OnStack => {
                    self.nodes[id].parents.remove(position);
                    repairs.push(CycleRepair {
                        child: id,
                        removed_parent: parent,
                        reattached: false,
                    });
                }
                VisitState::Unvisited => {
                    frame.1 += 1;
                    state[parent] = VisitState::OnStack;
                    stack.push((parent, 0));
                }
                VisitState::Done => frame.1 += 1,
            }
        }
    }

    fn needs_default(&self, id: EntityId) -> bool {
        let node = &self.nodes[id];
        node.kind == ModelKind::Model && !node.is_abstract && !self.has_model_parent(id)
    }

    /// Give every non-abstract model without a model parent the default
    /// entity as an additional parent. Returns the models that received it.
    pub fn apply_default_fallback(&mut self) -> Vec<EntityId> {
        let candidates: Vec<EntityId> = self
            .nodes
            .indices()
            .filter(|id| self.needs_default(*id))
            .collect();

        candidates
            .into_iter()
            .filter(|id| self.attach_default(*id))
            .collect()
    }

    /// Every entity after all of its ancestors, ties broken by declaration order.
    pub fn topological_order(&self) -> Vec<EntityId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited: IndexVec<EntityId, bool> = IndexVec::from_vec(vec![false; self.nodes.len()]);
        for root in self.nodes.indices() {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            let mut stack = vec![(root, 0usize)];
            while let Some(frame) = stack.last_mut() {
                let (id, position) = *frame;
                match self.nodes[id].parents.get(position) {
                    Some(&parent) => {
                        frame.1 += 1;
                        if !visited[parent] {
                            visited[parent] = true;
                            stack.push((parent, 0));
                        }
                    }
                    None => {
                        order.push(id);
                        stack.pop();
                    }
                }
            }
        }
        order
    }
}

fn unresolved_parent(
    document: &Document,
    entity: &str,
    parent: &str,
    location: &SourceLocation,
) -> SchemaError {
    match document.lookup(parent).map(|target| target.kind()) {
        Some(EntityKind::Enum) => SchemaError::InvalidInheritance {
            message: format!("'{entity}' cannot inherit from enum '{parent}'"),
            location: location.clone(),
        },
        _ => SchemaError::UnknownReference {
            entity: entity.to_string(),
            name: parent.to_string(),
            location: location.clone(),
        },
    }
}
