//! Dependency-based Relation Extraction
//!
//! Walks the upstream dependency edges, resolves each edge's dependent to
//! the confirmed entity containing it, and relates every pair of distinct
//! entities governed by the same token. Pairs are produced incrementally:
//! the K-th entity found under a governor is paired with the K-1 entities
//! already recorded there.

use std::collections::HashMap;

use spotlink_core::Span;

use crate::aligner::containing_entity;
use crate::{DependencyEdge, LinkedEntity, Relation};

/// Entity already seen under a governor, with its dependency label
#[derive(Debug, Clone)]
struct GovernedEntity {
    entity: usize,
    dep: String,
}

pub struct DependencyRelationExtractor<'a> {
    entities: &'a [LinkedEntity],
    groups: HashMap<Span, Vec<GovernedEntity>>,
}

impl<'a> DependencyRelationExtractor<'a> {
    pub fn new(entities: &'a [LinkedEntity]) -> Self {
        Self {
            entities,
            groups: HashMap::new(),
        }
    }

    /// Relations for all `edges`, in edge-arrival order
    pub fn extract<'e>(mut self, edges: impl IntoIterator<Item = &'e DependencyEdge>) -> Vec<Relation> {
        let mut relations = Vec::new();
        for edge in edges {
            relations.extend(self.observe(edge));
        }
        relations
    }

    /// Feed one edge; returns the relations it completes
    pub fn observe(&mut self, edge: &DependencyEdge) -> Vec<Relation> {
        let Some((index, entity)) = containing_entity(self.entities, &edge.dependent) else {
            tracing::trace!(dependent = %edge.dependent, "Dependent is not part of a confirmed entity");
            return Vec::new();
        };

        let group = self.groups.entry(edge.governor).or_default();
        if group.iter().any(|g| g.entity == index) {
            // another token of an entity already governed here
            return Vec::new();
        }

        let relations = group
            .iter()
            .map(|previous| Relation {
                governor: edge.governor,
                governor_text: edge.governor_text.clone(),
                governor_lemma: edge.governor_lemma.clone(),
                first: self.entities[previous.entity].clone(),
                first_dep: previous.dep.clone(),
                second: entity.clone(),
                second_dep: edge.label.clone(),
            })
            .collect();

        group.push(GovernedEntity {
            entity: index,
            dep: edge.label.clone(),
        });
        relations
    }
}

// ============================================================================
// Tests
// ============================================================================
