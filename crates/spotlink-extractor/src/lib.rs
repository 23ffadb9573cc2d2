//! Spotlink Extractor - Entity confirmation and relation extraction
//!
//! Confirms entities found by an upstream recognizer against a fresh run
//! of the entity linker, enriches them with a knowledge-base category and
//! identifier, and derives relations between confirmed entities that share
//! a governing token in an upstream dependency layer.

use serde::{Deserialize, Serialize};
use spotlink_core::{Annotation, Span};

pub mod aligner;
pub mod casing;
pub mod emitter;
pub mod index;
pub mod offsets;
pub mod pipeline;
pub mod relation;
pub mod text;

pub use aligner::{EntityAligner, KbCategory};
pub use emitter::AnnotationEmitter;
pub use index::SpanIndex;
pub use offsets::TokenOffsets;
pub use pipeline::{AnnotationPipeline, AppMetadata};
pub use relation::DependencyRelationExtractor;
pub use text::TextAccessor;

/// Entity confirmed by both the upstream recognizer and the linker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub span: Span,
    /// Surface form taken from the original, untransformed text
    pub text: String,
    pub kb_category: KbCategory,
    pub kb_id: String,
    /// Category assigned by the upstream recognizer, when one matched
    pub upstream_category: Option<String>,
}

/// One edge of the upstream dependency layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub governor: Span,
    pub governor_text: String,
    pub governor_lemma: String,
    pub dependent: Span,
    pub label: String,
}

impl DependencyEdge {
    /// Read an edge from a dependency annotation, `None` when offsets are missing
    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        let text_prop = |key: &str| annotation.get_str(key).unwrap_or_default().to_string();
        Some(Self {
            governor: annotation.span_of("governer_start", "governer_end")?,
            governor_text: text_prop("governer_text"),
            governor_lemma: text_prop("governer_lemma"),
            dependent: annotation.span_of("dependent_start", "dependent_end")?,
            label: text_prop("dep"),
        })
    }
}

/// Two distinct entities governed by the same token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub governor: Span,
    pub governor_text: String,
    pub governor_lemma: String,
    pub first: LinkedEntity,
    pub first_dep: String,
    pub second: LinkedEntity,
    pub second_dep: String,
}

impl Relation {
    /// The pair of entity spans, smaller first
    pub fn span_pair(&self) -> (Span, Span) {
        let (a, b) = (self.first.span, self.second.span);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotlink_core::vocabulary;

    #[test]
    fn test_dependency_edge_from_annotation() {
        let mut annotation = Annotation::new(vocabulary::DEPENDENCY, "dep1");
        annotation.add_property("governer_start", 4);
        annotation.add_property("governer_end", 9);
        annotation.add_property("governer_text", "plays");
        annotation.add_property("governer_lemma", "play");
        annotation.add_property("dependent_start", 0);
        annotation.add_property("dependent_end", 3);
        annotation.add_property("dep", "nsubj");

        let edge = DependencyEdge::from_annotation(&annotation).unwrap();
        assert_eq!(edge.governor, Span::new(4, 9));
        assert_eq!(edge.governor_lemma, "play");
        assert_eq!(edge.dependent, Span::new(0, 3));
        assert_eq!(edge.label, "nsubj");
    }

    #[test]
    fn test_dependency_edge_requires_offsets() {
        let mut annotation = Annotation::new(vocabulary::DEPENDENCY, "dep1");
        annotation.add_property("governer_start", 4);
        annotation.add_property("dep", "nsubj");
        assert!(DependencyEdge::from_annotation(&annotation).is_none());
    }
}
