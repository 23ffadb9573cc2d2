//! Entity alignment
//!
//! Converts linker entities to character spans, classifies them into the
//! knowledge-base categories of interest, and, when an upstream span index
//! is in force, keeps only those whose span matches an upstream entity
//! exactly.

use serde::{Deserialize, Serialize};
use spotlink_core::Span;
use spotlink_linker::{LinkerEntity, LinkerOutput};

use crate::index::SpanIndex;
use crate::offsets::TokenOffsets;
use crate::LinkedEntity;

// ============================================================================
// Knowledge-base categories
// ============================================================================

/// Categories of interest, in classification priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KbCategory {
    Person,
    Place,
    Organisation,
    Device,
}

impl KbCategory {
    pub const ALL: [KbCategory; 4] = [
        KbCategory::Person,
        KbCategory::Place,
        KbCategory::Organisation,
        KbCategory::Device,
    ];

    /// Prefix the linker puts in front of ontology class names
    pub const TYPE_PREFIX: &'static str = "DBpedia:";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Place => "Place",
            Self::Organisation => "Organisation",
            Self::Device => "Device",
        }
    }

    /// First category whose `DBpedia:<name>` tag occurs in `raw_types`
    pub fn from_raw_types(raw_types: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| {
            raw_types.contains(&format!("{}{}", Self::TYPE_PREFIX, category.as_str()))
        })
    }
}

impl std::fmt::Display for KbCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Aligner
// ============================================================================

/// Aligns one linker run against the original text of a document
pub struct EntityAligner<'a> {
    /// Original (untransformed) document text
    text: &'a [char],
    /// Upstream entities every result must match; `None` accepts any span
    index: Option<&'a SpanIndex>,
}

impl<'a> EntityAligner<'a> {
    pub fn new(text: &'a [char], index: Option<&'a SpanIndex>) -> Self {
        Self { text, index }
    }

    /// Confirmed entities, in linker order
    pub fn align(&self, output: &LinkerOutput, offsets: &TokenOffsets) -> Vec<LinkedEntity> {
        output
            .entities
            .iter()
            .filter_map(|entity| self.confirm(entity, offsets))
            .collect()
    }

    fn confirm(&self, entity: &LinkerEntity, offsets: &TokenOffsets) -> Option<LinkedEntity> {
        let span = match offsets.char_span(entity.start, entity.end) {
            Ok(span) => span,
            Err(e) => {
                tracing::warn!(kb_id = %entity.kb_id, error = %e, "Skipping linker entity");
                return None;
            }
        };

        let Some(kb_category) = entity
            .raw_types
            .as_deref()
            .and_then(KbCategory::from_raw_types)
        else {
            tracing::trace!(%span, kb_id = %entity.kb_id, "No category of interest");
            return None;
        };

        let upstream_category = match self.index {
            Some(index) => {
                let Some(properties) = index.get(&span) else {
                    tracing::trace!(%span, "No upstream entity at this span");
                    return None;
                };
                properties
                    .get("category")
                    .and_then(|c| c.as_str())
                    .map(str::to_string)
            }
            None => None,
        };

        let Some(text) = span.text_of(self.text) else {
            tracing::warn!(%span, text_len = self.text.len(), "Linker span outside document text");
            return None;
        };

        Some(LinkedEntity {
            span,
            text,
            kb_category,
            kb_id: entity.kb_id.clone(),
            upstream_category,
        })
    }
}

/// Unique confirmed entity whose span contains `span`
pub fn containing_entity<'e>(entities: &'e [LinkedEntity], span: &Span) -> Option<(usize, &'e LinkedEntity)> {
    entities
        .iter()
        .enumerate()
        .find(|(_, entity)| entity.span.contains(span))
}
