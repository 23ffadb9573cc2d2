//! Span index over upstream named-entity annotations
//!
//! Maps each `(start, end)` span of an upstream entity to that entity's
//! properties. Lookups are exact: a span is found only when both bounds
//! match.

use std::collections::HashMap;

use serde_json::{Map, Value};
use spotlink_core::{Annotation, Span};

#[derive(Debug, Clone, Default)]
pub struct SpanIndex {
    entries: HashMap<Span, Map<String, Value>>,
}

impl SpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `annotations`, keeping only those anchored on `target` when given.
    ///
    /// Two annotations with identical bounds collapse into one entry; the one
    /// appearing later in `annotations` wins.
    pub fn build<'a>(
        annotations: impl IntoIterator<Item = &'a Annotation>,
        target: Option<&str>,
    ) -> Self {
        let mut index = Self::new();
        for annotation in annotations {
            if let Some(doc_id) = target {
                if annotation.document() != Some(doc_id) {
                    continue;
                }
            }
            match annotation.span() {
                Some(span) => index.insert(span, annotation.properties.clone()),
                None => tracing::debug!(
                    id = annotation.id().unwrap_or_default(),
                    "Upstream entity without offsets ignored"
                ),
            }
        }
        index
    }

    pub fn insert(&mut self, span: Span, properties: Map<String, Value>) {
        if self.entries.insert(span, properties).is_some() {
            tracing::debug!(%span, "Upstream entity replaced by a later one at the same span");
        }
    }

    pub fn get(&self, span: &Span) -> Option<&Map<String, Value>> {
        self.entries.get(span)
    }

    /// Upstream `category` of the entity at exactly `span`
    pub fn category(&self, span: &Span) -> Option<&str> {
        self.get(span)?.get("category").and_then(Value::as_str)
    }

    pub fn contains_span(&self, span: &Span) -> bool {
        self.entries.contains_key(span)
    }

    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
