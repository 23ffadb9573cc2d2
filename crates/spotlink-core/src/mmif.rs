//! MMIF document container
//!
//! A serde model of the subset of MMIF (Multi-Media Interchange Format)
//! the pipeline reads and writes: top-level documents, views, and the
//! annotations inside them. Unknown fields are carried through untouched.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::span::Span;
use crate::{vocabulary, SpotlinkError};

/// Root of an MMIF file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mmif {
    pub metadata: MmifMetadata,

    #[serde(default)]
    pub documents: Vec<Document>,

    #[serde(default)]
    pub views: Vec<View>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MmifMetadata {
    /// MMIF version URI
    pub mmif: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mmif {
    /// Create an empty container for the given MMIF version URI
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            metadata: MmifMetadata {
                mmif: version.into(),
                extra: Map::new(),
            },
            documents: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Parse and check an MMIF string; failures are `InvalidDocument`
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let mmif: Self = serde_json::from_str(json)
            .map_err(|e| SpotlinkError::InvalidDocument(e.to_string()))?;
        mmif.validate()?;
        Ok(mmif)
    }

    /// View ids must be present and unique: nested document ids and
    /// `new_view` both key on them
    fn validate(&self) -> crate::Result<()> {
        let mut seen = HashSet::new();
        for view in &self.views {
            if view.id.is_empty() {
                return Err(SpotlinkError::InvalidDocument("view without an id".to_string()));
            }
            if !seen.insert(view.id.as_str()) {
                return Err(SpotlinkError::InvalidDocument(format!(
                    "duplicate view id '{}'",
                    view.id
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Top-level text documents, in input order
    pub fn text_documents(&self) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| vocabulary::is_text_document(&d.at_type))
            .collect()
    }

    pub fn view(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id == id)
    }

    /// Views holding annotations anchored on `doc_id`, in container order
    pub fn views_for_document(&self, doc_id: &str) -> Vec<&View> {
        self.views
            .iter()
            .filter(|v| v.is_anchored_on(doc_id))
            .collect()
    }

    /// Text documents nested inside a view as annotations
    pub fn documents_in_view(&self, view_id: &str) -> Vec<Document> {
        self.view(view_id)
            .map(|v| v.annotations.iter().filter_map(Annotation::as_document).collect())
            .unwrap_or_default()
    }

    /// Append a new empty view with a fresh `v_N` identifier
    pub fn new_view(&mut self) -> &mut View {
        let mut n = self.views.len() + 1;
        while self.view(&format!("v_{n}")).is_some() {
            n += 1;
        }
        self.views.push(View::new(format!("v_{n}")));
        let last = self.views.len() - 1;
        &mut self.views[last]
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "@type")]
    pub at_type: String,

    pub properties: DocumentProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,

    /// External location of the text (URL or path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Inline text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(rename = "@value")]
    pub value: String,

    #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Document {
    /// Inline text document
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            at_type: vocabulary::TEXT_DOCUMENT.to_string(),
            properties: DocumentProperties {
                id: id.into(),
                mime: None,
                location: None,
                text: Some(TextValue {
                    value: text.into(),
                    language: None,
                }),
                extra: Map::new(),
            },
        }
    }

    /// Text document stored at an external location
    pub fn located(id: impl Into<String>, location: impl Into<String>) -> Self {
        let mut doc = Self::text(id, "");
        doc.properties.text = None;
        doc.properties.location = Some(location.into());
        doc
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn location(&self) -> Option<&str> {
        self.properties.location.as_deref().filter(|l| !l.is_empty())
    }

    pub fn inline_text(&self) -> Option<&str> {
        self.properties.text.as_ref().map(|t| t.value.as_str())
    }
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub id: String,

    #[serde(default)]
    pub metadata: ViewMetadata,

    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewMetadata {
    /// Identifier of the app that produced the view
    #[serde(default)]
    pub app: String,

    /// Kept verbatim; producing apps disagree on whether to carry an offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Annotation type URI -> properties shared by all annotations of that type
    #[serde(default)]
    pub contains: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Format used when signing: naive UTC with microseconds
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

impl ViewMetadata {
    /// The timestamp as UTC, accepting both RFC 3339 and offset-less forms
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

impl View {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: ViewMetadata::default(),
            annotations: Vec::new(),
        }
    }

    /// Stamp the view with the producing app and the current time
    pub fn sign(&mut self, app: &str) {
        self.metadata.app = app.to_string();
        self.metadata.timestamp = Some(Utc::now().format(TIMESTAMP_FORMAT).to_string());
    }

    pub fn contains_type(&self, at_type: &str) -> bool {
        self.metadata.contains.contains_key(at_type)
    }

    /// Declare an annotation type, optionally anchored on one document
    pub fn new_contain(&mut self, at_type: &str, document: Option<&str>) {
        let mut props = Map::new();
        if let Some(doc_id) = document {
            props.insert("document".to_string(), Value::from(doc_id));
        }
        self.metadata
            .contains
            .insert(at_type.to_string(), Value::Object(props));
    }

    /// Append an annotation and return it for property filling
    pub fn new_annotation(&mut self, at_type: &str, id: impl Into<String>) -> &mut Annotation {
        self.annotations.push(Annotation::new(at_type, id));
        let last = self.annotations.len() - 1;
        &mut self.annotations[last]
    }

    pub fn annotations_of_type<'a>(
        &'a self,
        at_type: &'a str,
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annotations.iter().filter(move |a| a.at_type == at_type)
    }

    fn is_anchored_on(&self, doc_id: &str) -> bool {
        let in_contains = self.metadata.contains.values().any(|props| {
            props.get("document").and_then(Value::as_str) == Some(doc_id)
        });
        in_contains || self.annotations.iter().any(|a| a.document() == Some(doc_id))
    }
}

// ============================================================================
// Annotations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "@type")]
    pub at_type: String,

    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Annotation {
    pub fn new(at_type: &str, id: impl Into<String>) -> Self {
        let mut properties = Map::new();
        properties.insert("id".to_string(), Value::String(id.into()));
        Self {
            at_type: at_type.to_string(),
            properties,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Non-negative integer property; numeric strings are accepted too
    pub fn get_usize(&self, key: &str) -> Option<usize> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn add_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    /// Sub-document this annotation is anchored on, if any
    pub fn document(&self) -> Option<&str> {
        self.get_str("document")
    }

    /// `start`/`end` as a span
    pub fn span(&self) -> Option<Span> {
        self.span_of("start", "end")
    }

    /// Span built from two arbitrary offset properties
    pub fn span_of(&self, start_key: &str, end_key: &str) -> Option<Span> {
        Some(Span::new(self.get_usize(start_key)?, self.get_usize(end_key)?))
    }

    /// Interpret a nested TextDocument annotation as a document
    pub fn as_document(&self) -> Option<Document> {
        if !vocabulary::is_text_document(&self.at_type) {
            return None;
        }
        let properties = serde_json::from_value(Value::Object(self.properties.clone())).ok()?;
        Some(Document {
            at_type: self.at_type.clone(),
            properties,
        })
    }
}
