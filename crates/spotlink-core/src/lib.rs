//! Spotlink Core - Shared types, traits, and configuration
//!
//! This crate defines the core abstractions used throughout Spotlink:
//! - Character span arithmetic (overlap, containment, equality)
//! - Annotation identifier generation
//! - The MMIF document container read and written by the pipeline
//! - Common error types
//! - Configuration management

pub mod config;
pub mod identifiers;
pub mod mmif;
pub mod span;

pub use config::{
    AnnotationConfig, AppConfig, ConfigError, LinkerConfig, LoggingConfig, RetryConfig,
    ServerConfig,
};
pub use identifiers::IdentifierGenerator;
pub use mmif::{Annotation, Document, Mmif, View};
pub use span::Span;

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Spotlink operations
#[derive(Error, Debug)]
pub enum SpotlinkError {
    /// Document text could not be fetched from its location
    #[error("Resource unavailable at {location}: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The linker refused the input; retrying would not help
    #[error("Linker rejected input: {0}")]
    LinkerRejected(String),

    #[error("Linker still failing after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Annotation run cancelled")]
    Cancelled,

    #[error("Malformed linker output: {0}")]
    MalformedLinkerOutput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpotlinkError>;

impl From<ConfigError> for SpotlinkError {
    fn from(err: ConfigError) -> Self {
        SpotlinkError::ConfigError(err.to_string())
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Annotation and document type URIs understood by the pipeline
pub mod vocabulary {
    pub const NAMED_ENTITY: &str = "http://vocab.lappsgrid.org/NamedEntity";
    pub const DEPENDENCY: &str = "http://vocab.lappsgrid.org/Dependency";
    pub const RELATION: &str = "http://vocab.lappsgrid.org/Relation";
    pub const TEXT_DOCUMENT: &str = "http://mmif.clams.ai/0.4.0/vocabulary/TextDocument";

    /// Suffix shared by every version of the TextDocument type
    pub const TEXT_DOCUMENT_SUFFIX: &str = "TextDocument";

    pub fn is_text_document(at_type: &str) -> bool {
        at_type.ends_with(TEXT_DOCUMENT_SUFFIX)
    }
}
