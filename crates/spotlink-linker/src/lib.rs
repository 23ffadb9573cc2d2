//! Spotlink Linker - Entity linking contract and clients
//!
//! The pipeline treats the entity linker as a black box mapping text to
//! tokens plus entity candidates expressed as token-index ranges. This
//! crate defines that contract, a DBpedia Spotlight implementation, and
//! the bounded retry policy wrapped around every call.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod retry;
pub mod spotlight;
pub mod tokenizer;

pub use retry::{link_with_retry, RetryPolicy};
pub use spotlight::SpotlightClient;

/// A token produced by the linker's tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text of the token
    pub text: String,
    /// Character offset of the first character
    pub idx: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, idx: usize) -> Self {
        Self {
            text: text.into(),
            idx,
        }
    }
}

/// An entity candidate over the token range `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerEntity {
    pub start: usize,
    pub end: usize,
    /// Comma-separated type tags, e.g. `DBpedia:Agent,DBpedia:Person`
    pub raw_types: Option<String>,
    /// Knowledge-base identifier (resource URI), possibly empty
    pub kb_id: String,
}

/// Full result of one linker invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkerOutput {
    pub tokens: Vec<Token>,
    pub entities: Vec<LinkerEntity>,
}

/// Linker failures, split by whether a retry can help
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkerError {
    /// Network trouble, timeouts, overloaded service
    #[error("transient linker failure: {0}")]
    Transient(String),

    /// Input or response the linker will never accept
    #[error("permanent linker failure: {0}")]
    Permanent(String),
}

impl LinkerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Trait for entity linkers
#[async_trait]
pub trait EntityLinker: Send + Sync {
    async fn link(&self, text: &str) -> Result<LinkerOutput, LinkerError>;
}
