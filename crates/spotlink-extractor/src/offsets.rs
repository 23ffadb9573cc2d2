//! Token offset table
//!
//! The linker reports entity boundaries as token indices; everything else
//! works in character offsets. Every token-index lookup goes through here.

use spotlink_core::{Span, SpotlinkError};
use spotlink_linker::Token;

#[derive(Debug, Clone, Default)]
pub struct TokenOffsets {
    offsets: Vec<Span>,
}

impl TokenOffsets {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let offsets = tokens
            .iter()
            .map(|t| Span::new(t.idx, t.idx + t.text.chars().count()))
            .collect();
        Self { offsets }
    }

    /// Character span of one token
    pub fn get(&self, token: usize) -> Option<Span> {
        self.offsets.get(token).copied()
    }

    /// Character span covering tokens `[start_token, end_token)`
    pub fn char_span(&self, start_token: usize, end_token: usize) -> spotlink_core::Result<Span> {
        if end_token <= start_token {
            return Err(SpotlinkError::MalformedLinkerOutput(format!(
                "empty token range [{start_token}, {end_token})"
            )));
        }
        let (Some(first), Some(last)) = (self.get(start_token), self.get(end_token - 1)) else {
            return Err(SpotlinkError::MalformedLinkerOutput(format!(
                "token range [{start_token}, {end_token}) beyond {} tokens",
                self.offsets.len()
            )));
        };
        Ok(Span::new(first.start, last.end))
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
