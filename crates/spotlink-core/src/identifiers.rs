//! Annotation identifier generation
//!
//! Identifiers are `prefix` followed by a 1-based counter kept per prefix.
//! A generator belongs to a single annotation run; it does not look at
//! identifiers already present in the container, so it is only safe for
//! views created during that run.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdentifierGenerator {
    counters: HashMap<String, u64>,
}

impl IdentifierGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier for `prefix`
    pub fn next(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{prefix}{counter}")
    }

    /// Forget every counter
    pub fn reset(&mut self) {
        self.counters.clear();
    }

    /// Number of identifiers handed out so far for `prefix`
    pub fn issued(&self, prefix: &str) -> u64 {
        self.counters.get(prefix).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_then_sequence() {
        let mut ids = IdentifierGenerator::new();
        ids.next("ne");
        ids.next("ne");
        ids.reset();

        let generated: Vec<String> = (0..5).map(|_| ids.next("ne")).collect();
        assert_eq!(generated, vec!["ne1", "ne2", "ne3", "ne4", "ne5"]);
    }

    #[test]
    fn test_prefixes_are_independent() {
        let mut ids = IdentifierGenerator::new();
        assert_eq!(ids.next("ne"), "ne1");
        assert_eq!(ids.next("rel"), "rel1");
        assert_eq!(ids.next("ne"), "ne2");
        assert_eq!(ids.issued("ne"), 2);
        assert_eq!(ids.issued("v"), 0);
    }

    #[test]
    fn test_fresh_generators_do_not_share_state() {
        let mut first = IdentifierGenerator::new();
        first.next("ne");
        let mut second = IdentifierGenerator::new();
        assert_eq!(second.next("ne"), "ne1");
    }
}
