//! Character spans
//!
//! Every offset handled by the pipeline is a character (Unicode scalar)
//! offset into a document's text, never a byte offset. All comparisons
//! between spans coming from different annotators go through this module.

use serde::{Deserialize, Serialize};

/// Half-open character interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// `start1 < end2 && end1 > start2`
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Both bounds equal
    pub fn matches(&self, other: &Span) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// `other` lies entirely within `self`
    pub fn contains(&self, other: &Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Slice this span out of a character buffer, `None` when out of bounds
    pub fn slice<'a>(&self, chars: &'a [char]) -> Option<&'a [char]> {
        if self.start > self.end || self.end > chars.len() {
            return None;
        }
        Some(&chars[self.start..self.end])
    }

    /// Surface text of this span, `None` when out of bounds
    pub fn text_of(&self, chars: &[char]) -> Option<String> {
        self.slice(chars).map(|s| s.iter().collect())
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Self::new(start, end)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap_is_strict_at_boundaries() {
        let a = Span::new(0, 3);
        let b = Span::new(3, 6);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&Span::new(2, 4)));
    }

    #[test]
    fn test_contains() {
        let outer = Span::new(9, 17);
        assert!(outer.contains(&Span::new(10, 17)));
        assert!(outer.contains(&Span::new(9, 17)));
        assert!(!outer.contains(&Span::new(8, 12)));
        assert!(!outer.contains(&Span::new(16, 18)));
    }

    #[test]
    fn test_text_of_counts_characters() {
        let chars: Vec<char> = "Zoë met Émile".chars().collect();
        assert_eq!(Span::new(0, 3).text_of(&chars).as_deref(), Some("Zoë"));
        assert_eq!(Span::new(8, 13).text_of(&chars).as_deref(), Some("Émile"));
        assert_eq!(Span::new(8, 14).text_of(&chars), None);
    }

    proptest! {
        #[test]
        fn matching_spans_contain_each_other(start in 0usize..500, len in 0usize..50) {
            let a = Span::new(start, start + len);
            let b = Span::new(start, start + len);
            prop_assert!(a.matches(&b));
            prop_assert!(a.contains(&b) && b.contains(&a));
            prop_assert_eq!(a, b);
        }

        #[test]
        fn overlap_is_symmetric(s1 in 0usize..100, l1 in 0usize..20, s2 in 0usize..100, l2 in 0usize..20) {
            let a = Span::new(s1, s1 + l1);
            let b = Span::new(s2, s2 + l2);
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }
}
