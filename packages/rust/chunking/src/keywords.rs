//! Ordered keyword tables.

use docingest_shared::KeywordGroup;

/// An ordered list of `(tag, keywords)` groups.
///
/// Lookups return the tag of the *first* group containing any keyword that
/// occurs in the text, so group order is the tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable<T> {
    groups: Vec<KeywordGroup<T>>,
}

impl<T: Copy> KeywordTable<T> {
    pub fn new(groups: Vec<KeywordGroup<T>>) -> Self {
        Self { groups }
    }

    /// Case-sensitive substring match, first group wins.
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.groups
            .iter()
            .find(|group| group.keywords.iter().any(|kw| text.contains(kw.as_str())))
            .map(|group| group.tag)
    }

    /// Like [`first_match`](Self::first_match) but lowercases both sides.
    pub fn first_match_ci(&self, text: &str) -> Option<T> {
        let text = text.to_lowercase();
        self.groups
            .iter()
            .find(|group| {
                group
                    .keywords
                    .iter()
                    .any(|kw| text.contains(kw.to_lowercase().as_str()))
            })
            .map(|group| group.tag)
    }
}

impl<T: Copy> From<Vec<KeywordGroup<T>>> for KeywordTable<T> {
    fn from(groups: Vec<KeywordGroup<T>>) -> Self {
        Self::new(groups)
    }
}
