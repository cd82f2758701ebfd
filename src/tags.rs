//! Tags
//!
//! Bundle tags used for storefront filtering ("promocao", "kit-completo", ...).

use smallvec::SmallVec;

/// A sorted, de-duplicated set of lower-case tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: SmallVec<[String; 5]>,
}

impl TagSet {
    /// Create a tag set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }

    /// Check whether the set contains a tag, ignoring case.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search(&tag.to_lowercase()).is_ok()
    }

    /// Check whether any tag contains the given lower-case fragment.
    pub fn any_contains(&self, fragment: &str) -> bool {
        self.tags.iter().any(|tag| tag.contains(fragment))
    }

    /// Iterate over the tags in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags: SmallVec<[String; 5]> = iter
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        tags.sort();
        tags.dedup();

        Self { tags }
    }
}
