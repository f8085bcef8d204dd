//! Prefix substitution between torrent-client paths and local paths.
//!
//! Containerised deployments see the same data under different roots
//! (`/data` inside the client, `/mnt/storage` on the host). A
//! [`PathMapping`] is an ordered list of `from -> to` prefix rules; the first
//! declared rule whose `from` prefixes the input wins and at most one
//! substitution is applied.

use crate::error::{TidyError, TidyResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One configured `from -> to` prefix rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapEntry {
    pub from: String,
    pub to: String,
}

impl PathMapEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Validated, ordered prefix mapping table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMapping {
    rules: Vec<PathMapEntry>,
    key: String,
}

// NUL cannot appear in a path, so it cannot collide with rule contents.
const KEY_FIELD_SEP: char = '\0';
const KEY_RULE_SEP: char = '\u{1}';

impl PathMapping {
    /// A mapping that leaves every path untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a mapping, rejecting empty or duplicated `from` prefixes.
    pub fn new(rules: Vec<PathMapEntry>) -> TidyResult<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.from.is_empty() {
                return Err(TidyError::InvalidPathMapping {
                    from: rule.from.clone(),
                    reason: "source prefix cannot be empty".to_string(),
                });
            }
            if rules[..i].iter().any(|earlier| earlier.from == rule.from) {
                return Err(TidyError::InvalidPathMapping {
                    from: rule.from.clone(),
                    reason: "source prefix declared more than once".to_string(),
                });
            }
        }

        let key = canonical_key(&rules);
        Ok(Self { rules, key })
    }

    /// Convenience constructor from `(from, to)` pairs in declaration order.
    pub fn from_pairs<I, A, B>(pairs: I) -> TidyResult<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(from, to)| PathMapEntry::new(from, to))
                .collect(),
        )
    }

    pub fn rules(&self) -> &[PathMapEntry] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies the first matching rule. Unmatched paths are borrowed back.
    pub fn apply<'a>(&self, path: &'a str) -> Cow<'a, str> {
        for rule in &self.rules {
            if let Some(rest) = path.strip_prefix(rule.from.as_str()) {
                let mut mapped = String::with_capacity(rule.to.len() + rest.len());
                mapped.push_str(&rule.to);
                mapped.push_str(rest);
                return Cow::Owned(mapped);
            }
        }
        Cow::Borrowed(path)
    }

    /// Stable identity of this table for keying derived caches.
    ///
    /// Tables whose prefixes never overlap give the same result in any
    /// order, so their key is built from the rules sorted by source prefix.
    /// When one prefix extends another, declaration order decides which
    /// rule wins and is therefore part of the key.
    pub fn cache_key(&self) -> &str {
        &self.key
    }
}

fn canonical_key(rules: &[PathMapEntry]) -> String {
    if rules.is_empty() {
        return String::new();
    }

    let overlapping = rules.iter().enumerate().any(|(i, a)| {
        rules
            .iter()
            .enumerate()
            .any(|(j, b)| i != j && b.from.starts_with(a.from.as_str()))
    });

    let mut ordered: Vec<&PathMapEntry> = rules.iter().collect();
    if !overlapping {
        ordered.sort_by(|a, b| a.from.cmp(&b.from));
    }

    let mut key = String::with_capacity(rules.len() * 50 + 8);
    key.push_str(if overlapping { "ordered" } else { "sorted" });
    for rule in ordered {
        key.push(KEY_RULE_SEP);
        key.push_str(&rule.from);
        key.push(KEY_FIELD_SEP);
        key.push_str(&rule.to);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mapping_is_identity() {
        let mapping = PathMapping::empty();
        assert!(mapping.is_empty());
        assert_eq!(mapping.apply("/data/movies/a.mkv"), "/data/movies/a.mkv");
        assert!(matches!(mapping.apply("/x"), Cow::Borrowed(_)));
        assert_eq!(mapping.cache_key(), "");
    }

    #[test]
    fn test_first_declared_rule_wins() {
        let mapping =
            PathMapping::from_pairs([("/data", "/mnt"), ("/data/movies", "/films")]).unwrap();
        assert_eq!(mapping.apply("/data/movies/a.mkv"), "/mnt/movies/a.mkv");

        let reversed =
            PathMapping::from_pairs([("/data/movies", "/films"), ("/data", "/mnt")]).unwrap();
        assert_eq!(reversed.apply("/data/movies/a.mkv"), "/films/a.mkv");
        assert_eq!(reversed.apply("/data/tv/b.mkv"), "/mnt/tv/b.mkv");
    }

    #[test]
    fn test_only_prefix_is_replaced() {
        let mapping = PathMapping::from_pairs([("/data", "/mnt")]).unwrap();
        assert_eq!(mapping.apply("/srv/data/a.mkv"), "/srv/data/a.mkv");
        assert_eq!(mapping.apply("/data/data/a.mkv"), "/mnt/data/a.mkv");
    }

    #[test]
    fn test_rejects_empty_source() {
        let err = PathMapping::from_pairs([("", "/mnt")]).unwrap_err();
        assert!(matches!(err, TidyError::InvalidPathMapping { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_duplicate_source() {
        let err = PathMapping::from_pairs([("/data", "/a"), ("/data", "/b")]).unwrap_err();
        assert!(matches!(err, TidyError::InvalidPathMapping { .. }));
    }

    #[test]
    fn test_cache_key_ignores_order_of_disjoint_rules() {
        let a = PathMapping::from_pairs([("/data", "/mnt"), ("/tv", "/media/tv")]).unwrap();
        let b = PathMapping::from_pairs([("/tv", "/media/tv"), ("/data", "/mnt")]).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_keeps_order_of_overlapping_rules() {
        let a = PathMapping::from_pairs([("/data", "/mnt"), ("/data/movies", "/films")]).unwrap();
        let b = PathMapping::from_pairs([("/data/movies", "/films"), ("/data", "/mnt")]).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_cache_key_distinguishes_targets() {
        let a = PathMapping::from_pairs([("/data", "/mnt")]).unwrap();
        let b = PathMapping::from_pairs([("/data", "/srv")]).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }
}
