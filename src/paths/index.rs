//! Sorted lookup structure for path containment queries.
//!
//! A query path `q` matches the index when `q` occurs inside an indexed path,
//! or an indexed path occurs inside `q`. Occurrences are anchored: they start
//! at the beginning of a string, on a path separator, or right after one.
//! That covers the save-path-versus-file-path relation in both directions
//! (`/data/movies` inside `/data/movies/X/a.mkv`, and a mapped root inside a
//! longer local path) while keeping every lookup logarithmic.
//!
//! Matching is on raw strings, not path components: `/data/movie` matches
//! `/data/movie2/a.mkv`.

use std::cmp::Ordering;

/// Immutable sorted set of paths plus a sorted table of anchored suffixes.
#[derive(Debug, Clone, Default)]
pub struct SortedPathIndex {
    paths: Vec<String>,
    /// `(path position, byte offset)` sorted by the suffix they denote.
    suffixes: Vec<(usize, usize)>,
}

#[inline]
fn is_separator(b: u8) -> bool {
    b == b'/' || b == b'\\'
}

/// Byte offsets at which an anchored occurrence may start.
///
/// Separators are ASCII, so every offset is a char boundary.
fn anchor_offsets(s: &str) -> Vec<usize> {
    let bytes = s.as_bytes();
    let mut offsets = Vec::with_capacity(8);
    if !bytes.is_empty() {
        offsets.push(0);
    }
    for (i, &b) in bytes.iter().enumerate() {
        if !is_separator(b) {
            continue;
        }
        if offsets.last() != Some(&i) {
            offsets.push(i);
        }
        if i + 1 < bytes.len() {
            offsets.push(i + 1);
        }
    }
    offsets
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

impl SortedPathIndex {
    /// Builds the index. Empty strings are dropped and duplicates collapse.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut paths: Vec<String> = paths
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        paths.sort_unstable();
        paths.dedup();

        let mut suffixes = Vec::with_capacity(paths.len() * 4);
        for (pos, path) in paths.iter().enumerate() {
            for offset in anchor_offsets(path) {
                suffixes.push((pos, offset));
            }
        }
        suffixes.sort_unstable_by(|a, b| {
            let sa = &paths[a.0][a.1..];
            let sb = &paths[b.0][b.1..];
            sa.cmp(sb).then(a.cmp(b))
        });

        Self { paths, suffixes }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths in sorted order.
    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    /// Exact membership.
    pub fn contains(&self, path: &str) -> bool {
        self.paths
            .binary_search_by(|p| p.as_str().cmp(path))
            .is_ok()
    }

    /// Containment query in either direction; see the module docs.
    pub fn matches(&self, query: &str) -> bool {
        self.occurs_in_indexed(query) || self.indexed_occurs_in(query)
    }

    fn suffix(&self, entry: (usize, usize)) -> &str {
        &self.paths[entry.0][entry.1..]
    }

    /// `query` occurs at an anchor of some indexed path.
    fn occurs_in_indexed(&self, query: &str) -> bool {
        if query.is_empty() {
            return !self.paths.is_empty();
        }
        let idx = self
            .suffixes
            .partition_point(|&entry| self.suffix(entry).cmp(query) == Ordering::Less);
        self.suffixes
            .get(idx)
            .is_some_and(|&entry| self.suffix(entry).starts_with(query))
    }

    /// Some indexed path occurs at an anchor of `query`.
    fn indexed_occurs_in(&self, query: &str) -> bool {
        anchor_offsets(query)
            .into_iter()
            .any(|offset| self.has_prefix_of(&query[offset..]))
    }

    /// Whether any indexed path is a prefix of `s`.
    ///
    /// Every string between a prefix `p` of `s` and `s` itself starts with
    /// `p`, so the greatest indexed path `c <= s` either is a prefix of `s`
    /// or bounds the length of any candidate by `lcp(c, s)`. Each step
    /// strictly shortens the needle.
    fn has_prefix_of(&self, s: &str) -> bool {
        let mut needle = s;
        loop {
            let idx = self.paths.partition_point(|p| p.as_str() <= needle);
            if idx == 0 {
                return false;
            }
            let candidate = self.paths[idx - 1].as_str();
            if needle.starts_with(candidate) {
                return true;
            }

            let mut common = common_prefix_len(candidate, needle);
            while common > 0 && !needle.is_char_boundary(common) {
                common -= 1;
            }
            if common == 0 {
                return false;
            }
            needle = &needle[..common];
        }
    }
}
