//! Ignore-list matching for orphan scans.
//!
//! Plain entries match as path prefixes. Entries containing glob
//! metacharacters (`*`, `?`, `[`, `{`) are compiled into a [`GlobSet`] and
//! matched against the whole path.

use crate::error::{TidyError, TidyResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    prefixes: Vec<String>,
    globs: Option<GlobSet>,
}

impl IgnoreList {
    pub fn new<I, S>(patterns: I) -> TidyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut prefixes = Vec::new();
        let mut builder = GlobSetBuilder::new();
        let mut glob_count = 0usize;

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains(GLOB_META) {
                let glob = Glob::new(pattern).map_err(|e| {
                    TidyError::InvalidArgument(format!("invalid ignore pattern '{pattern}': {e}"))
                })?;
                builder.add(glob);
                glob_count += 1;
            } else {
                prefixes.push(pattern.to_string());
            }
        }

        let globs = if glob_count == 0 {
            None
        } else {
            Some(builder.build().map_err(|e| {
                TidyError::InvalidArgument(format!("failed to compile ignore patterns: {e}"))
            })?)
        };

        Ok(Self { prefixes, globs })
    }

    /// Adds literal prefixes. They are never interpreted as globs.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes.extend(
            prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty()),
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.globs.is_none()
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        if self.prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        self.globs
            .as_ref()
            .is_some_and(|globs| globs.is_match(Path::new(path)))
    }
}
