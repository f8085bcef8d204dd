//! Where torrent records come from.
//!
//! Backends are selected by [`ClientKind`] and expose the same
//! [`TorrentSource`] capability. Every source returns torrents sorted by
//! hash so downstream processing is reproducible.

use crate::config::ClientConfig;
use crate::error::{TidyError, TidyResult};
use crate::paths::PathMapping;
use crate::types::Torrent;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, info, instrument};

/// Backend tag, as written in configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClientKind {
    /// JSON export read from a file
    #[default]
    Snapshot,
    /// JSON export read from standard input
    Stdin,
}

pub trait TorrentSource: Send + Sync {
    fn kind(&self) -> ClientKind;

    /// All torrents known to the client, sorted by hash.
    fn torrents(&self) -> TidyResult<Vec<Torrent>>;
}

/// Parses a `{hash: torrent}` JSON object. A record's `hash` field, when
/// omitted, is taken from its key.
pub fn parse_snapshot(content: &str) -> TidyResult<Vec<Torrent>> {
    let records: HashMap<String, Torrent> = serde_json::from_str(content)?;
    let mut torrents: Vec<Torrent> = records
        .into_iter()
        .map(|(hash, mut torrent)| {
            if torrent.hash.is_empty() {
                torrent.hash = hash;
            }
            torrent
        })
        .collect();
    torrents.sort_by(|a, b| a.hash.cmp(&b.hash));
    Ok(torrents)
}

#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TorrentSource for SnapshotSource {
    fn kind(&self) -> ClientKind {
        ClientKind::Snapshot
    }

    #[instrument(skip(self), fields(client_op = "torrents", path = %self.path.display()))]
    fn torrents(&self) -> TidyResult<Vec<Torrent>> {
        let content = std::fs::read_to_string(&self.path)?;
        let torrents = parse_snapshot(&content)?;
        debug!(count = torrents.len(), "Loaded torrent snapshot");
        Ok(torrents)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl TorrentSource for StdinSource {
    fn kind(&self) -> ClientKind {
        ClientKind::Stdin
    }

    #[instrument(skip(self), fields(client_op = "torrents"))]
    fn torrents(&self) -> TidyResult<Vec<Torrent>> {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        parse_snapshot(&content)
    }
}

/// Builds the backend named by `config.kind`.
pub fn open(config: &ClientConfig) -> TidyResult<Box<dyn TorrentSource>> {
    let source: Box<dyn TorrentSource> = match config.kind {
        ClientKind::Snapshot => {
            let path = config.torrents_file.as_ref().ok_or_else(|| {
                TidyError::InvalidArgument(format!(
                    "client '{}' of kind snapshot needs a torrents_file",
                    config.name
                ))
            })?;
            Box::new(SnapshotSource::new(path))
        }
        ClientKind::Stdin => Box::new(StdinSource),
    };
    info!(client = %config.name, kind = %config.kind, "Initialized client");
    Ok(source)
}

/// Whether a category passes the include/exclude lists, compared
/// case-insensitively. Exclusions win; an empty include list admits all.
pub fn category_selected(label: &str, include: &[String], exclude: &[String]) -> bool {
    if exclude.iter().any(|c| c.eq_ignore_ascii_case(label)) {
        return false;
    }
    include.is_empty() || include.iter().any(|c| c.eq_ignore_ascii_case(label))
}

/// Keeps torrents whose label passes [`category_selected`].
pub fn filter_by_category(
    torrents: Vec<Torrent>,
    include: &[String],
    exclude: &[String],
) -> Vec<Torrent> {
    if include.is_empty() && exclude.is_empty() {
        return torrents;
    }

    let before = torrents.len();
    let kept: Vec<Torrent> = torrents
        .into_iter()
        .filter(|t| category_selected(&t.label, include, exclude))
        .collect();

    if kept.len() != before {
        info!(before, after = kept.len(), "Filtered torrents by category");
    }
    kept
}

/// Local save path of every category, sorted by name.
///
/// Derived from labelled torrents: each save path is translated through
/// `mapping`, and when a category's torrents disagree the shortest path
/// wins. Labels compare case-insensitively and keep the first spelling
/// seen in hash order. `configured` entries add categories or replace the
/// derived path.
pub fn category_paths(
    torrents: &[Torrent],
    mapping: &PathMapping,
    configured: &BTreeMap<String, PathBuf>,
) -> Vec<(String, PathBuf)> {
    let mut ordered: Vec<&Torrent> = torrents.iter().collect();
    ordered.sort_by(|a, b| a.hash.cmp(&b.hash));

    // lowercased label -> (label, save path)
    let mut categories: BTreeMap<String, (String, PathBuf)> = BTreeMap::new();
    for torrent in ordered {
        if torrent.label.is_empty() || torrent.path.is_empty() {
            continue;
        }
        let local = PathBuf::from(mapping.apply(&torrent.path).into_owned());
        match categories.entry(torrent.label.to_lowercase()) {
            Entry::Vacant(slot) => {
                slot.insert((torrent.label.clone(), local));
            }
            Entry::Occupied(mut slot) => {
                let current = &mut slot.get_mut().1;
                if *current != local {
                    debug!(
                        category = %torrent.label,
                        kept = %current.display(),
                        other = %local.display(),
                        "Category torrents use different save paths"
                    );
                    let shorter = (local.as_os_str().len(), &local)
                        < (current.as_os_str().len(), &*current);
                    if shorter {
                        *current = local;
                    }
                }
            }
        }
    }

    for (label, path) in configured {
        let slot = categories
            .entry(label.to_lowercase())
            .or_insert_with(|| (label.clone(), path.clone()));
        slot.1 = path.clone();
    }

    categories.into_values().collect()
}
