use serde::{Deserialize, Serialize};

/// Torrent record as reported by a client.
///
/// Indices keep copies of these for lookups and never modify them. `hash`
/// is the stable key; `files` holds absolute paths as the client sees them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Torrent {
    /// May be omitted when the record is keyed by hash.
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub name: String,
    /// Save path (download directory) of the torrent.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub downloaded: bool,
    /// Client category or label.
    #[serde(default)]
    pub label: String,
}

impl Torrent {
    pub fn new(hash: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            hash: hash.into(),
            files,
            downloaded: true,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_save_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_downloaded(mut self, downloaded: bool) -> Self {
        self.downloaded = downloaded;
        self
    }
}
