//! In-memory indices over the tracked torrent set.
//!
//! Both are rebuilt from scratch on every run and updated in place as
//! torrents are tracked or forgotten. Each owns its lock; nothing here
//! holds one index's lock while calling into the other.

pub mod hardlinks;
pub mod registry;
pub mod torrent_files;

pub use hardlinks::HardlinkIndex;
pub use registry::{RegistryOptions, TorrentFacts, TorrentRegistry};
pub use torrent_files::{TorrentFileIndex, DEFAULT_RESULT_CACHE_ENTRIES};
