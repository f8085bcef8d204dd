//! Test fixtures for torrent data
//!
//! Provides predefined torrent records for the common shapes: a single
//! file, a cross-seed pair sharing one file, and a season pack.

use torrent_tidy::Torrent;

/// Create a torrent owning the given files
///
/// The torrent is marked downloaded, named after its hash.
///
/// # Example
/// ```rust
/// let t = torrent("t1", &["/d/a.mkv"]);
/// assert_eq!(t.files.len(), 1);
/// ```
pub fn torrent(hash: &str, files: &[&str]) -> Torrent {
    Torrent::new(hash, files.iter().map(|f| f.to_string()).collect()).with_name(hash)
}

/// Create a torrent that is still downloading
///
/// Hardlink queries treat these as having nothing on disk.
pub fn incomplete_torrent(hash: &str, files: &[&str]) -> Torrent {
    torrent(hash, files).with_downloaded(false)
}

/// The three-torrent scenario used across index tests
///
/// - `t1` and `t2` both reference `/d/a.mkv` (a cross-seed)
/// - `t3` is the sole owner of `/d/b.mkv`
pub fn cross_seed_scenario() -> Vec<Torrent> {
    vec![
        torrent("t1", &["/d/a.mkv"]),
        torrent("t2", &["/d/a.mkv"]),
        torrent("t3", &["/d/b.mkv"]),
    ]
}

/// Create a multi-file season pack below `root`
///
/// Episodes are `root/Show.S01/Show.S01E0{n}.mkv` for `n` in `1..=episodes`,
/// plus an `.nfo` file.
pub fn season_pack(hash: &str, root: &str, episodes: usize) -> Torrent {
    let mut files: Vec<String> = (1..=episodes)
        .map(|n| format!("{root}/Show.S01/Show.S01E0{n}.mkv"))
        .collect();
    files.push(format!("{root}/Show.S01/Show.S01.nfo"));
    Torrent::new(hash, files)
        .with_name("Show.S01")
        .with_save_path(root)
        .with_label("tv")
}
