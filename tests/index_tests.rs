mod common;

use common::fixtures::{cross_seed_scenario, incomplete_torrent, season_pack, torrent};
use common::test_helpers::DownloadTree;
use std::sync::Arc;
use torrent_tidy::{
    identity, HardlinkIndex, PathMapping, RegistryOptions, TorrentFileIndex, TorrentRegistry,
};

#[test]
fn test_cross_seed_scenario() {
    let torrents = cross_seed_scenario();
    let index = TorrentFileIndex::from_torrents(&torrents, 1_000);

    assert!(!index.is_unique(&torrents[0]));
    assert!(!index.is_unique(&torrents[1]));
    assert!(index.is_unique(&torrents[2]));
    assert_eq!(index.len(), 2);

    index.remove(&torrents[0]);
    assert!(index.is_unique(&torrents[1]));
    assert_eq!(index.len(), 2);
    assert_eq!(index.torrents_for("/d/a.mkv"), vec!["t2".to_string()]);
}

#[test]
fn test_add_remove_restores_state() {
    let base = cross_seed_scenario();
    let index = TorrentFileIndex::from_torrents(&base, 1_000);
    let none = PathMapping::empty();
    let lookups = ["/d", "/d/a.mkv", "/d/new", "/d/new/x.mkv", "/elsewhere"];
    let before: Vec<bool> = lookups.iter().map(|p| index.contains_path(p, &none)).collect();

    let extra = torrent("t9", &["/d/new/x.mkv", "/d/new/y.mkv"]);
    index.add(&extra);
    assert_eq!(index.len(), 4);
    assert!(index.contains_path("/d/new", &none));

    index.remove(&extra);
    let after: Vec<bool> = lookups.iter().map(|p| index.contains_path(p, &none)).collect();
    assert_eq!(index.len(), 2);
    assert_eq!(before, after);
}

#[test]
fn test_containment_with_mapping() {
    let index = TorrentFileIndex::from_torrents([&torrent("t1", &["/data/movies/X/file.mkv"])], 1_000);
    let mapping = PathMapping::from_pairs([("/data", "/mnt")]).unwrap();

    assert!(index.contains_path("/mnt/movies/X", &mapping));
    assert!(index.contains_path("/mnt/movies", &mapping));
    assert!(!index.contains_path("/mnt/movies/Y", &mapping));
}

#[test]
fn test_logically_equal_mappings_agree() {
    let index = TorrentFileIndex::from_torrents([&season_pack("s1", "/data/tv", 3)], 1_000);
    let forward = PathMapping::from_pairs([("/data", "/mnt"), ("/other", "/x")]).unwrap();
    let reversed = PathMapping::from_pairs([("/other", "/x"), ("/data", "/mnt")]).unwrap();

    assert_eq!(forward.cache_key(), reversed.cache_key());
    for lookup in ["/mnt/tv/Show.S01", "/mnt/tv/Show.S02", "/data/tv/Show.S01"] {
        assert_eq!(
            index.contains_path(lookup, &forward),
            index.contains_path(lookup, &reversed),
            "{lookup}"
        );
    }
}

#[test]
fn test_overlapping_mappings_first_declared_wins() {
    let nested_first =
        PathMapping::from_pairs([("/data/tv", "/series"), ("/data", "/mnt")]).unwrap();
    let broad_first =
        PathMapping::from_pairs([("/data", "/mnt"), ("/data/tv", "/series")]).unwrap();

    for _ in 0..3 {
        assert_eq!(nested_first.apply("/data/tv/a.mkv"), "/series/a.mkv");
        assert_eq!(broad_first.apply("/data/tv/a.mkv"), "/mnt/tv/a.mkv");
    }
    assert_ne!(nested_first.cache_key(), broad_first.cache_key());

    let index = TorrentFileIndex::from_torrents([&torrent("t1", &["/data/tv/a.mkv"])], 1_000);
    assert!(index.contains_path("/series/a.mkv", &nested_first));
    assert!(!index.contains_path("/series/a.mkv", &broad_first));
    assert!(index.contains_path("/mnt/tv/a.mkv", &broad_first));
}

#[test]
fn test_substring_false_positive_is_kept() {
    let index = TorrentFileIndex::from_torrents([&torrent("t1", &["/data/movie2/a.mkv"])], 1_000);
    assert!(index.contains_path("/data/movie", &PathMapping::empty()));
}

#[test]
fn test_hardlinked_paths_share_bucket() {
    let tree = DownloadTree::new();
    tree.file("movies/a.mkv", b"data");
    tree.hardlink("movies/a.mkv", "seed/a.mkv");
    let t1 = tree.torrent("t1", &["movies/a.mkv"]);
    let t2 = tree.torrent("t2", &["seed/a.mkv"]);

    let index = HardlinkIndex::from_torrents([&t1, &t2], PathMapping::empty(), identity::OsResolver);

    assert_eq!(index.len(), 1);
    assert!(!index.is_torrent_unique(&t1));
    assert!(!index.is_torrent_unique(&t2));
    assert!(!index.is_hardlinked_outside_client(&t1));

    let id = identity::resolve(tree.path("movies/a.mkv")).unwrap().identity;
    assert_eq!(index.paths_for(&id).len(), 2);
}

#[test]
fn test_outside_client_link_detected() {
    let tree = DownloadTree::new();
    tree.file("movies/a.mkv", b"data");
    tree.hardlink("movies/a.mkv", "seed/a.mkv");
    tree.hardlink("movies/a.mkv", "library/a.mkv");
    tree.file("movies/b.mkv", b"other");
    let t1 = tree.torrent("t1", &["movies/a.mkv"]);
    let t2 = tree.torrent("t2", &["seed/a.mkv"]);
    let t3 = tree.torrent("t3", &["movies/b.mkv"]);

    let index = HardlinkIndex::new(PathMapping::empty());
    for t in [&t1, &t2, &t3] {
        index.add_by_torrent(t);
    }

    // three links on disk, two known
    assert!(index.is_hardlinked_outside_client(&t1));
    assert!(index.is_hardlinked_outside_client(&t2));
    assert!(!index.is_hardlinked_outside_client(&t3));

    // once the library copy is gone the counts agree again
    std::fs::remove_file(tree.path("library/a.mkv")).unwrap();
    assert!(!index.is_hardlinked_outside_client(&t1));
}

#[test]
fn test_deleted_file_is_skipped() {
    let tree = DownloadTree::new();
    tree.file("movies/a.mkv", b"data");
    let t1 = tree.torrent("t1", &["movies/a.mkv", "movies/gone.mkv"]);

    let index = HardlinkIndex::new(PathMapping::empty());
    assert_eq!(index.add_by_torrent(&t1), 1);
    assert!(!index.is_hardlinked_outside_client(&t1));

    index.remove_by_torrent(&t1);
    assert!(index.is_empty());
}

#[test]
fn test_incomplete_torrents_are_vacuous() {
    let t = incomplete_torrent("t1", &["/nowhere/a.mkv"]);
    let index = HardlinkIndex::from_torrents([&t], PathMapping::empty(), identity::OsResolver);

    assert!(index.is_empty());
    assert!(index.is_torrent_unique(&t));
    assert!(index.has_no_instances(&t));
    assert!(!index.is_hardlinked_outside_client(&t));
}

#[tokio::test]
async fn test_registry_with_container_mapping() {
    let tree = DownloadTree::new();
    tree.file("movies/a.mkv", b"data");
    let host_root = tree.root().to_string_lossy().into_owned();

    // the client reports paths under /data
    let t1 = torrent("t1", &["/data/movies/a.mkv"]);
    let mapping = PathMapping::from_pairs([("/data", host_root.as_str())]).unwrap();
    let registry = TorrentRegistry::build(&[t1.clone()], mapping, RegistryOptions::default()).await;

    assert_eq!(registry.links().len(), 1);
    assert!(registry.contains_path(&tree.path_str("movies")));
    assert!(registry.contains_path(&tree.path_str("movies/a.mkv")));
    assert!(!registry.contains_path(&tree.path_str("tv")));

    let facts = registry.facts(&t1);
    assert!(facts.unique);
    assert!(facts.hardlink_unique);
    assert!(!facts.hardlinked_outside_client);
}

#[test]
fn test_concurrent_readers_and_writers() {
    let index = Arc::new(TorrentFileIndex::from_torrents(&cross_seed_scenario(), 10_000));
    let mapping = PathMapping::from_pairs([("/d", "/mnt")]).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let index = Arc::clone(&index);
            std::thread::spawn(move || {
                for i in 0..50 {
                    let t = torrent(&format!("w{w}-{i}"), &[&format!("/d/w{w}/{i}.mkv")]);
                    index.add(&t);
                    if i % 2 == 0 {
                        index.remove(&t);
                    }
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = Arc::clone(&index);
            let mapping = mapping.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    // always present regardless of writer progress
                    assert!(index.contains_path("/mnt/a.mkv", &mapping));
                    assert!(index.contains_path("/d/b.mkv", &PathMapping::empty()));
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(index.len(), 2 + 4 * 25);
    assert!(index.contains_path("/mnt/w0/1.mkv", &mapping));
    assert!(!index.contains_path("/mnt/w0/0.mkv", &mapping));
}
