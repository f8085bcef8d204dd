pub mod torrent;

pub use torrent::Torrent;
