pub mod ignore;
pub mod index;
pub mod mapping;

pub use ignore::IgnoreList;
pub use index::SortedPathIndex;
pub use mapping::{PathMapEntry, PathMapping};
