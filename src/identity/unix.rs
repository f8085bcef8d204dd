use super::{FileIdentity, LinkInfo};
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// One `lstat`-class query; symlinks report their own inode.
pub(super) fn link_info(path: &Path) -> io::Result<LinkInfo> {
    let meta = std::fs::symlink_metadata(path)?;
    Ok(LinkInfo {
        identity: FileIdentity {
            device: meta.dev(),
            serial: meta.ino(),
        },
        links: meta.nlink(),
    })
}
