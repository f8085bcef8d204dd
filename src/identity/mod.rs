//! Platform-independent file identity.
//!
//! Two paths with equal [`FileIdentity`] name the same storage object: they
//! are hardlinks of each other. Identity always comes from the OS, never
//! from comparing path strings.
//!
//! - **Unix**: `(st_dev, st_ino)` and `st_nlink` from a single `lstat(2)`
//! - **Windows**: `(dwVolumeSerialNumber, nFileIndexHigh:nFileIndexLow)` and
//!   `nNumberOfLinks` from `GetFileInformationByHandle`, opening reparse
//!   points themselves rather than their targets
//!
//! Symlinks are never followed on either family.

use crate::error::TidyResult;
use std::fmt;
use std::path::Path;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

/// Device/volume plus file serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIdentity {
    pub device: u64,
    pub serial: u64,
}

impl FileIdentity {
    pub const fn new(device: u64, serial: u64) -> Self {
        Self { device, serial }
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.device, self.serial)
    }
}

/// Identity together with the live hard-link count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfo {
    pub identity: FileIdentity,
    pub links: u64,
}

/// Resolves a path to its [`LinkInfo`] with one OS query.
///
/// A missing or unreadable path yields a transient error
/// ([`crate::error::TidyError::is_transient`]); callers skip the path.
pub fn resolve(path: impl AsRef<Path>) -> TidyResult<LinkInfo> {
    Ok(platform_link_info(path.as_ref())?)
}

#[cfg(unix)]
fn platform_link_info(path: &Path) -> std::io::Result<LinkInfo> {
    unix::link_info(path)
}

#[cfg(windows)]
fn platform_link_info(path: &Path) -> std::io::Result<LinkInfo> {
    windows::link_info(path)
}

#[cfg(not(any(unix, windows)))]
fn platform_link_info(_path: &Path) -> std::io::Result<LinkInfo> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "file identity is not available on this platform",
    ))
}

/// Seam between the hardlink index and the operating system.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> TidyResult<LinkInfo>;
}

/// Resolver backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsResolver;

impl IdentityResolver for OsResolver {
    fn resolve(&self, path: &Path) -> TidyResult<LinkInfo> {
        resolve(path)
    }
}
