use crate::error::TidyResult;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Filesystem side of an orphan scan: inspection right before a decision,
/// and the removal itself.
#[cfg_attr(test, mockall::automock)]
pub trait Remover: Send + Sync {
    /// Modification time, without following symlinks.
    fn modified(&self, path: &Path) -> TidyResult<SystemTime>;

    fn is_dir_empty(&self, path: &Path) -> TidyResult<bool>;

    fn remove_file(&self, path: &Path) -> TidyResult<()>;

    /// Removes an empty directory. Never recursive.
    fn remove_dir(&self, path: &Path) -> TidyResult<()>;
}

/// [`Remover`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRemover;

impl Remover for FsRemover {
    fn modified(&self, path: &Path) -> TidyResult<SystemTime> {
        Ok(fs::symlink_metadata(path)?.modified()?)
    }

    fn is_dir_empty(&self, path: &Path) -> TidyResult<bool> {
        Ok(fs::read_dir(path)?.next().is_none())
    }

    fn remove_file(&self, path: &Path) -> TidyResult<()> {
        Ok(fs::remove_file(path)?)
    }

    fn remove_dir(&self, path: &Path) -> TidyResult<()> {
        Ok(fs::remove_dir(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TidyError;
    use tempfile::TempDir;

    #[test]
    fn test_dir_emptiness() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        assert!(FsRemover.is_dir_empty(&sub).unwrap());
        fs::write(sub.join("a"), b"x").unwrap();
        assert!(!FsRemover.is_dir_empty(&sub).unwrap());
    }

    #[test]
    fn test_remove_dir_refuses_non_empty() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("a"), b"x").unwrap();

        assert!(FsRemover.remove_dir(&sub).is_err());
        assert!(sub.exists());
    }

    #[test]
    fn test_remove_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = FsRemover.remove_file(&dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, TidyError::NotFound(_)));
    }

    #[test]
    fn test_modified_is_recent_for_new_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a");
        fs::write(&file, b"x").unwrap();

        let age = SystemTime::now()
            .duration_since(FsRemover.modified(&file).unwrap())
            .unwrap_or_default();
        assert!(age.as_secs() < 60);
    }
}
