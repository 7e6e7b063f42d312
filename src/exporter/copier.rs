use crate::error::{Result, SnapshotError};
use filetime::FileTime;
use std::fs;
use std::path::Path;

/// Modification-time drift (seconds) below which source and destination are
/// considered in sync. Absorbs clock and filesystem-granularity skew between
/// the two trees; this is not a sub-minute change detector.
const MTIME_TOLERANCE_SECS: i64 = 125;

/// What a copy decision resolved to, used for progress logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyAction {
    Creating,
    Updating,
}

impl std::fmt::Display for CopyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopyAction::Creating => write!(f, "Creating"),
            CopyAction::Updating => write!(f, "Updating"),
        }
    }
}

/// Copies files into the snapshot tree only when they actually changed.
///
/// A file is copied when the destination is missing, or when the absolute
/// difference between source and destination modification times exceeds the
/// tolerance. After a successful copy the source's timestamp is touched to
/// the copy time so later comparisons stay inside the tolerance even when the
/// two filesystems keep slightly different clocks.
#[derive(Debug, Default)]
pub struct ChangeAwareCopier;

impl ChangeAwareCopier {
    pub fn new() -> Self {
        Self
    }

    /// Copy `src` to `dst` if the destination is missing or stale. Returns
    /// the action taken, or `None` when the destination was already in sync.
    /// Missing destination directories are created first.
    pub fn copy_if_changed(&self, src: &Path, dst: &Path) -> Result<Option<CopyAction>> {
        let source_meta = fs::metadata(src).map_err(|_| SnapshotError::SourceMissing {
            path: src.to_path_buf(),
        })?;
        let source_ts = FileTime::from_last_modification_time(&source_meta);

        let action = match fs::metadata(dst) {
            Err(_) => Some(CopyAction::Creating),
            Ok(dest_meta) => {
                let dest_ts = FileTime::from_last_modification_time(&dest_meta);
                let drift = (source_ts.unix_seconds() - dest_ts.unix_seconds()).abs();
                if drift > MTIME_TOLERANCE_SECS {
                    Some(CopyAction::Updating)
                } else {
                    None
                }
            }
        };

        let Some(action) = action else {
            return Ok(None);
        };

        if let Some(parent) = dst.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| SnapshotError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        fs::copy(src, dst)?;

        // Keep later comparisons stable: align the source's mtime with the
        // freshly written destination.
        filetime::set_file_mtime(src, FileTime::now())?;

        Ok(Some(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, when: SystemTime) {
        filetime::set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
    }

    #[test]
    fn test_missing_destination_is_created() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("nested/dir/dst.txt");
        fs::write(&src, b"content").unwrap();

        let copier = ChangeAwareCopier::new();
        let action = copier.copy_if_changed(&src, &dst).unwrap();

        assert_eq!(action, Some(CopyAction::Creating));
        assert_eq!(fs::read(&dst).unwrap(), b"content");
    }

    #[test]
    fn test_large_drift_triggers_update() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        let now = SystemTime::now();
        set_mtime(&src, now);
        set_mtime(&dst, now - Duration::from_secs(200));

        let copier = ChangeAwareCopier::new();
        let action = copier.copy_if_changed(&src, &dst).unwrap();

        assert_eq!(action, Some(CopyAction::Updating));
        assert_eq!(fs::read(&dst).unwrap(), b"new");
    }

    #[test]
    fn test_small_drift_is_noop() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        let now = SystemTime::now();
        set_mtime(&src, now);
        set_mtime(&dst, now - Duration::from_secs(10));

        let copier = ChangeAwareCopier::new();
        let action = copier.copy_if_changed(&src, &dst).unwrap();

        assert_eq!(action, None);
        // Destination content untouched.
        assert_eq!(fs::read(&dst).unwrap(), b"old");
    }

    #[test]
    fn test_source_touch_prevents_repeat_updates() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        fs::write(&src, b"v1").unwrap();
        set_mtime(&src, SystemTime::now() - Duration::from_secs(600));

        let copier = ChangeAwareCopier::new();
        assert_eq!(
            copier.copy_if_changed(&src, &dst).unwrap(),
            Some(CopyAction::Creating)
        );
        // Second pass sees aligned timestamps and does nothing.
        assert_eq!(copier.copy_if_changed(&src, &dst).unwrap(), None);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let temp = TempDir::new().unwrap();
        let copier = ChangeAwareCopier::new();
        let result =
            copier.copy_if_changed(&temp.path().join("absent.txt"), &temp.path().join("dst.txt"));
        assert!(matches!(result, Err(SnapshotError::SourceMissing { .. })));
    }
}
