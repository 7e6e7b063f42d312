use crate::error::{Result, SnapshotError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An ancillary file under the source root that is mirrored into the snapshot
/// as-is (images, fonts, downloads - anything the bundle step does not own).
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
}

impl ResourceFile {
    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

/// Directory-walk collaborator enumerating ancillary resources.
///
/// Files whose kind is in the restricted set are never mirrored: they are
/// source code, configuration, or stylesheet/script inputs already handled by
/// the bundle step. The output tree itself is excluded so an output directory
/// nested under the source root never feeds back into the walk.
pub struct ResourceWalker {
    restricted: Vec<String>,
    excluded_roots: Vec<PathBuf>,
}

impl ResourceWalker {
    pub fn new(restricted: Vec<String>) -> Self {
        Self {
            restricted: restricted.into_iter().map(|e| e.to_lowercase()).collect(),
            excluded_roots: Vec::new(),
        }
    }

    pub fn with_excluded_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.excluded_roots.push(root.into());
        self
    }

    pub fn walk(&self, root: &Path) -> Result<Vec<ResourceFile>> {
        if !root.is_dir() {
            return Err(SnapshotError::InvalidPath {
                path: format!("{} is not a directory", root.display()),
            });
        }

        // Exclusion compares canonical paths: the walk root and the excluded
        // roots may be spelled relative or non-normalized (`.`, `..`) and
        // must still line up.
        let canonical_root =
            root.canonicalize()
                .map_err(|_| SnapshotError::InvalidPath {
                    path: root.display().to_string(),
                })?;
        let excluded: Vec<PathBuf> = self
            .excluded_roots
            .iter()
            .filter_map(|p| p.canonicalize().ok())
            .collect();

        let mut resources = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_excluded(&canonical_root, root, e.path(), &excluded));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                // Unreadable subtrees are skipped, not fatal; the export
                // mirrors whatever it can reach.
                Err(_) => continue,
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.is_restricted(path) {
                continue;
            }

            let relative_path = path
                .strip_prefix(root)
                .map_err(|_| SnapshotError::InvalidPath {
                    path: path.display().to_string(),
                })?
                .to_path_buf();

            resources.push(ResourceFile {
                source_path: path.to_path_buf(),
                relative_path,
            });
        }

        resources.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(resources)
    }

    fn is_restricted(&self, path: &Path) -> bool {
        self.restricted.contains(&file_kind(path))
    }
}

/// An entry is excluded when its canonical form falls under any canonical
/// excluded root. The entry path is re-anchored onto the canonical walk root
/// rather than hitting the filesystem again per entry.
fn is_excluded(canonical_root: &Path, root: &Path, path: &Path, excluded: &[PathBuf]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let canonical = canonical_root.join(relative);
    excluded.iter().any(|ex| canonical.starts_with(ex))
}

/// Classification key for the restricted-extension check. Dotfiles such as
/// `.htaccess` and `.gitignore` have no extension in the `Path` sense but are
/// classified by their name after the dot, matching how the restricted set
/// names them.
fn file_kind(path: &Path) -> String {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        return ext.to_lowercase();
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix('.'))
        .unwrap_or("")
        .to_lowercase()
}
