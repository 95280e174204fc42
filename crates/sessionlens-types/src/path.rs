use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Normalize a path for comparison (resolve to absolute, canonicalize if
/// possible).
///
/// Canonicalization keeps symlinked representations comparable, e.g.
/// `/var/...` and `/private/var/...` on macOS. Paths that do not exist are
/// kept as-is (made absolute against the current directory if needed).
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

/// Check if two paths are equivalent after normalization
pub fn paths_equal(path1: &Path, path2: &Path) -> bool {
    let a = normalize_path(path1);
    let b = normalize_path(path2);
    a.components().count() == b.components().count()
        && a.components()
            .zip(b.components())
            .all(|(x, y)| component_eq(x.as_os_str(), y.as_os_str()))
}

/// Check whether `candidate` equals `root` or lives underneath it.
///
/// Comparison is component-wise so `/home/user/proj2` is not treated as a
/// descendant of `/home/user/proj`. Case-insensitive only on hosts whose
/// filesystems are case-insensitive by default.
pub fn path_contains(root: &Path, candidate: &Path) -> bool {
    let root = normalize_path(root);
    let candidate = normalize_path(candidate);

    let root_components: Vec<&OsStr> = root.components().map(|c| c.as_os_str()).collect();
    let candidate_components: Vec<&OsStr> =
        candidate.components().map(|c| c.as_os_str()).collect();

    if root_components.len() > candidate_components.len() {
        return false;
    }

    root_components
        .iter()
        .zip(candidate_components.iter())
        .all(|(a, b)| component_eq(a, b))
}

fn component_eq(a: &OsStr, b: &OsStr) -> bool {
    if cfg!(any(windows, target_os = "macos")) {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    } else {
        a == b
    }
}
