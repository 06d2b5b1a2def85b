//! File path utilities for document identity.
//!
//! Every document is keyed by a normalized absolute path, so the same file is
//! never loaded twice under different spellings (`./a/../b.json`,
//! `C:\specs\b.json` vs `c:/specs/b.json`).

use std::path::{Component, Path, PathBuf};

/// Normalizes a file path into its canonical document identity.
///
/// - relative paths are made absolute against the current directory
/// - `.` and `..` components are folded lexically (no filesystem access)
/// - `\` separators become `/`
/// - a leading Windows drive letter is lower-cased
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_path(Path::new("/a/./b/../c.json")), PathBuf::from("/a/c.json"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let unified = path.to_string_lossy().replace('\\', "/");
    let unified = lower_drive_letter(&unified);
    let path = Path::new(&unified);

    let absolute = if path.is_absolute() || has_drive_letter(&unified) {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    let joined: PathBuf = parts.iter().collect();
    PathBuf::from(joined.to_string_lossy().replace('\\', "/"))
}

/// Resolves `target` relative to the directory containing `base_file`.
///
/// Absolute targets are only normalized.
#[must_use]
pub fn resolve_relative(base_file: &Path, target: &str) -> PathBuf {
    let target_path = Path::new(target);
    if target_path.is_absolute() || has_drive_letter(target) {
        return normalize_path(target_path);
    }
    let dir = base_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&dir.join(target_path))
}

/// Whether a `$ref` file part points at a remote document.
#[must_use]
pub fn is_remote(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn lower_drive_letter(path: &str) -> String {
    if has_drive_letter(path) {
        let mut chars = path.chars();
        let drive = chars.next().map(|c| c.to_ascii_lowercase());
        drive.into_iter().chain(chars).collect()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/specs/./compute/../network/a.json")),
            PathBuf::from("/specs/network/a.json")
        );
    }

    #[test]
    fn test_normalize_unifies_separators() {
        assert_eq!(
            normalize_path(Path::new("/specs\\common\\types.json")),
            PathBuf::from("/specs/common/types.json")
        );
    }

    #[test]
    fn test_normalize_lowercases_drive_letter() {
        assert_eq!(lower_drive_letter("C:/specs/a.json"), "c:/specs/a.json");
        assert_eq!(lower_drive_letter("/specs/a.json"), "/specs/a.json");
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        assert!(normalize_path(Path::new("a.json")).is_absolute());
    }

    #[test]
    fn test_resolve_relative_to_file_directory() {
        assert_eq!(
            resolve_relative(Path::new("/specs/rp/stable/main.json"), "../../common/types.json"),
            PathBuf::from("/specs/common/types.json")
        );
        assert_eq!(
            resolve_relative(Path::new("/specs/main.json"), "/other/x.json"),
            PathBuf::from("/other/x.json")
        );
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/types.json"));
        assert!(!is_remote("./types.json"));
    }
}
