//! Lexical path helpers shared by the resolvers.

use std::path::{Component, Path, PathBuf};

/// Report form of `path` below `base`, `/`-separated on every platform. A path outside `base`
/// keeps its own components minus any root.
pub fn rel_posix(base: &Path, path: &Path) -> String {
    let mut out = String::new();
    for component in path.strip_prefix(base).unwrap_or(path).components() {
        let part = match component {
            Component::Normal(part) => part.to_string_lossy(),
            Component::CurDir => ".".into(),
            Component::ParentDir => "..".into(),
            Component::RootDir | Component::Prefix(_) => continue,
        };
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

/// Fold `.` and `..` out of `path` by text alone.
///
/// Link targets are normalized before anything is checked on disk, so a target that does not
/// exist still gets a stable path for the report. Leading `..` segments of a relative path are
/// kept; `..` at a root is dropped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                None | Some(Component::ParentDir | Component::CurDir) => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// File name without its final extension.
pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Final component of a directory path.
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether the path ends in one of `extensions` (compared without the dot, ASCII case-insensitive).
pub fn has_extension(path: &str, extensions: &[String]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_folds_dot_segments() {
        assert_eq!(
            normalize_path(Path::new("/corpus/docs/./meta/../b.md")),
            PathBuf::from("/corpus/docs/b.md")
        );
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize_path(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn rel_posix_strips_root() {
        assert_eq!(
            rel_posix(Path::new("/corpus"), Path::new("/corpus/docs/meta/a.md")),
            "docs/meta/a.md"
        );
        assert_eq!(rel_posix(Path::new("/corpus"), Path::new("/elsewhere/a.md")), "elsewhere/a.md");
    }

    #[test]
    fn has_extension_ignores_case() {
        let exts = vec!["md".to_string(), "mdc".to_string()];
        assert!(has_extension("a/b.MD", &exts));
        assert!(has_extension("b.mdc", &exts));
        assert!(!has_extension("b", &exts));
        assert!(!has_extension("b.png", &exts));
    }
}
