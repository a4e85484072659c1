//! Destination boundary checks for extracted entries.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path.
///
/// `.` components are dropped and `..` removes the previous component.
/// `..` at the filesystem root stays at the root. The filesystem is never
/// consulted, so symlinks are not resolved.
pub fn clean(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                let last = result.components().next_back();
                if matches!(last, Some(Component::Normal(_))) {
                    result.pop();
                } else if !matches!(last, Some(Component::RootDir | Component::Prefix(_))) {
                    result.push("..");
                }
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }

    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

/// Absolute, cleaned form of an extraction directory.
pub fn destination_root(dest: &Path) -> io::Result<PathBuf> {
    let absolute = if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        std::env::current_dir()?.join(dest)
    };
    Ok(clean(&absolute))
}

/// Join an entry name onto `root` and clean the result.
///
/// Returns `Err` with the offending cleaned path if it escapes `root`.
/// `root` must already be the output of [`destination_root`]. The check is
/// component-wise, so `/out-evil` is not considered inside `/out`.
///
/// An absolute entry name such as `/etc/x.txt` replaces `root` when joined,
/// so it is rejected rather than re-rooted under the destination.
pub fn resolve_within(root: &Path, entry_name: &str) -> Result<PathBuf, PathBuf> {
    let candidate = clean(&root.join(entry_name));
    if candidate.starts_with(root) {
        Ok(candidate)
    } else {
        Err(candidate)
    }
}
