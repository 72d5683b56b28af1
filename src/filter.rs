//! Ready-made predicates for [`Options::predicate`](crate::Options::predicate).

use std::ffi::OsStr;
use std::path::Path;

/// Accepts every file.
pub fn any() -> impl Fn(&Path) -> bool {
    |_| true
}

/// Accepts files whose extension is `ext` (case-sensitive, leading dot optional).
/// An empty `ext` accepts files without an extension.
pub fn extension(ext: &str) -> impl Fn(&Path) -> bool + use<> {
    let ext = ext.trim_start_matches('.').to_string();
    move |path| matches_extension(path, &ext)
}

/// Accepts files whose extension is any of `exts`.
pub fn extensions(exts: &[&str]) -> impl Fn(&Path) -> bool + use<> {
    let exts: Vec<String> = exts
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .collect();
    move |path| exts.iter().any(|ext| matches_extension(path, ext))
}

fn matches_extension(path: &Path, ext: &str) -> bool {
    match path.extension() {
        Some(found) => found == OsStr::new(ext),
        None => ext.is_empty(),
    }
}
