//! Label and destination-key derivation.
//!
//! A label is the containing directory of a file relative to the traversal
//! root, always rendered with `/` separators. Destination keys are joined the
//! way object stores expect: `/`-separated, no empty or `.` segments.

use std::path::{Component, Path};

/// Returns `dir` relative to `root` as a `/`-separated string.
///
/// `dir == root` yields the empty label. A `dir` outside `root` is returned
/// unmodified (rendered with `/` separators).
pub fn label(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(relative) => render(relative),
        Err(_) => render(dir),
    }
}

fn render(path: &Path) -> String {
    let mut out = String::new();
    if path.has_root() {
        out.push('/');
    }
    let segments: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    out.push_str(&segments.join("/"));
    out
}

/// Joins `prefix`, `label` and `file_name` into an object key.
///
/// Empty and `.` segments are dropped and `..` pops the previous segment, so
/// `("out", "", "a.jpg")` becomes `out/a.jpg` and a leading `/` never survives.
pub fn destination_key(prefix: &str, label: &str, file_name: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in [prefix, label, file_name]
        .iter()
        .flat_map(|part| part.split('/'))
    {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Trims leading slashes from a configured prefix.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_start_matches('/').to_string()
}
