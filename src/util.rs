//! Shared utility functions.

use std::path::{Component, Path, PathBuf};

/// Convert a slug to title case.
///
/// Splits on `-` and `_`, capitalizes each word.
/// "my-first-post" -> "My First Post"
/// "release_notes" -> "Release Notes"
pub fn title_case(s: &str) -> String {
    s.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a free-form title into a file-safe slug.
/// "Hello, World!" -> "hello-world"
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Whether `name` is usable as a single file name inside a managed directory:
/// non-empty, ASCII letters, digits, `.`, `-` or `_` only, and not hidden.
///
/// This rules out separators and `..`, so joining the name onto a directory
/// can never escape it.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Resolve `.` and `..` components without touching the filesystem.
/// "/blog/dist/.." -> "/blog"
///
/// A `..` above the root is dropped; a leading `..` in a relative path is
/// kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
