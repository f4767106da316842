//! Output layout conventions.
//!
//! Every generated file has one output-relative path and one URL:
//! - post pages: `posts/<slug>.html`, served at `/posts/<slug>.html`
//! - index pages: `index.html` for page 1, `page<n>.html` after that
//! - content images: `images/<name>`

use std::path::{Path, PathBuf};

/// Directory (relative to the output root) holding post pages.
pub const POSTS_DIR: &str = "posts";

/// Directory (relative to the output root) holding content images.
pub const IMAGES_DIR: &str = "images";

/// Output-relative path of a post page.
pub fn post_output_path(slug: &str) -> PathBuf {
    Path::new(POSTS_DIR).join(format!("{slug}.html"))
}

/// URL of a post page.
pub fn post_url(slug: &str) -> String {
    format!("/{POSTS_DIR}/{slug}.html")
}

/// Output-relative path of an index page (1-based).
pub fn index_output_path(page: usize) -> PathBuf {
    if page <= 1 {
        PathBuf::from("index.html")
    } else {
        PathBuf::from(format!("page{page}.html"))
    }
}

/// URL of an index page (1-based).
pub fn index_url(page: usize) -> String {
    if page <= 1 {
        "/".to_string()
    } else {
        format!("/page{page}.html")
    }
}

/// Convert an output-relative file path to a `/`-separated object key.
/// "posts\\hello.html" -> "posts/hello.html"
pub fn relative_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_paths() {
        assert_eq!(
            post_output_path("hello-world"),
            PathBuf::from("posts/hello-world.html")
        );
        assert_eq!(post_url("hello-world"), "/posts/hello-world.html");
    }

    #[test]
    fn test_index_paths() {
        assert_eq!(index_output_path(1), PathBuf::from("index.html"));
        assert_eq!(index_output_path(2), PathBuf::from("page2.html"));
        assert_eq!(index_url(1), "/");
        assert_eq!(index_url(3), "/page3.html");
    }

    #[test]
    fn test_relative_key() {
        assert_eq!(
            relative_key(Path::new("posts/hello.html")),
            "posts/hello.html"
        );
        assert_eq!(relative_key(Path::new("index.html")), "index.html");
    }
}
