use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::post::{Post, PostParseError};

// =============================================================================
// Errors
// =============================================================================

/// The content directory itself could not be listed. Unlike
/// [`PostParseError`] this is fatal for the whole run.
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("content path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("content path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },
}

// =============================================================================
// Post source
// =============================================================================

/// The directory of markdown posts.
#[derive(Debug, Clone)]
pub struct PostSource {
    dir: PathBuf,
}

impl PostSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All post files in the directory, sorted by file name.
    ///
    /// Only `*.md` and `*.markdown` files directly inside the directory count;
    /// hidden files and subdirectories are ignored.
    pub fn post_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.dir.exists() {
            return Err(SourceError::PathNotFound(self.dir.clone()));
        }
        if !self.dir.is_dir() {
            return Err(SourceError::NotADirectory(self.dir.clone()));
        }

        let entries = std::fs::read_dir(&self.dir).map_err(|e| SourceError::ReadDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SourceError::ReadEntry {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() && is_post_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Iterate over the posts in this directory.
    ///
    /// Files are read lazily, one per `next()`. Each call starts a fresh pass
    /// over the directory. A file that fails to parse yields an error for that
    /// file only; iteration continues with the next one.
    pub fn posts(&self) -> Result<Posts, SourceError> {
        Ok(Posts {
            files: self.post_files()?.into_iter(),
            seen: HashMap::new(),
        })
    }
}

/// Whether `path` names a post: a visible `*.md` or `*.markdown` file, with
/// the extension matched case-insensitively.
pub fn is_post_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|n| n.starts_with('.'));
    let markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
    !hidden && markdown
}

/// Lazy sequence of posts produced by [`PostSource::posts`].
pub struct Posts {
    files: std::vec::IntoIter<PathBuf>,
    /// slug -> the file that claimed it first
    seen: HashMap<String, PathBuf>,
}

impl Iterator for Posts {
    type Item = Result<Post, PostParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;

        let post = match Post::load(&path) {
            Ok(post) => post,
            Err(e) => return Some(Err(e)),
        };

        if let Some(first) = self.seen.get(&post.slug) {
            return Some(Err(PostParseError::DuplicateSlug {
                path,
                slug: post.slug,
                first: first.clone(),
            }));
        }
        self.seen.insert(post.slug.clone(), path);

        Some(Ok(post))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_only_markdown_files_are_posts() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.md", "b");
        write(dir.path(), "a.markdown", "a");
        write(dir.path(), "notes.txt", "not a post");
        write(dir.path(), ".draft.md", "hidden");
        std::fs::create_dir(dir.path().join("nested.md")).unwrap();

        let files = PostSource::new(dir.path()).post_files().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.markdown", "b.md"]);
    }

    #[test]
    fn test_bad_post_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a-good.md", "---\ntitle: Good\ndate: 2024-01-01\n---\nhi");
        write(dir.path(), "b-bad.md", "---\ntitle: [broken\n---\nhi");
        write(dir.path(), "c-good.md", "no front matter at all");

        let results: Vec<_> = PostSource::new(dir.path()).posts().unwrap().collect();
        assert_eq!(results.len(), 3);

        let ok: Vec<_> = results
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(ok, vec!["a-good", "c-good"]);

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path(), dir.path().join("b-bad.md"));
    }

    #[test]
    fn test_duplicate_slug_reported_on_later_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "first.md", "---\nslug: same\n---\none");
        write(dir.path(), "second.md", "---\nslug: same\n---\ntwo");

        let results: Vec<_> = PostSource::new(dir.path()).posts().unwrap().collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(PostParseError::DuplicateSlug { slug, first, .. }) => {
                assert_eq!(slug, "same");
                assert_eq!(first, &dir.path().join("first.md"));
            }
            other => panic!("expected duplicate slug error, got {other:?}"),
        }
    }

    #[test]
    fn test_posts_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "one.md", "1");
        write(dir.path(), "two.md", "2");

        let source = PostSource::new(dir.path());
        let first: Vec<_> = source.posts().unwrap().map(|p| p.unwrap().slug).collect();
        let second: Vec<_> = source.posts().unwrap().map(|p| p.unwrap().slug).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["one", "two"]);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = PostSource::new(dir.path().join("missing"))
            .posts()
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::PathNotFound(_)));
    }

    #[test]
    fn test_file_instead_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "file.md", "x");
        let err = PostSource::new(dir.path().join("file.md"))
            .post_files()
            .unwrap_err();
        assert!(matches!(err, SourceError::NotADirectory(_)));
    }
}
