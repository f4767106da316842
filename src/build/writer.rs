//! Writing the generated site to the output directory.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// A rendered HTML page and where it goes, relative to the output root.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub path: PathBuf,
    pub html: String,
}

/// Owns the output directory. Nothing else writes there.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Empty the output directory, creating it if needed.
    ///
    /// Every build starts here, so files for deleted or renamed posts never
    /// survive into the next build.
    pub fn reset(&self) -> Result<(), WriteError> {
        self.clean()?;
        std::fs::create_dir_all(&self.root).map_err(|source| self.io_error(&self.root, source))
    }

    /// Remove the output directory. Returns whether there was anything to remove.
    pub fn clean(&self) -> Result<bool, WriteError> {
        if !self.root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.root).map_err(|source| self.io_error(&self.root, source))?;
        Ok(true)
    }

    pub fn write_page(&self, page: &RenderedPage) -> Result<PathBuf, WriteError> {
        self.write_file(&page.path, page.html.as_bytes())
    }

    /// Write `contents` to `relative` below the output root, creating parent
    /// directories. Returns the absolute path written.
    pub fn write_file(&self, relative: &Path, contents: &[u8]) -> Result<PathBuf, WriteError> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(parent, source))?;
        }
        std::fs::write(&path, contents).map_err(|source| self.io_error(&path, source))?;
        Ok(path)
    }

    /// Copy every non-hidden file below `src` into `dest` (relative to the
    /// output root), keeping the directory structure. A missing `src` copies
    /// nothing. Returns the number of files copied.
    pub fn copy_tree(&self, src: &Path, dest: &Path) -> Result<usize, WriteError> {
        if !src.is_dir() {
            return Ok(0);
        }

        let mut copied = 0;
        let walker = WalkDir::new(src)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|source| WriteError::Walk {
                path: src.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
            let target = self.root.join(dest).join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|source| self.io_error(parent, source))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|source| self.io_error(&target, source))?;
            copied += 1;
        }

        Ok(copied)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> WriteError {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}
