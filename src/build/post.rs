use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::paths::post_url;
use crate::util::{is_safe_file_name, title_case};

// =============================================================================
// Errors
// =============================================================================

/// A single post could not be turned into a [`Post`]. Reported per file; the
/// rest of the batch is unaffected.
#[derive(thiserror::Error, Debug)]
pub enum PostParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}: front matter opened with '---' but never closed")]
    Unterminated { path: PathBuf },

    #[error("{path}: invalid front matter: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{path}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { path: PathBuf, value: String },

    #[error("{path}: invalid slug '{slug}' (use letters, digits, '.', '-' or '_')")]
    InvalidSlug { path: PathBuf, slug: String },

    #[error("{path}: slug '{slug}' is already used by {first}")]
    DuplicateSlug {
        path: PathBuf,
        slug: String,
        first: PathBuf,
    },
}

impl PostParseError {
    /// The source file this error belongs to.
    pub fn path(&self) -> &Path {
        match self {
            PostParseError::Io { path, .. }
            | PostParseError::Unterminated { path }
            | PostParseError::Yaml { path, .. }
            | PostParseError::InvalidDate { path, .. }
            | PostParseError::InvalidSlug { path, .. }
            | PostParseError::DuplicateSlug { path, .. } => path,
        }
    }
}

// =============================================================================
// Front matter
// =============================================================================

/// Front matter metadata parsed from a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    /// Short description shown under the title and on the index
    #[serde(alias = "description")]
    pub subtitle: Option<String>,
    /// Publish date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Custom slug override
    pub slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Rendered but left out of the index
    #[serde(default)]
    pub unlisted: bool,
    /// Additional arbitrary metadata (available in templates as `post.extra.*`)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// The front matter block was opened with `---` but never closed.
#[derive(Debug, PartialEq, Eq)]
pub struct UnterminatedFrontMatter;

/// A post file split into its front matter block and markdown body.
#[derive(Debug, PartialEq, Eq)]
pub struct SplitContent<'a> {
    /// The YAML between the delimiters, if the file has a front matter block
    pub front_matter: Option<&'a str>,
    /// The markdown content without the front matter block
    pub body: &'a str,
}

/// Split a post into front matter and body.
///
/// Front matter is a YAML block whose first and last lines are exactly `---`:
///
/// ```markdown
/// ---
/// title: My Post
/// date: 2024-01-01
/// ---
///
/// # Content starts here
/// ```
///
/// A file that does not start with a `---` line has no front matter. A file
/// that opens a block but never closes it is an error: reading it as plain
/// markdown would publish the metadata as text.
pub fn split_front_matter(content: &str) -> Result<SplitContent<'_>, UnterminatedFrontMatter> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let (first_line, rest) = match content.split_once('\n') {
        Some((line, rest)) => (line, rest),
        None => (content, ""),
    };
    if first_line.trim_end() != "---" {
        return Ok(SplitContent {
            front_matter: None,
            body: content,
        });
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = rest[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Ok(SplitContent {
                front_matter: Some(yaml),
                body,
            });
        }
        offset += line.len();
    }

    Err(UnterminatedFrontMatter)
}

// =============================================================================
// Posts
// =============================================================================

/// One blog post, read from one markdown file.
#[derive(Debug, Clone)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub subtitle: Option<String>,
    pub tags: Vec<String>,
    pub unlisted: bool,
    /// Markdown body without the front matter block
    pub body: String,
    /// The file this post was read from
    pub source_path: PathBuf,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Post {
    /// Read and parse a post file. Missing dates fall back to the file's
    /// modification time.
    pub fn load(path: &Path) -> Result<Self, PostParseError> {
        let io_error = |source| PostParseError::Io {
            path: path.to_path_buf(),
            source,
        };

        let content = std::fs::read_to_string(path).map_err(io_error)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(io_error)?;
        let fallback_date = DateTime::<Utc>::from(modified).date_naive();

        Self::parse(path, &content, fallback_date)
    }

    /// Parse post content. Fields absent from the front matter are derived
    /// from the file name (`slug`, `title`) or `fallback_date`.
    pub fn parse(
        path: &Path,
        content: &str,
        fallback_date: NaiveDate,
    ) -> Result<Self, PostParseError> {
        let split = split_front_matter(content).map_err(|_| PostParseError::Unterminated {
            path: path.to_path_buf(),
        })?;

        let front_matter: FrontMatter = match split.front_matter {
            Some(yaml) if !yaml.trim().is_empty() => {
                serde_yaml::from_str(yaml).map_err(|source| PostParseError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            _ => FrontMatter::default(),
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let slug = front_matter
            .slug
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| stem.clone());
        if !is_safe_file_name(&slug) {
            return Err(PostParseError::InvalidSlug {
                path: path.to_path_buf(),
                slug,
            });
        }

        let title = front_matter
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title_case(&stem));

        let date = match front_matter.date {
            Some(value) => parse_date(&value).ok_or_else(|| PostParseError::InvalidDate {
                path: path.to_path_buf(),
                value,
            })?,
            None => fallback_date,
        };

        Ok(Self {
            slug,
            title,
            date,
            subtitle: front_matter.subtitle,
            tags: front_matter.tags,
            unlisted: front_matter.unlisted,
            body: split.body.to_string(),
            source_path: path.to_path_buf(),
            extra: front_matter.extra,
        })
    }

    /// The URL this post is served at.
    pub fn url(&self) -> String {
        post_url(&self.slug)
    }

    /// "January 01, 2024"
    pub fn date_readable(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }
}

/// Accept `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Newest first; equal dates fall back to slug order so the listing is stable.
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}
