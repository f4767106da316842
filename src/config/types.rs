//! Configuration type definitions.
//!
//! These mirror the YAML layout of `blogsmith.yaml` one to one. Paths are kept
//! exactly as written; resolving them against the config directory happens in
//! [`super::SiteConfig`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// File layout
// =============================================================================

/// The configuration file as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteInfo,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishConfig>,
    #[serde(default)]
    pub editor: EditorConfig,
}

// =============================================================================
// Site metadata
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    #[serde(default = "default_title")]
    pub title: String,
    /// Public base URL, used for canonical links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Number of posts listed on each index page
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,
    /// URL path the site is served under (`/blog`); empty for the domain root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

fn default_title() -> String {
    "My Blog".to_string()
}

fn default_posts_per_page() -> usize {
    10
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: default_title(),
            url: None,
            description: None,
            author: None,
            posts_per_page: default_posts_per_page(),
            base_path: None,
        }
    }
}

// =============================================================================
// Paths
// =============================================================================

/// Filesystem locations. `content` and `output` are required; they are
/// optional here so that a missing key can be reported by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Images referenced by posts, copied to `<output>/images`
    #[serde(default = "default_images")]
    pub images: PathBuf,
    /// Static tree copied verbatim to the output root
    #[serde(
        rename = "static",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub static_dir: Option<PathBuf>,
    /// Custom template directory replacing the built-in theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<PathBuf>,
}

fn default_images() -> PathBuf {
    PathBuf::from("content/images")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: None,
            output: None,
            images: default_images(),
            static_dir: None,
            templates: None,
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,

    /// autumnus theme for `highlight.css`
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
}

fn default_highlight_theme() -> String {
    crate::build::DEFAULT_HIGHLIGHT_THEME.to_string()
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "footnotes".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
            highlight_theme: default_highlight_theme(),
        }
    }
}

// =============================================================================
// Publishing
// =============================================================================

/// Cloud target for `blogsmith publish` and `blogsmith all`.
///
/// ```yaml
/// publish:
///   bucket: my-blog-bucket        # or file:///srv/mirror for a local mirror
///   region: eu-west-1
///   distribution_id: E2QWRUHAPOMQZL
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Key prefix inside the bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// S3-compatible endpoint (MinIO, R2, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_id: Option<String>,
    /// Credential profile handed to the CDN client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            region: default_region(),
            endpoint: None,
            distribution_id: None,
            profile: None,
        }
    }
}

// =============================================================================
// Editor
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}
