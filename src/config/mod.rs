//! Configuration loading and types for blogsmith.
//!
//! This module handles all aspects of configuration:
//! - Type definitions mirroring the YAML file (`types`)
//! - Loading the file plus environment overrides (`load`)
//! - Validation and path resolution into a [`SiteConfig`] (here)

mod load;
mod types;

use std::path::{Component, Path, PathBuf};

use serde::Serialize;

pub use types::{ConfigFile, EditorConfig, MarkdownConfig, PublishConfig, SiteInfo};

use crate::util::normalize_path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "blogsmith.yaml";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("invalid config: '{0}' is required")]
    MissingField(&'static str),

    #[error("invalid config: {0}")]
    Validation(String),

    #[error("invalid config: 'publish.bucket' is required to publish the site")]
    MissingPublishTarget,
}

// =============================================================================
// Resolved configuration
// =============================================================================

/// Paths from the config file, resolved against the config file's directory.
#[derive(Debug, Clone, Serialize)]
pub struct SitePaths {
    pub content: PathBuf,
    pub output: PathBuf,
    pub images: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub templates: Option<PathBuf>,
}

/// The configuration of one invocation. Built once, never mutated.
///
/// Serializes to the settings that affect the generated and published site.
#[derive(Debug, Clone, Serialize)]
pub struct SiteConfig {
    /// The file this configuration was read from
    pub config_path: PathBuf,
    /// Directory that relative paths are resolved against
    pub base_path: PathBuf,
    pub site: SiteInfo,
    pub paths: SitePaths,
    pub markdown: MarkdownConfig,
    pub publish: Option<PublishConfig>,
    #[serde(skip)]
    pub editor: EditorConfig,
}

/// A publish section with its required fields present.
#[derive(Debug, Clone)]
pub struct PublishTarget {
    pub bucket: String,
    pub prefix: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub distribution_id: Option<String>,
    pub profile: Option<String>,
}

impl SiteConfig {
    /// Validate a parsed config file and resolve its paths.
    pub fn from_file(file: ConfigFile, config_path: &Path) -> Result<Self, ConfigError> {
        let base_path = normalize_path(&base_path_from_config(config_path));

        let content = file
            .paths
            .content
            .ok_or(ConfigError::MissingField("paths.content"))?;
        let output = file
            .paths
            .output
            .ok_or(ConfigError::MissingField("paths.output"))?;

        if file.site.posts_per_page == 0 {
            return Err(ConfigError::Validation(
                "'site.posts_per_page' must be at least 1".to_string(),
            ));
        }

        let paths = SitePaths {
            content: resolve(&base_path, &content),
            output: resolve(&base_path, &output),
            images: resolve(&base_path, &file.paths.images),
            static_dir: file.paths.static_dir.map(|p| resolve(&base_path, &p)),
            templates: file.paths.templates.map(|p| resolve(&base_path, &p)),
        };

        validate_output_dir(&base_path, &paths)?;

        Ok(Self {
            config_path: config_path.to_path_buf(),
            base_path,
            site: file.site,
            paths,
            markdown: file.markdown,
            publish: file.publish,
            editor: file.editor,
        })
    }

    /// The publish section, required only when publishing.
    pub fn publish_target(&self) -> Result<PublishTarget, ConfigError> {
        let publish = self
            .publish
            .as_ref()
            .ok_or(ConfigError::MissingPublishTarget)?;
        let bucket = publish
            .bucket
            .as_ref()
            .filter(|b| !b.trim().is_empty())
            .ok_or(ConfigError::MissingPublishTarget)?;

        Ok(PublishTarget {
            bucket: bucket.clone(),
            prefix: publish
                .prefix
                .as_ref()
                .map(|p| p.trim_matches('/').to_string())
                .filter(|p| !p.is_empty()),
            region: publish.region.clone(),
            endpoint: publish.endpoint.clone(),
            distribution_id: publish.distribution_id.clone(),
            profile: publish.profile.clone(),
        })
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        normalize_path(&base_path.join(path))
    } else {
        normalize_path(path)
    }
}

/// The output directory is deleted on every build, so it must not hold the
/// project or any of its inputs.
fn validate_output_dir(base_path: &Path, paths: &SitePaths) -> Result<(), ConfigError> {
    let output = &paths.output;
    let escapes = output
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if escapes || output.as_os_str().is_empty() || base_path.starts_with(output) {
        return Err(ConfigError::Validation(format!(
            "'paths.output' ({}) must not be the project directory or one of its parents",
            output.display()
        )));
    }

    if paths.content.starts_with(output) {
        return Err(ConfigError::Validation(format!(
            "'paths.output' ({}) must not contain 'paths.content'",
            output.display()
        )));
    }

    // Read during every build, so nesting either way is a problem
    let copied = [
        ("paths.images", Some(&paths.images)),
        ("paths.static", paths.static_dir.as_ref()),
        ("paths.templates", paths.templates.as_ref()),
    ];
    for (key, dir) in copied {
        if let Some(dir) = dir
            && (dir.starts_with(output) || output.starts_with(dir))
        {
            return Err(ConfigError::Validation(format!(
                "'paths.output' ({}) must not overlap '{key}' ({})",
                output.display(),
                dir.display()
            )));
        }
    }

    Ok(())
}
