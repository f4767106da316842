//! Input fingerprint for skipping unchanged sites.
//!
//! A fingerprint maps every input file (posts, images, templates, static
//! files) to its blake3 digest, plus one digest of the resolved settings, so
//! environment overrides count as well as the config file. Two equal
//! fingerprints mean a rebuild and publish would change nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::paths::relative_key;
use crate::config::SiteConfig;

/// Location of the stored fingerprint, relative to the project directory.
pub const FINGERPRINT_FILE: &str = ".blogsmith/fingerprint.json";

#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("invalid fingerprint file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteFingerprint {
    /// Generator version; a new release always rebuilds
    version: String,
    files: BTreeMap<String, String>,
}

impl SiteFingerprint {
    /// Hash every input of the site described by `config`.
    pub fn compute(config: &SiteConfig) -> Result<Self, FingerprintError> {
        let mut files = BTreeMap::new();

        let settings = serde_json::to_vec(config).map_err(|source| FingerprintError::Json {
            path: config.config_path.clone(),
            source,
        })?;
        files.insert(
            "settings".to_string(),
            blake3::hash(&settings).to_hex().to_string(),
        );

        let mut trees = vec![
            ("content", config.paths.content.as_path()),
            ("images", config.paths.images.as_path()),
        ];
        if let Some(templates) = &config.paths.templates {
            trees.push(("templates", templates.as_path()));
        }
        if let Some(static_dir) = &config.paths.static_dir {
            trees.push(("static", static_dir.as_path()));
        }

        for (label, dir) in trees {
            hash_tree(label, dir, &mut files)?;
        }

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            files,
        })
    }

    /// Where the fingerprint of `config`'s project is stored.
    pub fn path(config: &SiteConfig) -> PathBuf {
        config.base_path.join(FINGERPRINT_FILE)
    }

    /// Read a stored fingerprint. `None` if none has been saved yet.
    pub fn load(path: &Path) -> Result<Option<Self>, FingerprintError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FingerprintError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| FingerprintError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> Result<(), FingerprintError> {
        let io_error = |source| FingerprintError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| FingerprintError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_error)
    }
}

fn hash_file(path: &Path) -> Result<String, FingerprintError> {
    let bytes = std::fs::read(path).map_err(|source| FingerprintError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

fn hash_tree(
    label: &str,
    dir: &Path,
    files: &mut BTreeMap<String, String>,
) -> Result<(), FingerprintError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
    });
    for entry in walker {
        let entry = entry.map_err(|source| FingerprintError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        files.insert(
            format!("{label}/{}", relative_key(relative)),
            hash_file(entry.path())?,
        );
    }

    Ok(())
}
