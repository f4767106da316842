//! Publishing the generated site.
//!
//! Two capabilities sit at the cloud boundary:
//! - [`SiteMirror`] makes the remote object set equal the local output
//!   directory, deletions included,
//! - [`CacheInvalidator`] asks the CDN to drop every cached path.
//!
//! [`Publisher`] runs them in that order and only invalidates after a
//! complete mirror.

mod cdn;
mod store;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::PublishTarget;

pub use cdn::CloudFrontInvalidator;
pub use store::ObjectStoreMirror;

// =============================================================================
// Errors and reports
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("output directory {0} does not exist; run `blogsmith build` first")]
    MissingOutput(PathBuf),

    #[error("object store error: {0}")]
    Store(#[from] object_store::Error),

    #[error(
        "mirror incomplete: {} operation(s) failed ({} uploaded, {} deleted): {}",
        .failed.len(),
        .report.uploaded.len(),
        .report.deleted.len(),
        .failed.join("; ")
    )]
    PartialSync {
        /// What did succeed
        report: SyncReport,
        /// `key: error` for every failed upload or delete
        failed: Vec<String>,
    },

    #[error("CDN invalidation failed: {0}")]
    Invalidation(String),

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
}

/// Outcome of a mirror sync. Keys are relative to the bucket prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationReport {
    Requested {
        distribution_id: String,
        /// Id assigned by the CDN, when it reported one
        invalidation_id: Option<String>,
    },
    /// No distribution configured
    Skipped,
}

#[derive(Debug, Clone)]
pub struct PublishReport {
    pub sync: SyncReport,
    pub invalidation: InvalidationReport,
}

// =============================================================================
// Capabilities
// =============================================================================

#[async_trait]
pub trait SiteMirror: Send + Sync {
    /// Make the remote object set equal the files below `local_dir`.
    async fn mirror(&self, local_dir: &Path) -> Result<SyncReport, PublishError>;
}

#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Invalidate every cached path (`/*`).
    async fn invalidate_all(&self) -> Result<InvalidationReport, PublishError>;
}

// =============================================================================
// Publisher
// =============================================================================

pub struct Publisher<M, C> {
    mirror: M,
    invalidator: C,
}

impl Publisher<ObjectStoreMirror, CloudFrontInvalidator> {
    /// Object store mirror plus CloudFront invalidation for `target`.
    pub fn from_target(target: &PublishTarget) -> Result<Self, PublishError> {
        Ok(Self::new(
            ObjectStoreMirror::from_target(target)?,
            CloudFrontInvalidator::new(target.distribution_id.clone(), target.profile.clone()),
        ))
    }
}

impl<M: SiteMirror, C: CacheInvalidator> Publisher<M, C> {
    pub fn new(mirror: M, invalidator: C) -> Self {
        Self {
            mirror,
            invalidator,
        }
    }

    /// Mirror `output_dir`, then invalidate the CDN.
    ///
    /// A failed mirror returns before invalidating. The local directory is
    /// only read, so a failed publish can be retried as is.
    pub async fn publish(&self, output_dir: &Path) -> Result<PublishReport, PublishError> {
        if !output_dir.is_dir() {
            return Err(PublishError::MissingOutput(output_dir.to_path_buf()));
        }

        let sync = self.mirror.mirror(output_dir).await?;
        tracing::info!(
            uploaded = sync.uploaded.len(),
            deleted = sync.deleted.len(),
            unchanged = sync.unchanged,
            "mirror complete"
        );

        let invalidation = self.invalidator.invalidate_all().await?;

        Ok(PublishReport { sync, invalidation })
    }
}
