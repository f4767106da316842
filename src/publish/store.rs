//! Mirror sync to an object store (S3, or a local directory for `file://`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectMeta, ObjectStore, PutOptions, PutPayload};
use walkdir::WalkDir;

use super::{PublishError, SiteMirror, SyncReport};
use crate::build::paths::relative_key;
use crate::config::PublishTarget;

/// A file in the local output directory.
#[derive(Debug, Clone)]
pub struct LocalFile {
    /// `/`-separated path relative to the output directory
    pub key: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// An object under the bucket prefix.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// Key with the bucket prefix removed
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// What a sync will do, by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub upload: Vec<String>,
    pub delete: Vec<String>,
    pub unchanged: Vec<String>,
}

/// Compare the local and remote file sets.
///
/// A local file is uploaded when the remote copy is missing, has a different
/// size, or is older than the local file. Remote objects without a local
/// counterpart are deleted. All lists come out sorted.
pub fn plan_sync(local: &[LocalFile], remote: &[RemoteObject]) -> SyncPlan {
    let remote_by_key: HashMap<&str, &RemoteObject> =
        remote.iter().map(|r| (r.key.as_str(), r)).collect();

    let mut plan = SyncPlan::default();
    for file in local {
        match remote_by_key.get(file.key.as_str()) {
            Some(object) if object.size == file.size && object.last_modified >= file.modified => {
                plan.unchanged.push(file.key.clone());
            }
            _ => plan.upload.push(file.key.clone()),
        }
    }

    let local_keys: std::collections::HashSet<&str> =
        local.iter().map(|f| f.key.as_str()).collect();
    plan.delete = remote
        .iter()
        .filter(|r| !local_keys.contains(r.key.as_str()))
        .map(|r| r.key.clone())
        .collect();

    plan.upload.sort();
    plan.delete.sort();
    plan.unchanged.sort();
    plan
}

/// [`SiteMirror`] backed by any `object_store` implementation.
pub struct ObjectStoreMirror {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
    /// Send `Content-Type` with uploads (the local store rejects attributes)
    content_types: bool,
}

impl ObjectStoreMirror {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>) -> Self {
        Self {
            store,
            prefix,
            content_types: true,
        }
    }

    pub fn with_content_types(mut self, content_types: bool) -> Self {
        self.content_types = content_types;
        self
    }

    /// Build the store for a publish target.
    ///
    /// `file:///dir` buckets mirror into a local directory. Anything else is
    /// an S3 bucket name (an `s3://` scheme is accepted), with credentials
    /// taken from the standard `AWS_*` environment.
    pub fn from_target(target: &PublishTarget) -> Result<Self, PublishError> {
        if let Some(dir) = target.bucket.strip_prefix("file://") {
            std::fs::create_dir_all(dir).map_err(|source| PublishError::Io {
                path: PathBuf::from(dir),
                source,
            })?;
            let store = LocalFileSystem::new_with_prefix(dir)?;
            return Ok(Self::new(Arc::new(store), target.prefix.clone()).with_content_types(false));
        }

        let bucket = target.bucket.strip_prefix("s3://").unwrap_or(&target.bucket);
        let bucket = bucket.trim_end_matches('/');

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&target.region);
        if let Some(endpoint) = &target.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        tracing::debug!(bucket, region = %target.region, "using S3 bucket");
        Ok(Self::new(Arc::new(builder.build()?), target.prefix.clone()))
    }

    fn location(&self, key: &str) -> ObjectPath {
        match &self.prefix {
            Some(prefix) => ObjectPath::from(format!("{prefix}/{key}")),
            None => ObjectPath::from(key),
        }
    }

    async fn list_remote(&self) -> Result<Vec<RemoteObject>, PublishError> {
        let prefix = self.prefix.as_deref().map(ObjectPath::from);
        let objects: Vec<ObjectMeta> = self.store.list(prefix.as_ref()).try_collect().await?;

        Ok(objects
            .into_iter()
            .map(|meta| {
                let location = meta.location.as_ref();
                let key = match &self.prefix {
                    Some(prefix) => location
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix('/'))
                        .unwrap_or(location),
                    None => location,
                };
                RemoteObject {
                    key: key.to_string(),
                    size: meta.size as u64,
                    last_modified: meta.last_modified,
                }
            })
            .collect())
    }

    async fn upload(&self, file: &LocalFile) -> Result<(), String> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| e.to_string())?;

        let mut attributes = Attributes::new();
        if self.content_types {
            let mime = mime_guess::from_path(&file.path).first_or_octet_stream();
            attributes.insert(Attribute::ContentType, mime.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        self.store
            .put_opts(&self.location(&file.key), PutPayload::from(bytes), options)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SiteMirror for ObjectStoreMirror {
    async fn mirror(&self, local_dir: &Path) -> Result<SyncReport, PublishError> {
        let local = collect_local_files(local_dir)?;
        let remote = self.list_remote().await?;
        let plan = plan_sync(&local, &remote);
        tracing::info!(
            upload = plan.upload.len(),
            delete = plan.delete.len(),
            unchanged = plan.unchanged.len(),
            "sync plan"
        );

        let local_by_key: HashMap<&str, &LocalFile> =
            local.iter().map(|f| (f.key.as_str(), f)).collect();

        let mut report = SyncReport {
            unchanged: plan.unchanged.len(),
            ..Default::default()
        };
        let mut failed = Vec::new();

        // Uploads first, so a page never disappears before its replacement lands
        for key in plan.upload {
            let Some(file) = local_by_key.get(key.as_str()) else {
                continue;
            };
            match self.upload(file).await {
                Ok(()) => {
                    tracing::debug!(key = %key, "uploaded");
                    report.uploaded.push(key);
                }
                Err(e) => {
                    tracing::warn!(key = %key, "upload failed: {e}");
                    failed.push(format!("{key}: {e}"));
                }
            }
        }

        for key in plan.delete {
            match self.store.delete(&self.location(&key)).await {
                Ok(()) => {
                    tracing::debug!(key = %key, "deleted");
                    report.deleted.push(key);
                }
                Err(e) => {
                    tracing::warn!(key = %key, "delete failed: {e}");
                    failed.push(format!("{key}: {e}"));
                }
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(PublishError::PartialSync { report, failed })
        }
    }
}

/// Every file below `dir`, keyed by its `/`-separated relative path.
fn collect_local_files(dir: &Path) -> Result<Vec<LocalFile>, PublishError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| PublishError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = entry.metadata().map_err(|source| PublishError::Walk {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| PublishError::Io {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());

        files.push(LocalFile {
            key: relative_key(relative),
            path: entry.path().to_path_buf(),
            size: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
        });
    }
    Ok(files)
}
