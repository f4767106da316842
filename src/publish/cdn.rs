//! CloudFront invalidation through the `aws` CLI.

use async_trait::async_trait;
use tokio::process::Command;

use super::{CacheInvalidator, InvalidationReport, PublishError};

const AWS_CLI: &str = "aws";

pub struct CloudFrontInvalidator {
    distribution_id: Option<String>,
    profile: Option<String>,
    program: String,
}

impl CloudFrontInvalidator {
    pub fn new(distribution_id: Option<String>, profile: Option<String>) -> Self {
        Self {
            distribution_id: distribution_id.filter(|id| !id.trim().is_empty()),
            profile,
            program: AWS_CLI.to_string(),
        }
    }

    /// Use a different executable than `aws`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, distribution_id: &str) -> Vec<String> {
        let mut args = vec![
            "cloudfront".to_string(),
            "create-invalidation".to_string(),
            "--distribution-id".to_string(),
            distribution_id.to_string(),
            "--paths".to_string(),
            "/*".to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }
}

#[async_trait]
impl CacheInvalidator for CloudFrontInvalidator {
    async fn invalidate_all(&self) -> Result<InvalidationReport, PublishError> {
        let Some(distribution_id) = &self.distribution_id else {
            tracing::warn!("no publish.distribution_id configured, skipping CDN invalidation");
            return Ok(InvalidationReport::Skipped);
        };

        let program = which::which(&self.program).map_err(|e| {
            PublishError::Invalidation(format!("`{}` not found on PATH: {e}", self.program))
        })?;

        tracing::debug!(distribution_id = %distribution_id, "requesting invalidation");
        let output = Command::new(program)
            .args(self.args(distribution_id))
            .output()
            .await
            .map_err(|e| {
                PublishError::Invalidation(format!("failed to run `{}`: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PublishError::Invalidation(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(InvalidationReport::Requested {
            distribution_id: distribution_id.clone(),
            invalidation_id: invalidation_id(&output.stdout),
        })
    }
}

/// `Invalidation.Id` from the CLI's JSON response.
fn invalidation_id(stdout: &[u8]) -> Option<String> {
    let response: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    response["Invalidation"]["Id"].as_str().map(str::to_string)
}
