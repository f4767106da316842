use crate::{
    PublishArgs,
    config::SiteConfig,
    publish::{InvalidationReport, Publisher},
};

pub async fn run(args: &PublishArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;
    publish_site(&config).await
}

/// Mirror the existing output directory and invalidate the CDN.
pub(crate) async fn publish_site(config: &SiteConfig) -> Result<(), anyhow::Error> {
    let target = config.publish_target()?;
    if let Some(prefix) = &target.prefix
        && config.site.base_path.is_none()
    {
        tracing::warn!(
            prefix = %prefix,
            "publishing under a key prefix without 'site.base_path'; site links assume the domain root"
        );
    }
    let publisher = Publisher::from_target(&target)?;

    println!("Publishing {} to {}", config.paths.output.display(), target.bucket);
    let report = publisher.publish(&config.paths.output).await?;

    println!(
        "Uploaded {}, deleted {}, unchanged {}",
        report.sync.uploaded.len(),
        report.sync.deleted.len(),
        report.sync.unchanged
    );
    match report.invalidation {
        InvalidationReport::Requested {
            distribution_id,
            invalidation_id: Some(id),
        } => println!("Requested invalidation {id} on distribution {distribution_id}"),
        InvalidationReport::Requested {
            distribution_id, ..
        } => println!("Requested invalidation on distribution {distribution_id}"),
        InvalidationReport::Skipped => println!("Skipped CDN invalidation (no distribution_id)"),
    }

    Ok(())
}
