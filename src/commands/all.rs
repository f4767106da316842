use crate::{AllArgs, build::SiteFingerprint, config::SiteConfig};

use super::{build::build_site, clean::clean_output, publish::publish_site};

pub async fn run(args: &AllArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;

    // Publishing needs a target; fail before touching the output directory
    config.publish_target()?;

    let fingerprint_path = SiteFingerprint::path(&config);
    let fingerprint = SiteFingerprint::compute(&config)?;
    if args.skip_unchanged
        && SiteFingerprint::load(&fingerprint_path)?.as_ref() == Some(&fingerprint)
    {
        println!("Nothing changed since the last publish");
        return Ok(());
    }

    clean_output(&config, false)?;
    build_site(config.clone()).await?;
    publish_site(&config).await?;

    fingerprint.save(&fingerprint_path)?;
    tracing::debug!(path = %fingerprint_path.display(), "saved fingerprint");

    Ok(())
}
