use crate::{
    BuildArgs,
    build::{BuildResult, Builder},
    config::SiteConfig,
};

pub async fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;
    build_site(config).await?;
    Ok(())
}

/// Run the (blocking) build off the async runtime and print a summary.
pub(crate) async fn build_site(config: SiteConfig) -> Result<BuildResult, anyhow::Error> {
    let result = tokio::task::spawn_blocking(move || Builder::new(config).build()).await??;

    println!(
        "Built site to {} ({} pages, {} static files)",
        result.output_dir.display(),
        result.pages,
        result.static_files
    );
    if !result.skipped.is_empty() {
        println!("Skipped {} file(s):", result.skipped.len());
        for issue in &result.skipped {
            println!("  - {}", issue.reason);
        }
    }

    Ok(result)
}
