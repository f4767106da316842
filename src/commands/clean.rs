use crate::{CleanArgs, build::OutputWriter, config::SiteConfig};

/// Directory holding blogsmith's own state (the site fingerprint).
const STATE_DIR: &str = ".blogsmith";

pub async fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;

    // Delete the generated site folder
    clean_output(&config, args.dry_run)?;

    // Delete the stored fingerprint
    let state_path = config.base_path.join(STATE_DIR);
    if state_path.exists() {
        if args.dry_run {
            println!("Would delete {}", state_path.display());
        } else {
            tokio::fs::remove_dir_all(&state_path).await?;
            println!("Deleted {}", state_path.display());
        }
    }

    Ok(())
}

pub(crate) fn clean_output(config: &SiteConfig, dry_run: bool) -> Result<(), anyhow::Error> {
    let writer = OutputWriter::new(&config.paths.output);
    if !writer.root().exists() {
        return Ok(());
    }

    if dry_run {
        println!("Would delete {}", writer.root().display());
    } else {
        writer.clean()?;
        println!("Deleted {}", writer.root().display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;

    fn config(dir: &std::path::Path) -> SiteConfig {
        let mut file = ConfigFile::default();
        file.paths.content = Some("content/posts".into());
        file.paths.output = Some("dist".into());
        SiteConfig::from_file(file, &dir.join("blogsmith.yaml")).unwrap()
    }

    #[test]
    fn test_clean_output_removes_only_output() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();
        std::fs::write(dir.path().join("content/posts/a.md"), "a").unwrap();
        std::fs::create_dir_all(dir.path().join("dist/posts")).unwrap();
        std::fs::write(dir.path().join("dist/posts/a.html"), "a").unwrap();

        clean_output(&config(dir.path()), false).unwrap();

        assert!(!dir.path().join("dist").exists());
        assert!(dir.path().join("content/posts/a.md").is_file());
    }

    #[test]
    fn test_clean_output_dry_run_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("dist")).unwrap();
        std::fs::write(dir.path().join("dist/index.html"), "x").unwrap();

        clean_output(&config(dir.path()), true).unwrap();

        assert!(dir.path().join("dist/index.html").is_file());
    }

    #[test]
    fn test_clean_output_without_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        clean_output(&config(dir.path()), false).unwrap();
        assert!(!dir.path().join("dist").exists());
    }
}
