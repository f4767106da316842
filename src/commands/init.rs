use crate::{
    InitArgs,
    config::{ConfigFile, DEFAULT_CONFIG_FILE, SiteInfo},
};

const FIRST_POST: &str = "---
title: Hello World
subtitle: The first post of a new blog.
---

# Hi

This is your first post. Edit it in `content/posts/hello-world.md`, or run
`blogsmith edit` and open the editor in your browser.
";

pub async fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            tokio::fs::create_dir_all(&path).await?;
            println!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_path = path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_path.display()
        ));
    }

    println!("Initializing blog in {}", path.display());

    let mut default_config = ConfigFile {
        site: SiteInfo {
            title: "My Blog".into(),
            url: Some("https://my-blog.example.com".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    default_config.paths.content = Some("content/posts".into());
    default_config.paths.output = Some("dist".into());

    let config_text = serde_yaml::to_string(&default_config)?;
    tokio::fs::write(&config_path, config_text).await?;
    println!(
        "Created config file {config_file}",
        config_file = config_path.display()
    );

    let posts_dir = path.join("content/posts");
    tokio::fs::create_dir_all(&posts_dir).await?;
    tokio::fs::create_dir_all(path.join("content/images")).await?;

    let first_post = posts_dir.join("hello-world.md");
    if !first_post.exists() {
        tokio::fs::write(&first_post, FIRST_POST).await?;
        println!("Created post {}", first_post.display());
    }

    Ok(())
}
