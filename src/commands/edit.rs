use crate::{
    EditArgs,
    config::SiteConfig,
    editor::{self, EditorState},
};

pub async fn run(args: &EditArgs) -> Result<(), anyhow::Error> {
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;

    let bind = args.bind.clone().unwrap_or(config.editor.bind.clone());
    let port = args.port.unwrap_or(config.editor.port);

    tokio::fs::create_dir_all(&config.paths.content).await?;
    tokio::fs::create_dir_all(&config.paths.images).await?;

    if !editor::is_loopback(&bind) {
        tracing::warn!(
            bind = %bind,
            "the editor has no authentication; anyone who can reach this address can edit posts"
        );
    }

    let app = editor::router(EditorState {
        posts_dir: config.paths.content.clone(),
        images_dir: config.paths.images.clone(),
    });

    let listener = tokio::net::TcpListener::bind((bind.as_str(), port)).await?;
    let url = format!("http://{}", listener.local_addr()?);

    println!(
        "\nEditing posts in {} at {url}",
        config.paths.content.display()
    );
    println!("Press Ctrl+C to stop\n");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        eprintln!("Failed to open browser: {}", e);
    }

    axum::serve(listener, app).await?;

    Ok(())
}
