use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod editor;
mod publish;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: BlogsmithCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the blog in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Parser)]
struct AllArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Do nothing if no input changed since the last successful run
    #[arg(short, long, default_value = "false")]
    skip_unchanged: bool,
}

#[derive(Parser)]
struct PublishArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct EditArgs {
    /// The address to bind to (overrides `editor.bind`)
    #[arg(short, long)]
    bind: Option<String>,

    /// The port to bind to (overrides `editor.port`)
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the editor in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum BlogsmithCommand {
    /// Initialize a new blog
    Init(InitArgs),

    /// Build the site into the output directory
    Build(BuildArgs),

    /// Delete the output directory
    Clean(CleanArgs),

    /// Clean, build and publish in one go
    All(AllArgs),

    /// Upload the built site and invalidate the CDN
    Publish(PublishArgs),

    /// Run the local post editor
    Edit(EditArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match args.command {
        BlogsmithCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
        BlogsmithCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        BlogsmithCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
        BlogsmithCommand::All(args) => {
            commands::all::run(&args).await?;
        }
        BlogsmithCommand::Publish(args) => {
            commands::publish::run(&args).await?;
        }
        BlogsmithCommand::Edit(args) => {
            commands::edit::run(&args).await?;
        }
    }

    Ok(())
}
