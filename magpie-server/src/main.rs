//! Magpied - the magpie review service binary
//!
//! Runs the webhook listener and review worker, or drives a single review
//! from the command line.

mod commands;
mod webhook;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use magpie_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::ReviewArgs;

/// Magpie: automated pull request review
#[derive(Parser, Debug)]
#[command(name = "magpied")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Address for the webhook listener (overrides config and env)
    #[arg(long, global = true, env = "MAGPIE_BIND_ADDR")]
    bind_addr: Option<String>,

    /// SQLite database path (overrides config and env)
    #[arg(long, global = true, env = "MAGPIE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Model to use for reviews (overrides config and env)
    #[arg(long, global = true, env = "MAGPIE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook listener and review worker
    Serve,

    /// Review one pull request immediately
    #[command(visible_alias = "r")]
    Review(ReviewArgs),

    /// Show current configuration
    Config,

    /// Create the secrets file template
    InitSecrets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config =
        Config::load_with_overrides(cli.bind_addr.clone(), cli.db_path.clone(), cli.model.clone())?;

    match cli.command {
        Some(Commands::Serve) | None => {
            commands::serve::run(config).await?;
        }
        Some(Commands::Review(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            println!("Magpie Configuration");
            println!("====================");
            println!();
            println!("Server:");
            println!("  bind_addr: {}", config.server.bind_addr);
            println!();
            println!("Database:");
            match config.database.resolve_path() {
                Ok(path) => println!("  path: {}", path.display()),
                Err(e) => println!("  path: (unresolved: {})", e),
            }
            println!();
            println!("Review:");
            println!("  max_diff_lines: {}", config.review.max_diff_lines);
            println!(
                "  trivial_change_lines: {}",
                config.review.trivial_change_lines
            );
            println!("  max_step_retries: {}", config.review.max_step_retries);
            println!();
            println!("Model:");
            println!("  name: {}", config.model.name);
            println!("  base_url: {}", config.model.base_url);
            println!("  max_tokens: {}", config.model.max_tokens);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        Some(Commands::InitSecrets) => {
            let path = Secrets::create_template()?;
            println!("Created secrets template at {}", path.display());
            println!("Edit it to add your GitHub token and Anthropic API key.");
        }
    }

    Ok(())
}
