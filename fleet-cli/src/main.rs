//! OpenFleet CLI - document review server and agent tools
//!
//! Runs the review server, hosts the review tools for an agent runtime, and
//! inspects stored reviews.

mod commands;

use clap::{Parser, Subcommand};
use fleet_core::Config;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{HostArgs, ReviewsArgs, ServeArgs, ToolArgs};

/// OpenFleet: human review of agent-written documents
#[derive(Parser, Debug)]
#[command(name = "openfleet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Preferred review server port (overrides config and env)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Root data directory (overrides config and env)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run the review server until interrupted
    #[command(visible_alias = "s")]
    Serve(ServeArgs),

    /// Run the review server and answer tool calls on stdin
    Host(HostArgs),

    /// Run a single review tool
    Tool(ToolArgs),

    /// List the available review tools
    Tools,

    /// Inspect stored reviews
    Reviews(ReviewsArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries tool results
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load_with_overrides(cli.port, cli.data_dir.clone())?;

    if cli.verbose {
        tracing::info!(
            port = config.server.port,
            data_dir = %config.storage.data_dir.display(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("openfleet {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Host(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Tool(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Tools) => {
            commands::tool::list_tools(&config)?;
        }
        Some(Commands::Reviews(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            println!("OpenFleet Configuration");
            println!("=======================");
            println!();
            println!("Server:");
            println!("  host: {}", config.server.host);
            println!("  port: {}", config.server.port);
            println!("  max_port_attempts: {}", config.server.max_port_attempts);
            println!();
            println!("Storage:");
            println!("  data_dir: {}", config.storage.data_dir.display());
            println!("  reviews: {}", config.storage.reviews_dir().display());
            println!();
            println!("UI:");
            println!("  poll_interval: {:?}", config.ui.poll_interval);
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
        None => {
            println!("OpenFleet - human review of agent-written documents");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
