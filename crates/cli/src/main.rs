use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "homeroom",
    about = "Watches Canvas for new and turned-in homework",
    version
)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "homeroom.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write a default configuration into a data directory
    Init {
        /// Data directory path
        #[arg(long, default_value = "/var/lib/homeroom")]
        data_dir: String,
    },
    /// Test the Canvas connection
    Check,
    /// Run a single update cycle and print the results
    Poll {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// List assignments that have not been turned in
    Pending,
    /// Show tracked assignment counts from the saved state
    Status,
    /// Poll on the configured interval until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            commands::init::run(&data_dir).await?;
        }
        Commands::Check => {
            commands::check::run(&cli.config).await?;
        }
        Commands::Poll { json } => {
            commands::poll::run(&cli.config, json).await?;
        }
        Commands::Pending => {
            commands::pending::run(&cli.config).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Watch => {
            commands::watch::run(&cli.config).await?;
        }
    }

    Ok(())
}
