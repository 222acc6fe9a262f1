use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Quill CLI - cached entity lookups against a Mastodon-compatible instance", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/quill/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level, overriding the config file (RUST_LOG still wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an account
    Account {
        id: String,
        /// Also fetch the viewer's relationship to the account
        #[arg(long)]
        with_relationship: bool,
    },
    /// Show a group and the viewer's membership
    Group { id: String },
    /// Join a group
    JoinGroup { id: String },
    /// Leave a group
    LeaveGroup { id: String },
    /// Summarize federation restrictions from a JSON flag set
    Federation {
        host: String,
        /// e.g. '{"media_removal": true, "followers_only": true}'
        #[arg(long, default_value = "{}")]
        flags: String,
        /// The instance keeps its moderation policy private
        #[arg(long)]
        hidden: bool,
        /// View as an admin, who always sees moderation details
        #[arg(long)]
        admin: bool,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    quill_infrastructure::telemetry::init_tracing(&config.log_level)?;

    match cli.command {
        Commands::Account {
            id,
            with_relationship,
        } => commands::account::show(&config, &id, with_relationship).await?,
        Commands::Group { id } => commands::group::show(&config, &id).await?,
        Commands::JoinGroup { id } => commands::group::join(&config, &id).await?,
        Commands::LeaveGroup { id } => commands::group::leave(&config, &id).await?,
        Commands::Federation {
            host,
            flags,
            hidden,
            admin,
        } => commands::federation::summarize(&config, &host, &flags, hidden, admin)?,
        Commands::Config => commands::config::show(&config)?,
    }

    Ok(())
}
