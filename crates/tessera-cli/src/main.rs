//! tessera: command-line client for the threshold signing cluster.
//!
//! Every command logs in with the supplied identity credential, then runs
//! the requested ceremony. Results go to stdout, logs to stderr.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Threshold signing client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (default: ~/.tessera/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Identity credential used to log in.
#[derive(Args)]
pub struct Credentials {
    /// Identity provider (google, github, facebook, microsoft, twitter)
    #[arg(short, long, default_value = "google")]
    pub method: tessera_types::AuthMethod,

    /// Provider user id (Google `sub`, GitHub numeric id, ...)
    #[arg(short, long)]
    pub user_id: String,

    /// Provider token
    #[arg(short, long)]
    pub token: String,

    /// OAuth client id; Google logins then go through the auth service
    #[arg(long)]
    pub client_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the wallet address
    Address {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Sign a personal message
    SignMessage {
        #[command(flatten)]
        credentials: Credentials,

        /// Message text
        message: String,
    },

    /// Sign a transaction read from a JSON file
    SignTx {
        #[command(flatten)]
        credentials: Credentials,

        /// Transaction JSON
        file: PathBuf,
    },

    /// Sign EIP-712 typed data read from a JSON file
    SignTypedData {
        #[command(flatten)]
        credentials: Credentials,

        /// JSON with `domain`, `types` and `message`
        file: PathBuf,
    },

    /// Exchange a GitHub authorization code
    GithubExchange {
        /// Authorization code
        code: String,
    },

    /// Exchange a Twitter authorization code and fetch the profile
    TwitterExchange {
        /// Authorization code
        code: String,

        /// PKCE code verifier
        #[arg(long)]
        verifier: String,
    },

    /// Print the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    // Initialize tracing
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tessera={level}").parse()?),
        )
        .init();

    if let Commands::ShowConfig = cli.command {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let context = commands::Context::new(config)?;
    info!(
        nodes = context.cluster.node_count(),
        threshold = context.cluster.threshold(),
        "Cluster loaded"
    );

    match cli.command {
        Commands::Address { credentials } => commands::address(&context, &credentials).await,
        Commands::SignMessage {
            credentials,
            message,
        } => commands::sign_message(&context, &credentials, &message).await,
        Commands::SignTx { credentials, file } => {
            commands::sign_tx(&context, &credentials, &file).await
        }
        Commands::SignTypedData { credentials, file } => {
            commands::sign_typed_data(&context, &credentials, &file).await
        }
        Commands::GithubExchange { code } => commands::github_exchange(&context, &code).await,
        Commands::TwitterExchange { code, verifier } => {
            commands::twitter_exchange(&context, &code, &verifier).await
        }
        Commands::ShowConfig => Ok(()),
    }
}
