use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use wigle_upload::config::UploaderConfig;
use wigle_upload::upload::Credentials;

#[derive(Parser)]
#[command(
    name = "wigle-upload",
    about = "Export wireless observation records and upload them to WiGLE",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $WIGLE_UPLOAD_CONFIG, then ./wigle_upload.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the records and upload the archive as a stumble file
    Upload {
        /// JSON file holding the network/observation snapshot
        #[arg(long)]
        records: PathBuf,

        /// Observer name (overrides the configured identity)
        #[arg(long)]
        username: Option<String>,

        /// Password (overrides the configured identity)
        #[arg(long)]
        password: Option<String>,
    },

    /// Write the gzip export only, without uploading
    Export {
        /// JSON file holding the network/observation snapshot
        #[arg(long)]
        records: PathBuf,

        /// Output archive path
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing before the config is read so load warnings are seen.
    let env_filter = EnvFilter::try_from_default_env().ok();
    let level_from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => UploaderConfig::load(path)?,
        None => UploaderConfig::load_or_default(),
    };

    // RUST_LOG wins over the configured level.
    if !level_from_env {
        if let Err(e) = filter_handle.modify(|f| *f = EnvFilter::new(&config.logging.level)) {
            tracing::warn!(error = %e, "failed to apply configured log level");
        }
    }

    match cli.command {
        Commands::Upload {
            records,
            username,
            password,
        } => {
            let networks = wigle_upload::load_records(&records)?;
            let credentials = Credentials::new(
                username.unwrap_or_else(|| config.identity.username.clone()),
                password.unwrap_or_else(|| config.identity.password.clone()),
            );

            tracing::info!(endpoint = %config.service.endpoint, "Starting upload");
            let outcome = wigle_upload::run_upload(&networks, credentials, &config).await?;

            println!("{}", outcome);
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Export { records, output } => {
            let networks = wigle_upload::load_records(&records)?;
            tracing::info!(output = %output.display(), "Exporting archive");
            wigle_upload::export::write_archive(&output, &networks)?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
