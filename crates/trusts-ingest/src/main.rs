//! TRUSTS Ingest - metadata ingestion tool

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use trusts_common::logging::{init_logging, LogConfig, LogLevel};
use trusts_ingest::broker::{self, BrokerClient};
use trusts_ingest::config::{Settings, DEFAULT_ENV_FILE};
use trusts_ingest::europeana::{self, EuropeanaOptions, DEFAULT_BATCH_SIZE};
use trusts_ingest::openaire;
use trusts_ingest::publish::TrustsClient;

#[derive(Parser, Debug)]
#[command(name = "trusts-ingest")]
#[command(author, version, about = "TRUSTS metadata ingestion tool")]
struct Cli {
    /// Source to ingest
    #[command(subcommand)]
    source: Source,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Republish resources offered at the IDS broker
    Broker {
        /// Settings file with connector and catalog credentials
        #[arg(long, default_value = DEFAULT_ENV_FILE)]
        env_file: PathBuf,

        /// Only resources of this asset type (e.g. dataset, service)
        #[arg(long)]
        resource_type: Option<String>,
    },

    /// Download and transform Europeana EDM archives
    Europeana {
        /// Folder to store all output
        #[arg(short = 'b', long = "base_folder")]
        base_folder: PathBuf,

        /// Number of archives to acquire
        #[arg(short, long)]
        until: Option<usize>,

        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// FTP host
        #[arg(long, default_value = europeana::ftp::DEFAULT_HOST)]
        host: String,
    },

    /// Transform OpenAIRE JSON-lines dumps
    Openaire {
        /// Folder with the *.gz dumps
        #[arg(short, long)]
        input: PathBuf,

        /// Output folder
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, default_value_t = openaire::DEFAULT_LIMIT)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // LOG_* variables take precedence over the flag
    let log_config = if LogConfig::env_overrides_present() {
        LogConfig::from_env()?
    } else {
        LogConfig::builder()
            .level(log_level)
            .log_file_prefix("trusts-ingest")
            .build()
    };

    init_logging(&log_config)?;

    if let Err(e) = dispatch(cli.source).await {
        error!(error = %e, "Ingestion failed");
        return Err(e);
    }

    info!("Ingestion complete");
    Ok(())
}

async fn dispatch(source: Source) -> Result<()> {
    match source {
        Source::Broker {
            env_file,
            resource_type,
        } => {
            info!(env_file = %env_file.display(), "Running broker pipeline");
            let settings = Settings::load(&env_file)?;
            let client = BrokerClient::new(&settings)?;
            let publisher = TrustsClient::new(&settings)?;
            broker::run(&client, &publisher, resource_type.as_deref()).await?;
        },
        Source::Europeana {
            base_folder,
            until,
            batch_size,
            host,
        } => {
            info!(base_folder = %base_folder.display(), "Running Europeana pipeline");
            let mut options = EuropeanaOptions::new(base_folder);
            options.until = until;
            options.batch_size = batch_size;
            options.ftp = options.ftp.with_host(host);
            europeana::run(&options).await?;
        },
        Source::Openaire {
            input,
            output,
            limit,
        } => {
            info!(input = %input.display(), "Running OpenAIRE pipeline");
            tokio::task::spawn_blocking(move || openaire::run(&input, &output, limit)).await??;
        },
    }
    Ok(())
}
