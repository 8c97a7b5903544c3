//! torcrime-ingest - Toronto neighbourhood crime rates loader

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::process::ExitCode;
use torcrime_common::logging::{init_logging, LogConfig, LogLevel};
use torcrime_ingest::config::Config;
use torcrime_ingest::models::DumpFormat;
use torcrime_ingest::pipeline::Pipeline;
use torcrime_ingest::{db, IngestError};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "torcrime-ingest")]
#[command(author, version, about = "Load Toronto neighbourhood crime rates into PostgreSQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// CKAN portal base URL
    #[arg(long, global = true, env = "TORCRIME_BASE_URL")]
    base_url: Option<String>,

    /// CKAN package id
    #[arg(long, global = true, env = "TORCRIME_DATASET")]
    dataset: Option<String>,

    /// Destination database URL
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Format requested from the datastore dump endpoint
    #[arg(long, global = true, value_enum)]
    dump_format: Option<DumpFormat>,

    /// Rows per INSERT statement
    #[arg(long, global = true)]
    batch_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, normalize and load the dataset
    Run,

    /// Create the destination table if it does not exist
    InitSchema,

    /// Fetch and normalize, then print rows as JSON lines without loading
    Preview {
        /// Maximum rows to print per resource
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

impl Cli {
    /// Environment overlaid with flags, validated once both are applied
    fn config(&self) -> Result<Config> {
        dotenvy::dotenv().ok();
        let mut config = Config::from_env()?;

        if let Some(base_url) = &self.base_url {
            config.source.base_url = base_url.clone();
        }
        if let Some(dataset) = &self.dataset {
            config.source.dataset = dataset.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(format) = self.dump_format {
            config.source.dump_format = format;
        }
        if let Some(batch_size) = self.batch_size {
            config.load.batch_size = batch_size;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("torcrime-ingest")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        },
    };

    if let Err(e) = execute(&cli).await {
        let stage = match e.downcast_ref::<IngestError>() {
            Some(ingest) if ingest.is_source_error() => "source",
            Some(IngestError::Database(_)) => "database",
            _ => "pipeline",
        };
        error!(stage, error = %format!("{e:#}"), "Command failed");
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn execute(cli: &Cli) -> Result<()> {
    let config = cli.config()?;

    match &cli.command {
        Command::Run => {
            let pool = db::create_pool(&config.database)
                .await
                .context("failed to connect to the destination database")?;
            let report = Pipeline::new(config)?.run(&pool).await?;
            pool.close().await;

            info!(
                run_id = %report.run_id,
                inserted = report.rows_inserted,
                skipped = report.rows_skipped,
                "Ingestion complete"
            );
        },
        Command::InitSchema => {
            let pool = db::create_pool(&config.database)
                .await
                .context("failed to connect to the destination database")?;
            let drift = db::ensure_table(&pool).await?;
            pool.close().await;

            if !drift.is_empty() {
                eprintln!("Warning: existing table differs from the declared shape");
            }
        },
        Command::Preview { limit } => {
            let tables = Pipeline::new(config)?.prepare().await?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for table in &tables {
                let rows = table.rows.iter().take(limit.unwrap_or(usize::MAX));
                for row in rows {
                    serde_json::to_writer(&mut out, row)?;
                    writeln!(out)?;
                }
            }
            out.flush()?;
        },
    }

    Ok(())
}
