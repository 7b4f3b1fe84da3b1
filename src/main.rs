use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use table_indexer::{cli, job::Step};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Table Indexer: extract a PostgreSQL table, clean it, and index every row into Elasticsearch
#[derive(Parser)]
#[command(name = "tidx", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: PathBuf,

    /// YAML configuration file (ETL_* environment variables override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, clean and load once, retrying failed steps
    Run,

    /// Run a single step without retries
    Step {
        /// extract, clean or load
        step: Step,
    },

    /// Run on the configured interval until interrupted
    Serve,

    /// Test connectivity to the source database and the search index
    Check,

    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_loaded = cli.env.exists();
    if env_loaded {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if !env_loaded {
        log::debug!("No dotenv file at {}", cli.env.display());
    }

    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => {
            log::info!(
                "Running {} → {} → {}",
                config.source.to_string().bright_black(),
                config.artifacts.clean_path.display().bright_black(),
                config.destination.index.cyan()
            );
            let report = cli::run_once(&config).await?;
            log::info!("✓ {}", report);
        }
        Commands::Step { step } => {
            log::info!("Running step {}", step.cyan());
            let count = cli::run_step(&config, step).await?;
            log::info!("✓ Step {} wrote {} record(s)", step, count);
        }
        Commands::Serve => {
            log::info!(
                "Serving {} every {}s",
                config.source.to_string().bright_black(),
                config.schedule.interval_secs.cyan()
            );
            cli::serve(&config).await?;
        }
        Commands::Check => {
            log::info!("Checking connectivity");
            cli::check_connections(&config).await?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
