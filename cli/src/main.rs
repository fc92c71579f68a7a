use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wrfhours::ParseOptions;

#[derive(Debug, Parser)]
#[command(name = "wrfhours", version, disable_version_flag = true)]
#[command(about = "Stream the output files of a WRF run as NDJSON records", long_about = None)]
struct Cli {
    /// Path to the WRF log (e.g. rsl.out.0000); reads stdin when omitted
    #[arg(value_name = "FILE")]
    path: Option<PathBuf>,

    /// Longest allowed silence between two output files, in milliseconds
    #[arg(long = "timeout", value_name = "MS", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout carries the records
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wrfhours=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = ParseOptions::new(Duration::from_millis(cli.timeout_ms));

    let results = match &cli.path {
        Some(path) => wrfhours::parse_file(path, options).await,
        None => {
            tracing::info!("Reading WRF log from stdin");
            wrfhours::parse(tokio::io::stdin(), options)
        }
    };

    let written = wrfhours::ndjson::marshal(results, tokio::io::stdout()).await?;
    tracing::info!("{} files reported", written);
    Ok(())
}
