use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use safer_client::{JsonFileInput, JsonInput, JsonLinesSink, ReqwestFetcher, ScraperParser, StdoutSink};
use safer_core::error::AppError;
use safer_core::models::OutputRecord;
use safer_core::traits::{ConfigSource, RecordSink};
use safer_core::SnapshotPipeline;

#[derive(Parser, Debug)]
#[command(
    name = "safer",
    version,
    about = "Look up a carrier's driver out-of-service percentage on FMCSA SAFER"
)]
struct Cli {
    /// USDOT number to query (shorthand for an input of {"query_string": ...})
    #[arg(short, long, env = "SAFER_QUERY_STRING", conflicts_with = "input")]
    query_string: Option<String>,

    /// JSON input file with an optional "query_string" key ("-" reads stdin)
    #[arg(short, long, env = "SAFER_INPUT")]
    input: Option<PathBuf>,

    /// Append the record to this JSON-lines dataset file instead of printing it
    #[arg(short, long, env = "SAFER_OUTPUT")]
    output: Option<PathBuf>,

    /// Query endpoint override (defaults to the SAFER query page)
    #[arg(long, env = "SAFER_ENDPOINT")]
    endpoint: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, env = "SAFER_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
}

/// Where the run's input mapping comes from.
#[derive(Debug)]
enum Input {
    Flags(JsonInput),
    File(JsonFileInput),
}

impl ConfigSource for Input {
    async fn get_config(&self) -> Result<Option<serde_json::Value>, AppError> {
        match self {
            Input::Flags(input) => input.get_config().await,
            Input::File(input) => input.get_config().await,
        }
    }
}

/// Where the record goes.
#[derive(Debug)]
enum Output {
    Stdout(StdoutSink),
    Dataset(JsonLinesSink),
}

impl RecordSink for Output {
    async fn push(&self, record: &OutputRecord) -> Result<(), AppError> {
        match self {
            Output::Stdout(sink) => sink.push(record).await,
            Output::Dataset(sink) => sink.push(record).await,
        }
    }
}

impl Cli {
    fn input_source(&self) -> Input {
        match (&self.query_string, &self.input) {
            (Some(query), _) => Input::Flags(JsonInput::new(
                serde_json::json!({ "query_string": query }),
            )),
            (None, Some(path)) => Input::File(JsonFileInput::new(path)),
            (None, None) => Input::Flags(JsonInput::empty()),
        }
    }

    fn output_sink(&self) -> Output {
        match &self.output {
            Some(path) => Output::Dataset(JsonLinesSink::new(path)),
            None => Output::Stdout(StdoutSink),
        }
    }

    fn fetcher(&self) -> Result<ReqwestFetcher> {
        let fetcher = ReqwestFetcher::with_timeout(Duration::from_secs(self.timeout_secs))
            .context("Failed to create HTTP client")?;

        match &self.endpoint {
            Some(endpoint) => fetcher.with_endpoint(endpoint).context("Invalid --endpoint"),
            None => Ok(fetcher),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing; stdout is reserved for records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("safer=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let pipeline = SnapshotPipeline::new(
        cli.input_source(),
        cli.fetcher()?,
        ScraperParser::new(),
        cli.output_sink(),
    );

    let record = pipeline.run().await.map_err(|e| {
        let step = e.step();
        anyhow::Error::new(e).context(format!("Snapshot run failed at the {step} step"))
    })?;

    if let Some(path) = &cli.output {
        tracing::info!(
            driver_out_of_service_percentage = %record.driver_out_of_service_percentage,
            "Record appended to {}",
            path.display()
        );
    }

    Ok(())
}
