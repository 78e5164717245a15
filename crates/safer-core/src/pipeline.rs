use crate::error::AppError;
use crate::models::{OutputRecord, QueryRequest, SnapshotInput};
use crate::traits::{ConfigSource, Fetcher, PageParser, RecordSink};

/// Orchestrates one run: read config → POST query → parse → extract → emit.
///
/// Generic over all external dependencies via traits, enabling dependency injection
/// and testability without real HTTP or a real host.
pub struct SnapshotPipeline<C, F, P, S>
where
    C: ConfigSource,
    F: Fetcher,
    P: PageParser,
    S: RecordSink,
{
    config: C,
    fetcher: F,
    parser: P,
    sink: S,
}

impl<C, F, P, S> SnapshotPipeline<C, F, P, S>
where
    C: ConfigSource,
    F: Fetcher,
    P: PageParser,
    S: RecordSink,
{
    pub fn new(config: C, fetcher: F, parser: P, sink: S) -> Self {
        Self {
            config,
            fetcher,
            parser,
            sink,
        }
    }

    /// Run the pipeline once.
    ///
    /// 1. Read the input mapping (absent input is the empty mapping)
    /// 2. POST the carrier snapshot form
    /// 3. Parse the page and extract the percentage
    /// 4. Push the single output record
    ///
    /// Any failure aborts the run before anything reaches the sink.
    pub async fn run(&self) -> Result<OutputRecord, AppError> {
        // 1. Config
        let input = SnapshotInput::from_value(self.config.get_config().await?)?;
        let request = QueryRequest::carrier_snapshot(&input);

        // 2. Request
        tracing::info!(query_string = %request.query_string, "Querying {}", request.url);
        let html = self.fetcher.fetch(&request).await?;
        tracing::info!("Fetched {} bytes of HTML", html.len());

        // 3. Parse + extract
        let value = self.parser.parse(&html)?;
        tracing::info!(driver_out_of_service_percentage = %value, "Extraction complete");

        // 4. Emit
        let record = OutputRecord::new(value);
        self.sink.push(&record).await?;

        Ok(record)
    }
}
