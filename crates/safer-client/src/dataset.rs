//! Host-side input sources and record sinks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use safer_core::error::AppError;
use safer_core::models::OutputRecord;
use safer_core::traits::{ConfigSource, RecordSink};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Input already held in memory (e.g. assembled from command-line flags).
#[derive(Debug, Clone, Default)]
pub struct JsonInput {
    value: Option<serde_json::Value>,
}

impl JsonInput {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value: Some(value) }
    }

    /// No input supplied.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ConfigSource for JsonInput {
    async fn get_config(&self) -> Result<Option<serde_json::Value>, AppError> {
        Ok(self.value.clone())
    }
}

/// Input read from a JSON file, or from stdin when the path is `-`.
///
/// A blank file counts as "no input".
#[derive(Debug, Clone)]
pub struct JsonFileInput {
    path: PathBuf,
}

impl JsonFileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_stdin(&self) -> bool {
        self.path == Path::new("-")
    }
}

impl ConfigSource for JsonFileInput {
    async fn get_config(&self) -> Result<Option<serde_json::Value>, AppError> {
        if self.is_stdin() {
            return read_input(&mut tokio::io::stdin(), "stdin").await;
        }

        let source = self.path.display().to_string();
        let mut file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::NotFound => "file not found".to_string(),
                _ => e.to_string(),
            };
            AppError::ConfigError(format!("Failed to read input file {source}: {reason}"))
        })?;
        read_input(&mut file, &source).await
    }
}

/// Read a whole JSON input from `reader`; blank input is `None`.
async fn read_input<R>(reader: &mut R, source: &str) -> Result<Option<serde_json::Value>, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .await
        .map_err(|e| AppError::ConfigError(format!("Failed to read input from {source}: {e}")))?;

    if raw.trim().is_empty() {
        tracing::debug!("Input {source} is blank");
        return Ok(None);
    }

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| AppError::ConfigError(format!("Invalid JSON in input {source}: {e}")))
}

/// Write `record` as one JSON line to `writer` and flush it.
async fn write_line<W>(writer: &mut W, record: &OutputRecord, target: &str) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| AppError::SinkError(format!("Failed to write {target}: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::SinkError(format!("Failed to flush {target}: {e}")))
}

/// Writes each record as one JSON line on stdout.
#[derive(Debug, Clone, Default)]
pub struct StdoutSink;

impl RecordSink for StdoutSink {
    async fn push(&self, record: &OutputRecord) -> Result<(), AppError> {
        write_line(&mut tokio::io::stdout(), record, "stdout").await
    }
}

/// Appends each record as one JSON line to a dataset file.
///
/// Parent directories and the file itself are created on first push.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    async fn push(&self, record: &OutputRecord) -> Result<(), AppError> {
        let target = self.path.display().to_string();
        let sink_err =
            |e: std::io::Error| AppError::SinkError(format!("Failed to write {target}: {e}"));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(sink_err)?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(sink_err)?;
        write_line(&mut file, record, &target).await?;

        tracing::debug!("Appended record to {}", self.path.display());
        Ok(())
    }
}
