pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use models::{OutputRecord, QueryRequest, SnapshotInput};
pub use pipeline::SnapshotPipeline;
pub use traits::{ConfigSource, Content, DocumentNode, Fetcher, PageParser, RecordSink};
