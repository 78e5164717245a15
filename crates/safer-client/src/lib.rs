pub mod dataset;
pub mod document;
pub mod fetcher;

pub use dataset::{JsonFileInput, JsonInput, JsonLinesSink, StdoutSink};
pub use document::{ScraperNode, ScraperParser};
pub use fetcher::ReqwestFetcher;
