use std::future::Future;

use crate::error::AppError;
use crate::models::{OutputRecord, QueryRequest};

/// Supplies the host's input mapping at run start.
pub trait ConfigSource: Send + Sync {
    /// Returns the raw input, or `None` when the host supplied nothing.
    fn get_config(&self) -> impl Future<Output = Result<Option<serde_json::Value>, AppError>> + Send;
}

/// Submits a query form and returns the response body.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, request: &QueryRequest) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns a response body into the extracted out-of-service percentage.
pub trait PageParser: Send + Sync + Clone {
    fn parse(&self, html: &str) -> Result<String, AppError>;
}

/// Append-only destination for output records.
pub trait RecordSink: Send + Sync {
    fn push(&self, record: &OutputRecord) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// One child of a [`DocumentNode`]: a nested element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content<N> {
    Element(N),
    Text(String),
}

/// Element view over a parsed HTML tree.
///
/// Kept minimal so the navigation in [`crate::extract`] runs over any
/// parser, or over a hand-built tree in tests.
pub trait DocumentNode: Clone {
    /// Local tag name, lowercase.
    fn tag(&self) -> &str;

    fn attr(&self, name: &str) -> Option<&str>;

    /// Child elements and text nodes, in document order.
    ///
    /// Comments, doctypes and processing instructions are not content
    /// nodes and never appear here, so `<td>7%<!-- note --></td>` ends in
    /// the text `7%`.
    fn children(&self) -> Vec<Content<Self>>;

    /// The next element in document order, descending into this element's
    /// children before moving on to its following siblings.
    fn next_in_document(&self) -> Option<Self>;
}
