//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{OutputRecord, QueryRequest};
use crate::traits::{ConfigSource, Content, DocumentNode, Fetcher, PageParser, RecordSink};

// ---------------------------------------------------------------------------
// MockConfig
// ---------------------------------------------------------------------------

/// Mock config source that returns a fixed input once.
#[derive(Clone)]
pub struct MockConfig {
    input: Arc<Mutex<Option<Result<Option<serde_json::Value>, AppError>>>>,
}

impl MockConfig {
    pub fn new(input: serde_json::Value) -> Self {
        Self {
            input: Arc::new(Mutex::new(Some(Ok(Some(input))))),
        }
    }

    /// Host supplied no input at all.
    pub fn absent() -> Self {
        Self {
            input: Arc::new(Mutex::new(Some(Ok(None)))),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            input: Arc::new(Mutex::new(Some(Err(error)))),
        }
    }
}

impl ConfigSource for MockConfig {
    async fn get_config(&self) -> Result<Option<serde_json::Value>, AppError> {
        self.input.lock().unwrap().take().unwrap_or(Ok(None))
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that records every request and answers with one fixed response.
#[derive(Clone)]
pub struct MockFetcher {
    response: Arc<Mutex<Option<Result<String, AppError>>>>,
    pub requests: Arc<Mutex<Vec<QueryRequest>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::answering(Ok(html.to_string()))
    }

    pub fn with_error(error: AppError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(response: Result<String, AppError>) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(response))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &QueryRequest) -> Result<String, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .lock()
            .unwrap()
            .take()
            .expect("MockFetcher answers a single request")
    }
}

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Mock parser that returns a fixed value and records the pages it saw.
#[derive(Clone)]
pub struct MockParser {
    result: Arc<Mutex<Option<AppError>>>,
    value: String,
    pub pages: Arc<Mutex<Vec<String>>>,
}

impl MockParser {
    pub fn new(value: &str) -> Self {
        Self {
            result: Arc::new(Mutex::new(None)),
            value: value.to_string(),
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            result: Arc::new(Mutex::new(Some(error))),
            value: String::new(),
            pages: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PageParser for MockParser {
    fn parse(&self, html: &str) -> Result<String, AppError> {
        self.pages.lock().unwrap().push(html.to_string());
        if let Some(e) = self.result.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.value.clone())
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock sink that records pushed records.
#[derive(Clone)]
pub struct MockSink {
    pub records: Arc<Mutex<Vec<OutputRecord>>>,
    push_error: Arc<Mutex<Option<AppError>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            push_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_push_error(error: AppError) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            push_error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for MockSink {
    async fn push(&self, record: &OutputRecord) -> Result<(), AppError> {
        if let Some(e) = self.push_error.lock().unwrap().take() {
            return Err(e);
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TestNode
// ---------------------------------------------------------------------------

/// Declarative description of a tree, turned into a [`TestNode`] by [`TestNode::build`].
#[derive(Debug, Clone)]
pub enum NodeSpec {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeSpec>,
    },
    Text(String),
}

pub fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<NodeSpec>) -> NodeSpec {
    NodeSpec::Element {
        tag: tag.to_string(),
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

pub fn text(s: &str) -> NodeSpec {
    NodeSpec::Text(s.to_string())
}

#[derive(Debug)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Content<usize>>,
}

/// In-memory element tree for exercising [`crate::extract`] without a parser.
///
/// Elements are stored in pre-order, so the next element in document order
/// is simply the next slot in the arena.
#[derive(Debug, Clone)]
pub struct TestNode {
    arena: Rc<Vec<ElementData>>,
    id: usize,
}

impl TestNode {
    /// Panics if `root` is a text node.
    pub fn build(root: NodeSpec) -> Self {
        let mut arena = Vec::new();
        match flatten(root, &mut arena) {
            Content::Element(id) => Self {
                arena: Rc::new(arena),
                id,
            },
            Content::Text(_) => panic!("tree root must be an element"),
        }
    }

    fn data(&self) -> &ElementData {
        &self.arena[self.id]
    }

    fn at(&self, id: usize) -> Self {
        Self {
            arena: Rc::clone(&self.arena),
            id,
        }
    }
}

fn flatten(spec: NodeSpec, arena: &mut Vec<ElementData>) -> Content<usize> {
    match spec {
        NodeSpec::Text(t) => Content::Text(t),
        NodeSpec::Element {
            tag,
            attrs,
            children,
        } => {
            let id = arena.len();
            arena.push(ElementData {
                tag,
                attrs,
                children: Vec::new(),
            });
            let children = children.into_iter().map(|c| flatten(c, arena)).collect();
            arena[id].children = children;
            Content::Element(id)
        }
    }
}

impl DocumentNode for TestNode {
    fn tag(&self) -> &str {
        &self.data().tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.data()
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn children(&self) -> Vec<Content<Self>> {
        self.data()
            .children
            .iter()
            .map(|child| match child {
                Content::Element(id) => Content::Element(self.at(*id)),
                Content::Text(t) => Content::Text(t.clone()),
            })
            .collect()
    }

    fn next_in_document(&self) -> Option<Self> {
        let next = self.id + 1;
        (next < self.arena.len()).then(|| self.at(next))
    }
}
