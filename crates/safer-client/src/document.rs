use std::iter;

use safer_core::error::AppError;
use safer_core::extract::extract_driver_oos_percentage;
use safer_core::traits::{Content, DocumentNode, PageParser};
use scraper::{ElementRef, Html};

/// [`DocumentNode`] over a `scraper` element.
#[derive(Debug, Clone, Copy)]
pub struct ScraperNode<'a>(ElementRef<'a>);

impl<'a> ScraperNode<'a> {
    /// The document's `<html>` element.
    pub fn root(document: &'a Html) -> Self {
        Self(document.root_element())
    }
}

impl DocumentNode for ScraperNode<'_> {
    fn tag(&self) -> &str {
        self.0.value().name()
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.0.value().attr(name)
    }

    // Comment nodes fall through `as_text` and are dropped.
    fn children(&self) -> Vec<Content<Self>> {
        self.0
            .children()
            .filter_map(|child| match ElementRef::wrap(child) {
                Some(element) => Some(Content::Element(Self(element))),
                None => child
                    .value()
                    .as_text()
                    .map(|text| Content::Text(String::from(&**text))),
            })
            .collect()
    }

    fn next_in_document(&self) -> Option<Self> {
        let mut current = *self.0;
        loop {
            // Pre-order successor: first child, else the nearest following
            // sibling of this node or one of its ancestors.
            let next = current.first_child().or_else(|| {
                iter::once(current)
                    .chain(current.ancestors())
                    .find_map(|node| node.next_sibling())
            })?;
            if let Some(element) = ElementRef::wrap(next) {
                return Some(Self(element));
            }
            current = next;
        }
    }
}

/// HTML page parser backed by `scraper` (html5ever).
#[derive(Debug, Clone, Default)]
pub struct ScraperParser;

impl ScraperParser {
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for ScraperParser {
    fn parse(&self, html: &str) -> Result<String, AppError> {
        let document = Html::parse_document(html);
        extract_driver_oos_percentage(&ScraperNode::root(&document))
    }
}
