use serde::Serialize;
use std::sync::Arc;

use super::parser;
use super::query::Query;
use super::selector::{By, MatchMode, SelectorKind};
use super::types::{Bounds, Node, NodeId, Point, Tree};
use crate::device::gesture::DEFAULT_SWIPE_DURATION_MS;
use crate::device::{Direction, Driver, EditorAction, SwipePlan};
use crate::error::Result;

/// Ratio of an element's extent covered by `Element::swipe`
pub const ELEMENT_SWIPE_RATIO: f64 = 0.8;

/// A parsed hierarchy snapshot, optionally scoped to one of its nodes.
///
/// Cloning is cheap: the tree and the raw dump are shared.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Arc<str>,
    tree: Arc<Tree>,
    scope: NodeId,
}

impl Document {
    pub fn parse(xml: &str) -> anyhow::Result<Self> {
        let tree = parser::parse(xml)?;
        Ok(Self {
            raw: Arc::from(xml),
            tree: Arc::new(tree),
            scope: Tree::ROOT,
        })
    }

    pub fn raw_xml(&self) -> &str {
        &self.raw
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Whether this document is narrowed to a single node
    pub fn is_scoped(&self) -> bool {
        self.scope != Tree::ROOT
    }

    fn scoped(&self, id: NodeId) -> Document {
        Document {
            raw: Arc::clone(&self.raw),
            tree: Arc::clone(&self.tree),
            scope: id,
        }
    }

    fn node(&self) -> Option<&Node> {
        if self.is_scoped() {
            self.tree.get(self.scope)
        } else {
            None
        }
    }

    // ============ Attribute accessors ============

    /// Raw attribute value of the scoped node; empty when absent
    pub fn attribute(&self, name: &str) -> String {
        self.node()
            .and_then(|n| n.attribute(name))
            .unwrap_or_default()
            .to_string()
    }

    pub fn text(&self) -> String {
        self.attribute("text")
    }

    pub fn content_desc(&self) -> String {
        self.attribute("content-desc")
    }

    pub fn class_name(&self) -> String {
        self.attribute("class")
    }

    pub fn resource_id(&self) -> String {
        self.attribute("resource-id")
    }

    pub fn checked(&self) -> bool {
        self.attribute("checked") == "true"
    }

    /// Reads the `enabled` attribute. Existing callers rely on this mapping,
    /// so it is kept even though a `selected` attribute exists in dumps.
    pub fn selected(&self) -> bool {
        self.attribute("enabled") == "true"
    }

    /// Sibling index, `-1` without a node and `0` when unparseable
    pub fn index(&self) -> i32 {
        match self.node() {
            Some(node) => node
                .attribute("index")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            None => -1,
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self.node() {
            Some(node) => Bounds::parse(node.attribute("bounds").unwrap_or_default()),
            None => Bounds::default(),
        }
    }

    // ============ Queries ============

    /// Evaluate a path query against the current scope, surfacing syntax errors
    pub fn try_find_elements(&self, query: &str) -> Result<Vec<Element>> {
        let query = Query::parse(query)?;
        Ok(query
            .evaluate(&self.tree, self.scope)
            .into_iter()
            .map(|id| Element::new(self.scoped(id)))
            .collect())
    }

    /// All matches for `query`; an invalid query matches nothing
    pub fn find_elements(&self, query: &str) -> Vec<Element> {
        self.try_find_elements(query).unwrap_or_else(|e| {
            tracing::warn!("Ignoring query: {}", e);
            Vec::new()
        })
    }

    pub fn find_element(&self, query: &str) -> Option<Element> {
        self.find_elements(query).into_iter().next()
    }

    pub fn by_text(&self, value: &str) -> Option<Element> {
        self.by_exact("text", value)
    }

    pub fn by_content_desc(&self, value: &str) -> Option<Element> {
        self.by_exact("content-desc", value)
    }

    pub fn by_class(&self, value: &str) -> Option<Element> {
        self.by_exact("class", value)
    }

    pub fn by_resource_id(&self, value: &str) -> Option<Element> {
        self.by_exact("resource-id", value)
    }

    pub fn by_starts_with_text(&self, prefix: &str) -> Option<Element> {
        self.scan("text", |v| v.starts_with(prefix))
    }

    pub fn by_starts_with_content_desc(&self, prefix: &str) -> Option<Element> {
        self.scan("content-desc", |v| v.starts_with(prefix))
    }

    pub fn by_starts_with_class(&self, prefix: &str) -> Option<Element> {
        self.scan("class", |v| v.starts_with(prefix))
    }

    pub fn by_starts_with_resource_id(&self, prefix: &str) -> Option<Element> {
        self.scan("resource-id", |v| v.starts_with(prefix))
    }

    pub fn by_ends_with_text(&self, suffix: &str) -> Option<Element> {
        self.scan("text", |v| v.ends_with(suffix))
    }

    pub fn by_ends_with_content_desc(&self, suffix: &str) -> Option<Element> {
        self.scan("content-desc", |v| v.ends_with(suffix))
    }

    pub fn by_ends_with_class(&self, suffix: &str) -> Option<Element> {
        self.scan("class", |v| v.ends_with(suffix))
    }

    pub fn by_ends_with_resource_id(&self, suffix: &str) -> Option<Element> {
        self.scan("resource-id", |v| v.ends_with(suffix))
    }

    /// Resolve one selector kind against this document
    pub fn find_by(&self, kind: SelectorKind, value: &str) -> Option<Element> {
        match kind.match_mode() {
            MatchMode::Exact => self.by_exact(kind.attribute(), value),
            MatchMode::Prefix => self.scan(kind.attribute(), |v| v.starts_with(value)),
            MatchMode::Suffix => self.scan(kind.attribute(), |v| v.ends_with(value)),
        }
    }

    /// `find_by` for a full locator; `None` when the locator has no selector
    pub fn find(&self, by: &By) -> Option<Element> {
        by.selector.and_then(|kind| self.find_by(kind, &by.value))
    }

    fn by_exact(&self, attribute: &str, value: &str) -> Option<Element> {
        match exact_query(attribute, value) {
            Some(query) => self.find_element(&query),
            // Both quote characters present: no literal can express it
            None => self.scan(attribute, |v| v == value),
        }
    }

    /// First node carrying a non-empty `attribute` that satisfies `predicate`
    fn scan(&self, attribute: &str, predicate: impl Fn(&str) -> bool) -> Option<Element> {
        self.find_elements(&format!("//node[@{}]", attribute))
            .into_iter()
            .find(|el| {
                let value = el.document.attribute(attribute);
                !value.is_empty() && predicate(&value)
            })
    }
}

fn exact_query(attribute: &str, value: &str) -> Option<String> {
    if !value.contains('\'') {
        Some(format!("//node[@{}='{}']", attribute, value))
    } else if !value.contains('"') {
        Some(format!("//node[@{}=\"{}\"]", attribute, value))
    } else {
        None
    }
}

/// A matched node plus its cached center.
///
/// Actions use the coordinates captured at lookup time; re-query after
/// anything that changes the screen.
#[derive(Debug, Clone)]
pub struct Element {
    document: Document,
    center: Point,
}

/// Serializable snapshot of an element's attributes
#[derive(Debug, Clone, Serialize)]
pub struct ElementInfo {
    pub text: String,
    pub content_desc: String,
    pub class_name: String,
    pub resource_id: String,
    pub checked: bool,
    pub selected: bool,
    pub index: i32,
    pub bounds: Bounds,
    pub center: Point,
}

impl Element {
    fn new(document: Document) -> Self {
        let center = document.bounds().center();
        Self { document, center }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    pub fn content_desc(&self) -> String {
        self.document.content_desc()
    }

    pub fn class_name(&self) -> String {
        self.document.class_name()
    }

    pub fn resource_id(&self) -> String {
        self.document.resource_id()
    }

    pub fn checked(&self) -> bool {
        self.document.checked()
    }

    pub fn selected(&self) -> bool {
        self.document.selected()
    }

    pub fn index(&self) -> i32 {
        self.document.index()
    }

    pub fn bounds(&self) -> Bounds {
        self.document.bounds()
    }

    /// Query beneath this element
    pub fn find_element(&self, query: &str) -> Option<Element> {
        self.document.find_element(query)
    }

    pub fn find_elements(&self, query: &str) -> Vec<Element> {
        self.document.find_elements(query)
    }

    pub fn info(&self) -> ElementInfo {
        ElementInfo {
            text: self.text(),
            content_desc: self.content_desc(),
            class_name: self.class_name(),
            resource_id: self.resource_id(),
            checked: self.checked(),
            selected: self.selected(),
            index: self.index(),
            bounds: self.bounds(),
            center: self.center,
        }
    }

    // ============ Actions ============

    pub async fn tap(&self, driver: &Driver) -> Result<()> {
        driver.tap(self.center.x, self.center.y).await
    }

    pub async fn long_tap(&self, driver: &Driver) -> Result<()> {
        driver.long_tap(self.center.x, self.center.y).await
    }

    /// Swipe across this element's bounds
    pub async fn swipe(&self, driver: &Driver, direction: Direction) -> Result<SwipePlan> {
        driver
            .swipe_in_range(
                &self.bounds(),
                direction,
                DEFAULT_SWIPE_DURATION_MS,
                ELEMENT_SWIPE_RATIO,
            )
            .await
    }

    /// Focus the element and replace its content with `text`
    pub async fn input(&self, driver: &Driver, text: &str) -> Result<()> {
        driver.input_text(self.center.x, self.center.y, text).await
    }

    pub async fn clear(&self, driver: &Driver) -> Result<()> {
        driver.clear_text().await
    }

    pub async fn editor_action(&self, driver: &Driver, action: EditorAction) -> Result<()> {
        driver.editor_action(action).await
    }
}
