use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Index of a node inside a `Tree`
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle in device pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Full-screen rectangle for a `width x height` display
    pub fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Parse a `[l,t][r,b]` bounds attribute.
    ///
    /// The first four integer runs are taken positionally; missing ones stay 0.
    pub fn parse(raw: &str) -> Self {
        static NUMBERS: OnceLock<Regex> = OnceLock::new();
        let re = NUMBERS.get_or_init(|| Regex::new(r"\d+").expect("valid regex"));

        let mut values = [0i32; 4];
        let mut found = 0;
        for (slot, m) in values.iter_mut().zip(re.find_iter(raw)) {
            *slot = m.as_str().parse().unwrap_or(0);
            found += 1;
        }
        if found < 4 && !raw.is_empty() {
            tracing::debug!(bounds = raw, found, "Malformed bounds attribute");
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2,
            (self.top + self.bottom) / 2,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }

    /// Pull a point inside the rectangle, edges included
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.max(self.left).min(self.right),
            point.y.max(self.top).min(self.bottom),
        )
    }
}

/// One element of the window hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Arena holding a parsed hierarchy.
///
/// Slot 0 is a synthetic document node with an empty name; every other node is
/// stored in document order, so comparing ids compares document positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub(crate) fn push(
        &mut self,
        parent: NodeId,
        name: String,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            name,
            attributes,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `id` followed by all of its descendants in document order
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// Number of real elements, excluding the document node
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
