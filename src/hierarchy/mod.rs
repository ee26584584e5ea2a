//! Window-hierarchy model
//!
//! Turns the XML dump returned by the on-device automation service into a
//! queryable tree.
//!
//! ## Architecture
//!
//! - `parser` - quick-xml event loop building an arena `Tree`
//! - `query` - path-query parser and evaluator over the arena
//! - `Document` / `Element` - snapshot handles with attribute accessors, the
//!   twelve selector finders and element-level actions
//! - `By` / `SelectorKind` - locator passed to `Driver::wait_element`
//! - `wait` - deadline-bounded polling for a locator
//!
//! ## Example
//!
//! ```rust,ignore
//! use android_uiauto::hierarchy::By;
//!
//! let element = driver.wait_element(&By::text("Settings")).await?;
//! element.tap(&driver).await?;
//! ```

pub mod document;
pub mod parser;
pub mod query;
pub mod selector;
pub mod types;
mod wait;

pub use document::{Document, Element, ElementInfo};
pub use query::Query;
pub use selector::{By, MatchMode, SelectorKind};
pub use types::{Bounds, Node, NodeId, Point, Tree};
