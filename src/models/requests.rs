use serde::Deserialize;

use crate::device::{Direction, EditorAction};
use crate::hierarchy::{Bounds, By};

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// Device serial; ignored when running on the device itself
    #[serde(default)]
    pub device: String,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PointRequest {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub direction: Direction,
    #[serde(default)]
    pub duration_ms: u64,
    pub ratio: Option<f64>,
    /// Defaults to the full screen
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Deserialize)]
pub struct FindRequest {
    pub xpath: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementAction {
    Tap,
    LongTap,
    Swipe,
    Input,
    Clear,
    EditorAction,
}

/// Wait for an element, then act on it
#[derive(Debug, Deserialize)]
pub struct ElementActionRequest {
    #[serde(flatten)]
    pub by: By,
    pub action: ElementAction,
    /// Required for `input`
    pub text: Option<String>,
    /// Required for `swipe`
    pub direction: Option<Direction>,
    /// Required for `editor_action`
    pub editor_action: Option<EditorAction>,
}
