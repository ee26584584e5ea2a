use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DriverError;

/// The twelve ways an element can be located.
///
/// Wire names are kebab-case (`"text"`, `"starts-with-resource-id"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorKind {
    Text,
    ContentDesc,
    Class,
    ResourceId,
    StartsWithText,
    StartsWithContentDesc,
    StartsWithClass,
    StartsWithResourceId,
    EndsWithText,
    EndsWithContentDesc,
    EndsWithClass,
    EndsWithResourceId,
}

/// How a selector compares an attribute against its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    Prefix,
    Suffix,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 12] = [
        SelectorKind::Text,
        SelectorKind::ContentDesc,
        SelectorKind::Class,
        SelectorKind::ResourceId,
        SelectorKind::StartsWithText,
        SelectorKind::StartsWithContentDesc,
        SelectorKind::StartsWithClass,
        SelectorKind::StartsWithResourceId,
        SelectorKind::EndsWithText,
        SelectorKind::EndsWithContentDesc,
        SelectorKind::EndsWithClass,
        SelectorKind::EndsWithResourceId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorKind::Text => "text",
            SelectorKind::ContentDesc => "content-desc",
            SelectorKind::Class => "class",
            SelectorKind::ResourceId => "resource-id",
            SelectorKind::StartsWithText => "starts-with-text",
            SelectorKind::StartsWithContentDesc => "starts-with-content-desc",
            SelectorKind::StartsWithClass => "starts-with-class",
            SelectorKind::StartsWithResourceId => "starts-with-resource-id",
            SelectorKind::EndsWithText => "ends-with-text",
            SelectorKind::EndsWithContentDesc => "ends-with-content-desc",
            SelectorKind::EndsWithClass => "ends-with-class",
            SelectorKind::EndsWithResourceId => "ends-with-resource-id",
        }
    }

    /// Hierarchy attribute this selector inspects
    pub fn attribute(&self) -> &'static str {
        match self {
            SelectorKind::Text | SelectorKind::StartsWithText | SelectorKind::EndsWithText => {
                "text"
            }
            SelectorKind::ContentDesc
            | SelectorKind::StartsWithContentDesc
            | SelectorKind::EndsWithContentDesc => "content-desc",
            SelectorKind::Class | SelectorKind::StartsWithClass | SelectorKind::EndsWithClass => {
                "class"
            }
            SelectorKind::ResourceId
            | SelectorKind::StartsWithResourceId
            | SelectorKind::EndsWithResourceId => "resource-id",
        }
    }

    pub fn match_mode(&self) -> MatchMode {
        match self {
            SelectorKind::Text
            | SelectorKind::ContentDesc
            | SelectorKind::Class
            | SelectorKind::ResourceId => MatchMode::Exact,
            SelectorKind::StartsWithText
            | SelectorKind::StartsWithContentDesc
            | SelectorKind::StartsWithClass
            | SelectorKind::StartsWithResourceId => MatchMode::Prefix,
            SelectorKind::EndsWithText
            | SelectorKind::EndsWithContentDesc
            | SelectorKind::EndsWithClass
            | SelectorKind::EndsWithResourceId => MatchMode::Suffix,
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorKind {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SelectorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DriverError::UnknownSelector(s.to_string()))
    }
}

/// A locator request: which selector, the value it matches, and how long to
/// keep polling (0 means the configured default).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct By {
    #[serde(default, deserialize_with = "deserialize_selector")]
    pub selector: Option<SelectorKind>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub timeout_ms: u64,
}

impl By {
    pub fn new(selector: SelectorKind, value: impl Into<String>) -> Self {
        Self {
            selector: Some(selector),
            value: value.into(),
            timeout_ms: 0,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Text, value)
    }

    pub fn content_desc(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::ContentDesc, value)
    }

    pub fn class(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Class, value)
    }

    pub fn resource_id(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::ResourceId, value)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }
}

/// Empty or missing selector names map to `None`; unknown names are rejected.
fn deserialize_selector<'de, D>(deserializer: D) -> Result<Option<SelectorKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_from_str() {
        for kind in SelectorKind::ALL {
            assert_eq!(kind.as_str().parse::<SelectorKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!(matches!(
            "xpath".parse::<SelectorKind>(),
            Err(DriverError::UnknownSelector(_))
        ));
    }

    #[test]
    fn test_attribute_and_mode() {
        assert_eq!(SelectorKind::EndsWithResourceId.attribute(), "resource-id");
        assert_eq!(SelectorKind::EndsWithResourceId.match_mode(), MatchMode::Suffix);
        assert_eq!(SelectorKind::StartsWithContentDesc.attribute(), "content-desc");
        assert_eq!(SelectorKind::Class.match_mode(), MatchMode::Exact);
    }

    #[test]
    fn test_by_deserialization() {
        let by: By = serde_json::from_str(r#"{"selector":"text","value":"OK"}"#).unwrap();
        assert_eq!(by, By::text("OK"));

        let empty: By = serde_json::from_str(r#"{"selector":"","value":"OK"}"#).unwrap();
        assert_eq!(empty.selector, None);

        let missing: By = serde_json::from_str(r#"{"value":"OK","timeout_ms":250}"#).unwrap();
        assert_eq!(missing.selector, None);
        assert_eq!(missing.timeout_ms, 250);

        assert!(serde_json::from_str::<By>(r#"{"selector":"bogus"}"#).is_err());
    }
}
