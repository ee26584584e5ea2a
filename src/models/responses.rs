use serde::Serialize;

use crate::device::ExecutionMode;
use crate::hierarchy::ElementInfo;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub mode: ExecutionMode,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub mode: ExecutionMode,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct HierarchyResponse {
    pub xml: String,
}

#[derive(Debug, Serialize)]
pub struct ElementActionResponse {
    pub element: ElementInfo,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct GenericResponse {
    pub status: String,
}

impl GenericResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
