//! Hierarchy and element handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::error::{DriverError, Result};
use crate::hierarchy::{By, Document, ElementInfo};
use crate::models::{
    ElementAction, ElementActionRequest, ElementActionResponse, FindRequest, HierarchyResponse,
};

pub async fn get_hierarchy(State(state): State<Arc<AppState>>) -> Result<Json<HierarchyResponse>> {
    let _guard = state.lock_device().await;
    let xml = state.driver.dump().await?;
    Ok(Json(HierarchyResponse { xml }))
}

/// Evaluate a path query against a fresh snapshot
pub async fn find_elements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FindRequest>,
) -> Result<Json<Vec<ElementInfo>>> {
    let _guard = state.lock_device().await;

    // Unlike `Driver::find_elements`, dump and query failures are reported
    let xml = state.driver.dump().await?;
    let document = Document::parse(&xml)?;
    let elements = document.try_find_elements(&request.xpath)?;

    Ok(Json(elements.iter().map(|e| e.info()).collect()))
}

pub async fn wait_element(
    State(state): State<Arc<AppState>>,
    Json(by): Json<By>,
) -> Result<Json<ElementInfo>> {
    let _guard = state.lock_device().await;
    let element = state.driver.wait_element(&by).await?;
    Ok(Json(element.info()))
}

/// Wait for an element, then act on it
pub async fn element_action(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ElementActionRequest>,
) -> Result<Json<ElementActionResponse>> {
    let _guard = state.lock_device().await;
    let driver = &state.driver;

    let element = driver.wait_element(&request.by).await?;
    tracing::info!(
        action = ?request.action,
        selector = ?request.by.selector,
        value = %request.by.value,
        "Acting on element"
    );

    match request.action {
        ElementAction::Tap => element.tap(driver).await?,
        ElementAction::LongTap => element.long_tap(driver).await?,
        ElementAction::Swipe => {
            let direction = request
                .direction
                .ok_or_else(|| missing("direction", "swipe"))?;
            element.swipe(driver, direction).await?;
        }
        ElementAction::Input => {
            let text = request.text.as_deref().ok_or_else(|| missing("text", "input"))?;
            element.input(driver, text).await?;
        }
        ElementAction::Clear => element.clear(driver).await?,
        ElementAction::EditorAction => {
            let action = request
                .editor_action
                .ok_or_else(|| missing("editor_action", "editor_action"))?;
            element.editor_action(driver, action).await?;
        }
    }

    Ok(Json(ElementActionResponse {
        element: element.info(),
        status: "ok".to_string(),
    }))
}

fn missing(field: &str, action: &str) -> DriverError {
    DriverError::InvalidRequest(format!("`{}` is required for `{}`", field, action))
}
