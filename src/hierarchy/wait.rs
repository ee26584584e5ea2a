use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::document::Element;
use super::selector::By;
use crate::device::Driver;
use crate::error::{DriverError, Result};

impl Driver {
    /// Poll fresh hierarchy snapshots until `by` matches or its timeout elapses.
    ///
    /// A locator without a selector fails immediately with `SelectorEmpty`.
    pub async fn wait_element(&self, by: &By) -> Result<Element> {
        let kind = by.selector.ok_or(DriverError::SelectorEmpty)?;
        let wait = &self.config().wait;
        let timeout = if by.timeout_ms == 0 {
            wait.default_timeout
        } else {
            Duration::from_millis(by.timeout_ms)
        };

        let deadline = Instant::now() + timeout;
        let mut attempts = 0u32;

        while Instant::now() < deadline {
            attempts += 1;
            if let Some(document) = self.document().await {
                if let Some(element) = document.find_by(kind, &by.value) {
                    tracing::debug!(selector = %kind, value = %by.value, attempts, "Element found");
                    return Ok(element);
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            sleep(wait.poll_interval.min(remaining)).await;
        }

        tracing::debug!(
            selector = %kind,
            value = %by.value,
            attempts,
            timeout_ms = timeout.as_millis() as u64,
            "Element not found before deadline"
        );
        Err(DriverError::ElementNotFound)
    }
}
