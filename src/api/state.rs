use std::time::Instant;
use tokio::sync::{Mutex, MutexGuard};

use crate::device::Driver;

/// Shared application state
pub struct AppState {
    pub driver: Driver,

    /// Serialises device access so overlapping requests never interleave
    /// commands on the same device
    device_lock: Mutex<()>,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(driver: Driver) -> Self {
        Self {
            driver,
            device_lock: Mutex::new(()),
            started_at: Instant::now(),
        }
    }

    /// Hold this for the whole of a request that touches the device
    pub async fn lock_device(&self) -> MutexGuard<'_, ()> {
        self.device_lock.lock().await
    }
}
