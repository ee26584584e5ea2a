use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::config::DriverConfig;

/// Where commands are executed relative to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Running on the device itself; commands go straight to the local shell
    CoLocated,
    /// Running on a host; commands are relayed through adb
    Remote,
}

impl ExecutionMode {
    /// Pick the mode from the build target
    pub fn detect() -> Self {
        if cfg!(target_os = "android") {
            ExecutionMode::CoLocated
        } else {
            ExecutionMode::Remote
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "colocated" | "co_located" | "co-located" => Ok(ExecutionMode::CoLocated),
            "remote" | "adb" => Ok(ExecutionMode::Remote),
            other => Err(format!("unknown execution mode: {}", other)),
        }
    }
}

/// Per-process context shared by the dispatcher and the driver.
///
/// The mode, shell and relay are fixed at construction; the target device and
/// the cached default input method change as the session is connected and
/// initialised.
#[derive(Debug)]
pub struct Session {
    mode: ExecutionMode,
    shell: String,
    relay: String,
    device: RwLock<Option<String>>,
    default_ime: RwLock<Option<String>>,
}

impl Session {
    pub fn new(mode: ExecutionMode, shell: impl Into<String>, relay: impl Into<String>) -> Self {
        Self {
            mode,
            shell: shell.into(),
            relay: relay.into(),
            device: RwLock::new(None),
            default_ime: RwLock::new(None),
        }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        let session = Self::new(config.mode, config.shell.clone(), config.relay.clone());
        Self {
            device: RwLock::new(config.device.clone()),
            ..session
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn is_co_located(&self) -> bool {
        self.mode == ExecutionMode::CoLocated
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn relay(&self) -> &str {
        &self.relay
    }

    pub async fn device(&self) -> Option<String> {
        self.device.read().await.clone()
    }

    pub async fn set_device(&self, device: Option<String>) {
        *self.device.write().await = device;
    }

    pub async fn default_ime(&self) -> Option<String> {
        self.default_ime.read().await.clone()
    }

    pub async fn set_default_ime(&self, ime: Option<String>) {
        *self.default_ime.write().await = ime;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("local".parse::<ExecutionMode>(), Ok(ExecutionMode::CoLocated));
        assert_eq!("Remote".parse::<ExecutionMode>(), Ok(ExecutionMode::Remote));
        assert!("cloud".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn test_session_tracks_device() {
        let session = Session::new(ExecutionMode::Remote, "bash", "adb");
        tokio_test::block_on(async {
            assert_eq!(session.device().await, None);

            session.set_device(Some("emulator-5554".to_string())).await;
            assert_eq!(session.device().await.as_deref(), Some("emulator-5554"));
        });
        assert!(!session.is_co_located());
    }
}
