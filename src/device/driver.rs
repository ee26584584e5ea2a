use anyhow::anyhow;
use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::dispatcher::{CommandRunner, Dispatcher};
use super::session::Session;
use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::hierarchy::{Document, Element};
use crate::rpc::{RequestEngine, ServiceBridge};

/// Reported by `device_ip` when the IP lookup command itself fails
pub const UNKNOWN_IP: &str = "unknown";

/// Device automation facade
///
/// One cheap-to-clone handle over the session, the command runner and the
/// automation-service bridge. Gesture and text input live in `input.rs`,
/// element waits in `hierarchy::wait`.
pub struct Driver {
    config: Arc<DriverConfig>,
    session: Arc<Session>,
    runner: Arc<dyn CommandRunner>,
    bridge: Arc<ServiceBridge>,
}

impl Driver {
    /// Create a driver that executes commands through adb or the local shell
    pub fn new(config: DriverConfig) -> Result<Self> {
        let session = Arc::new(Session::from_config(&config));
        let runner: Arc<dyn CommandRunner> = Arc::new(Dispatcher::new(Arc::clone(&session)));
        Self::with_runner(config, session, runner)
    }

    /// Create a driver over a caller-supplied command runner
    pub fn with_runner(
        config: DriverConfig,
        session: Arc<Session>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let engine = RequestEngine::new(&config.transport)?;
        let bridge = ServiceBridge::new(Arc::clone(&runner), engine, config.service.clone());

        Ok(Self {
            config: Arc::new(config),
            session,
            runner,
            bridge: Arc::new(bridge),
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn bridge(&self) -> &ServiceBridge {
        &self.bridge
    }

    /// Run a device command, returning its trimmed output
    pub async fn run<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        self.runner.run(command, &args).await
    }

    // ============ Session lifecycle ============

    /// Select `device` as the target, validating it against `adb devices`.
    ///
    /// Co-located sessions have no relay and always target the local device.
    pub async fn connect(&self, device: &str) -> Result<()> {
        if self.session.is_co_located() {
            self.session.set_device(None).await;
            return self.initialize().await;
        }

        let listing = self.runner.relay(&["devices".to_string()]).await?;
        let serial = select_device(&listing, device)?;
        tracing::info!(device = %serial, "Connected to device");

        self.session.set_device(Some(serial)).await;
        self.initialize().await
    }

    /// Start the automation service and remember the current input method
    /// so it can be restored later
    pub async fn initialize(&self) -> Result<()> {
        self.bridge.start().await?;

        let ime = self.current_ime().await?;
        tracing::debug!(ime = %ime, "Default input method");
        self.session.set_default_ime(Some(ime)).await;
        Ok(())
    }

    /// Restore the default keyboard and stop the automation service
    pub async fn cleanup(&self) {
        if let Err(e) = self.switch_to_default_keyboard().await {
            tracing::warn!("Failed to restore default input method: {}", e);
        }
        self.bridge.stop().await;
    }

    // ============ Device info ============

    /// IPv4 address of `wlan0`.
    ///
    /// Returns `"unknown"` when the lookup fails and `"localhost"` when the
    /// interface has no address.
    pub async fn device_ip(&self) -> String {
        static IPV4: OnceLock<Regex> = OnceLock::new();
        let re = IPV4.get_or_init(|| {
            Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("valid regex")
        });

        match self.run("ip", &["-4", "addr", "show", "wlan0"]).await {
            Ok(output) => re
                .find(&output)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "localhost".to_string()),
            Err(e) => {
                tracing::debug!("IP lookup failed: {}", e);
                UNKNOWN_IP.to_string()
            }
        }
    }

    /// Screen size in pixels as `(width, height)`
    pub async fn resolution(&self) -> Result<(i32, i32)> {
        let output = self.run("wm", &["size"]).await?;
        parse_resolution(&output)
            .ok_or_else(|| anyhow!("Unexpected `wm size` output: {}", output).into())
    }

    // ============ Hierarchy ============

    /// Host the automation service is reached on
    pub async fn service_host(&self) -> String {
        match &self.config.service.host {
            Some(host) => host.clone(),
            None => self.device_ip().await,
        }
    }

    /// Raw hierarchy dump from the automation service
    pub async fn dump(&self) -> Result<String> {
        let host = self.service_host().await;
        self.bridge.dump(&host).await
    }

    /// Fresh hierarchy snapshot; `None` when it can't be fetched or parsed
    pub async fn document(&self) -> Option<Document> {
        let xml = match self.dump().await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::debug!("Hierarchy dump failed: {}", e);
                return None;
            }
        };

        match Document::parse(&xml) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::debug!("Hierarchy dump unparseable: {}", e);
                None
            }
        }
    }

    pub async fn find_element(&self, query: &str) -> Option<Element> {
        self.document().await?.find_element(query)
    }

    pub async fn find_elements(&self, query: &str) -> Vec<Element> {
        match self.document().await {
            Some(document) => document.find_elements(query),
            None => Vec::new(),
        }
    }
}

impl Clone for Driver {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            session: Arc::clone(&self.session),
            runner: Arc::clone(&self.runner),
            bridge: Arc::clone(&self.bridge),
        }
    }
}

/// Pick `device` out of `adb devices` output
fn select_device(listing: &str, device: &str) -> Result<String> {
    if listing.contains("more than one device") {
        return Err(DriverError::MultipleDevices);
    }

    let line = listing
        .lines()
        .skip_while(|line| !line.starts_with("List of devices"))
        .skip(1)
        .find(|line| !device.is_empty() && line.contains(device))
        .ok_or(DriverError::DeviceNotFound)?;

    if line.contains("offline") {
        return Err(DriverError::DeviceOffline);
    }

    line.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or(DriverError::DeviceNotFound)
}

/// Parse `Physical size: 1080x1920`
fn parse_resolution(output: &str) -> Option<(i32, i32)> {
    let size = output.lines().next()?.split(':').nth(1)?.trim();
    let (width, height) = size.split_once('x')?;
    Some((width.trim().parse().ok()?, height.trim().parse().ok()?))
}
