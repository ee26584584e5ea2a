use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::device::ExecutionMode;

pub const DEFAULT_ADB_KEYBOARD: &str = "com.android.starime/.StarIME";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub driver: DriverConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("UIAUTO_PORT").unwrap_or(8765),
            host: env::var("UIAUTO_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            driver: DriverConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8765,
            host: "127.0.0.1".to_string(),
            driver: DriverConfig::default(),
        }
    }
}

/// Everything the driver needs to reach a device: how commands run, where the
/// automation service listens, and how long element waits poll.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub mode: ExecutionMode,
    /// Shell used to run commands in co-located mode
    pub shell: String,
    /// Relay executable used in remote mode
    pub relay: String,
    /// Device serial to target before `connect` is called
    pub device: Option<String>,
    /// IME id of the broadcast-driven text input keyboard
    pub adb_keyboard: String,
    pub transport: TransportConfig,
    pub service: ServiceConfig,
    pub wait: WaitConfig,
}

impl DriverConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: parse_var("UIAUTO_MODE").unwrap_or(defaults.mode),
            shell: env::var("UIAUTO_SHELL").unwrap_or(defaults.shell),
            relay: env::var("UIAUTO_RELAY").unwrap_or(defaults.relay),
            device: env::var("UIAUTO_DEVICE").ok().filter(|d| !d.is_empty()),
            adb_keyboard: env::var("UIAUTO_ADB_KEYBOARD").unwrap_or(defaults.adb_keyboard),
            transport: TransportConfig::from_env(),
            service: ServiceConfig::from_env(),
            wait: WaitConfig::from_env(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::detect(),
            shell: default_shell().to_string(),
            relay: "adb".to_string(),
            device: None,
            adb_keyboard: DEFAULT_ADB_KEYBOARD.to_string(),
            transport: TransportConfig::default(),
            service: ServiceConfig::default(),
            wait: WaitConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub keep_alive: Duration,
    /// Nameserver used for every hostname lookup made by the request engine
    pub dns_server: SocketAddr,
}

impl TransportConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            connect_timeout: parse_millis("UIAUTO_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.connect_timeout),
            keep_alive: parse_millis("UIAUTO_KEEP_ALIVE_MS").unwrap_or(defaults.keep_alive),
            dns_server: parse_var("UIAUTO_DNS_SERVER").unwrap_or(defaults.dns_server),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            keep_alive: Duration::from_secs(30),
            dns_server: SocketAddr::from(([114, 114, 114, 114], 53)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub rpc_path: String,
    /// Overrides the resolved device IP (e.g. `127.0.0.1` after `adb forward`)
    pub host: Option<String>,
    pub jar_path: String,
    pub main_class: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("UIAUTO_SERVICE_PORT").unwrap_or(defaults.port),
            rpc_path: env::var("UIAUTO_SERVICE_PATH").unwrap_or(defaults.rpc_path),
            host: env::var("UIAUTO_SERVICE_HOST").ok().filter(|h| !h.is_empty()),
            jar_path: env::var("UIAUTO_SERVICE_JAR").unwrap_or(defaults.jar_path),
            main_class: env::var("UIAUTO_SERVICE_MAIN").unwrap_or(defaults.main_class),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 9008,
            rpc_path: "/jsonrpc/0".to_string(),
            host: None,
            jar_path: "/data/local/tmp/u2.jar".to_string(),
            main_class: "com.wetest.uia2.Main".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Applied when a `By` carries a zero timeout
    pub default_timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_timeout: parse_millis("UIAUTO_WAIT_TIMEOUT_MS")
                .unwrap_or(defaults.default_timeout),
            poll_interval: parse_millis("UIAUTO_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval),
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_millis(10_000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

pub fn default_shell() -> &'static str {
    if cfg!(target_os = "android") {
        "sh"
    } else if cfg!(target_os = "windows") {
        "powershell"
    } else {
        "bash"
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_millis(name: &str) -> Option<Duration> {
    parse_var::<u64>(name).map(Duration::from_millis)
}
