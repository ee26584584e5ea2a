use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Child;
use tokio::sync::Mutex;

use super::request::{RequestEngine, Requester};
use crate::config::ServiceConfig;
use crate::device::CommandRunner;
use crate::error::{DriverError, Result};

pub const DUMP_METHOD: &str = "dumpWindowHierarchy";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    /// Uncompressed dump, depth-limited to 50
    pub fn dump_hierarchy() -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: DUMP_METHOD.to_string(),
            params: vec![Value::Bool(false), Value::from(50)],
        }
    }
}

/// Handle for a service process this bridge launched
struct ServiceProcess {
    child: Child,
    started_at: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub running: bool,
    /// True when the running service was launched by this process
    pub owned: bool,
    /// Device-side PID, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_ms: Option<u64>,
}

/// Keeps the on-device automation service alive and fetches dumps from it.
///
/// Liveness is answered from the launched process handle first; the port scan
/// is only consulted for services started elsewhere.
pub struct ServiceBridge {
    runner: Arc<dyn CommandRunner>,
    engine: RequestEngine,
    config: ServiceConfig,
    process: Mutex<Option<ServiceProcess>>,
}

impl ServiceBridge {
    pub fn new(runner: Arc<dyn CommandRunner>, engine: RequestEngine, config: ServiceConfig) -> Self {
        Self {
            runner,
            engine,
            config,
            process: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn endpoint(&self, host: &str) -> String {
        format!("http://{}:{}{}", host, self.config.port, self.config.rpc_path)
    }

    pub async fn status(&self) -> ServiceStatus {
        {
            let mut guard = self.process.lock().await;
            if let Some(process) = guard.as_mut() {
                match process.child.try_wait() {
                    Ok(None) => {
                        return ServiceStatus {
                            running: true,
                            owned: true,
                            pid: None,
                            uptime_ms: Some(process.started_at.elapsed().as_millis() as u64),
                        }
                    }
                    Ok(Some(exit)) => {
                        tracing::info!(%exit, "Automation service exited");
                        *guard = None;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to poll automation service: {}", e);
                        *guard = None;
                    }
                }
            }
        }

        match self.scan_listener().await {
            Some(listener) => ServiceStatus {
                running: true,
                owned: false,
                pid: listener.pid,
                uptime_ms: None,
            },
            None => ServiceStatus {
                running: false,
                owned: false,
                pid: None,
                uptime_ms: None,
            },
        }
    }

    pub async fn is_running(&self) -> bool {
        self.status().await.running
    }

    /// Terminate the service; a no-op when nothing is running
    pub async fn stop(&self) {
        let owned = self.process.lock().await.take();

        if let Some(Listener { pid: Some(pid) }) = self.scan_listener().await {
            tracing::info!(pid, "Stopping automation service");
            if let Err(e) = self.runner.run("kill", &[pid.to_string()]).await {
                tracing::warn!(pid, "Failed to kill automation service: {}", e);
            }
        }

        if let Some(mut process) = owned {
            if process.child.start_kill().is_ok() {
                let _ = process.child.wait().await;
            }
        }
    }

    /// (Re)launch the service in the background
    pub async fn start(&self) -> Result<()> {
        self.stop().await;

        let classpath = format!("CLASSPATH={}", self.config.jar_path);
        let args = vec![
            "app_process".to_string(),
            "/".to_string(),
            self.config.main_class.clone(),
        ];
        let child = self.runner.spawn(&classpath, &args).await?;
        tracing::info!(local_pid = ?child.id(), "Automation service launched");

        *self.process.lock().await = Some(ServiceProcess {
            child,
            started_at: Instant::now(),
        });
        Ok(())
    }

    /// Fetch the window hierarchy from the service at `host`, starting it first
    /// if needed
    pub async fn dump(&self, host: &str) -> Result<String> {
        if !self.is_running().await {
            tracing::info!("Automation service not running, starting it");
            self.start().await?;
        }

        let body = serde_json::to_value(JsonRpcRequest::dump_hierarchy())?;
        let response = self
            .engine
            .request(Requester::post(self.endpoint(host)).json(body))
            .await?;

        let result = response
            .get("result")
            .and_then(Value::as_str)
            .ok_or(DriverError::MissingField("result"))?;
        Ok(result.trim().to_string())
    }

    async fn scan_listener(&self) -> Option<Listener> {
        let args = vec!["-anp".to_string(), "2>/dev/null".to_string()];
        let output = match self.runner.run("netstat", &args).await {
            Ok(output) => output,
            Err(e) => e.output().map(str::to_string).unwrap_or_default(),
        };
        parse_listener(&output, self.config.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Listener {
    pid: Option<u32>,
}

/// Find the socket bound locally to `port` in `netstat -anp` output.
///
/// Only the local address column is matched, and a `LISTEN` row wins over
/// any other socket bound to the same port.
fn parse_listener(output: &str, port: u16) -> Option<Listener> {
    let port = port.to_string();
    let bound: Vec<Vec<&str>> = output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| {
            fields
                .get(3)
                .and_then(|local| local.rsplit_once(':'))
                .is_some_and(|(_, p)| p == port)
        })
        .collect();

    let fields = bound
        .iter()
        .find(|fields| fields.contains(&"LISTEN"))
        .or_else(|| bound.first())?;

    let pid = fields
        .last()
        .and_then(|program| program.split('/').next())
        .and_then(|p| p.parse().ok());
    Some(Listener { pid })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETSTAT: &str = "\
Proto Recv-Q Send-Q Local Address           Foreign Address         State       PID/Program name
tcp        0      0 127.0.0.1:5037          0.0.0.0:*               LISTEN      812/adbd
tcp6       0      0 :::9008                 :::*                    LISTEN      4321/app_process
";

    #[test]
    fn test_parse_listener_extracts_pid() {
        assert_eq!(parse_listener(NETSTAT, 9008), Some(Listener { pid: Some(4321) }));
        assert_eq!(parse_listener(NETSTAT, 5037), Some(Listener { pid: Some(812) }));
    }

    #[test]
    fn test_parse_listener_ignores_longer_ports() {
        let output = "tcp 0 0 0.0.0.0:90081 0.0.0.0:* LISTEN 99/other";
        assert_eq!(parse_listener(output, 9008), None);
        assert_eq!(parse_listener("", 9008), None);
    }

    #[test]
    fn test_parse_listener_ignores_client_connections() {
        let output = "\
tcp        0      0 127.0.0.1:43120         127.0.0.1:9008          TIME_WAIT   -
tcp        0      0 127.0.0.1:43122         127.0.0.1:9008          ESTABLISHED 777/curl
tcp6       0      0 :::9008                 :::*                    LISTEN      4321/app_process
";
        assert_eq!(parse_listener(output, 9008), Some(Listener { pid: Some(4321) }));

        let clients_only = "tcp 0 0 127.0.0.1:43122 127.0.0.1:9008 ESTABLISHED 777/curl";
        assert_eq!(parse_listener(clients_only, 9008), None);
    }

    #[test]
    fn test_parse_listener_without_pid() {
        let output = "tcp6 0 0 :::9008 :::* LISTEN -";
        assert_eq!(parse_listener(output, 9008), Some(Listener { pid: None }));
    }

    #[test]
    fn test_dump_request_body() {
        let body = serde_json::to_value(JsonRpcRequest::dump_hierarchy()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "dumpWindowHierarchy",
                "params": [false, 50]
            })
        );

        let decoded: JsonRpcRequest = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.method, DUMP_METHOD);
        assert_eq!(decoded.params, vec![Value::Bool(false), Value::from(50)]);
    }
}
