//! Shared helpers for integration tests: a scripted command runner and a
//! driver wired to a wiremock automation service.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::{Child, Command};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use android_uiauto::config::DriverConfig;
use android_uiauto::device::{CommandRunner, ExecutionMode, Session};
use android_uiauto::{Driver, DriverError, Result};

pub const RPC_PATH: &str = "/jsonrpc/0";

pub fn fixture_xml() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    std::fs::read_to_string(format!("{}/tests/fixtures/hierarchy.xml", manifest_dir))
        .expect("fixture readable")
}

#[derive(Clone)]
enum Reply {
    Output(String),
    Failure(String),
}

/// In-memory `CommandRunner` that answers by command prefix and records every
/// call as `"command arg1 arg2 ..."`
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<Vec<(String, Reply)>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer commands starting with `prefix` with `output`
    pub fn reply(&self, prefix: &str, output: &str) {
        self.set(prefix, Reply::Output(output.to_string()));
    }

    /// Fail commands starting with `prefix`, with `output` as combined output
    pub fn fail(&self, prefix: &str, output: &str) {
        self.set(prefix, Reply::Failure(output.to_string()));
    }

    fn set(&self, prefix: &str, reply: Reply) {
        let mut replies = self.replies.lock().unwrap();
        replies.retain(|(p, _)| p != prefix);
        replies.insert(0, (prefix.to_string(), reply));
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|l| l.starts_with(prefix)).count()
    }

    fn answer(&self, line: String) -> Result<String> {
        self.log.lock().unwrap().push(line.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Output(output)) => Ok(output.trim().to_string()),
            Some(Reply::Failure(output)) => Err(DriverError::CommandFailed {
                command: line,
                code: Some(1),
                output,
            }),
            None => Ok(String::new()),
        }
    }
}

fn join(command: &str, args: &[String]) -> String {
    std::iter::once(command.to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str, args: &[String]) -> Result<String> {
        self.answer(join(command, args))
    }

    async fn relay(&self, args: &[String]) -> Result<String> {
        self.answer(join("adb", args))
    }

    async fn spawn(&self, command: &str, args: &[String]) -> Result<Child> {
        self.log
            .lock()
            .unwrap()
            .push(format!("spawn {}", join(command, args)));
        Ok(Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .expect("sleep available"))
    }
}

pub struct Harness {
    pub driver: Driver,
    pub runner: Arc<ScriptedRunner>,
    pub server: MockServer,
}

pub fn config_for(server: &MockServer) -> DriverConfig {
    let mut config = DriverConfig {
        mode: ExecutionMode::Remote,
        ..DriverConfig::default()
    };
    config.service.host = Some("127.0.0.1".to_string());
    config.service.port = server.address().port();
    config.service.rpc_path = RPC_PATH.to_string();
    config.wait.poll_interval = Duration::from_millis(100);
    config
}

/// Driver over a scripted runner, with the service answering `xml`
pub async fn harness_with(xml: &str) -> Harness {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": format!("\n{}\n", xml),
        })))
        .mount(&server)
        .await;

    build(server).await
}

pub async fn harness() -> Harness {
    harness_with(&fixture_xml()).await
}

/// Driver whose automation service is already mounted by the caller
pub async fn build(server: MockServer) -> Harness {
    let runner = ScriptedRunner::new();
    let config = config_for(&server);
    let session = Arc::new(Session::from_config(&config));
    let driver = Driver::with_runner(config, session, runner.clone()).expect("driver");

    Harness {
        driver,
        runner,
        server,
    }
}

/// `netstat -anp` output showing the service listening with `pid`
pub fn netstat_with_listener(port: u16, pid: u32) -> String {
    format!(
        "Proto Recv-Q Send-Q Local Address Foreign Address State PID/Program name\n\
         tcp6 0 0 :::{} :::* LISTEN {}/app_process\n",
        port, pid
    )
}
