use async_trait::async_trait;
use std::fmt;
use std::process::{Output, Stdio};
use std::sync::Arc;
use tokio::process::{Child, Command};

use super::session::{ExecutionMode, Session};
use crate::error::{DriverError, Result};

/// Commands the relay executes itself instead of forwarding to the device shell
pub const HOST_ONLY_COMMANDS: [&str; 9] = [
    "push",
    "pull",
    "install",
    "uninstall",
    "reboot",
    "forward",
    "reverse",
    "backup",
    "restore",
];

pub fn is_host_only(command: &str) -> bool {
    HOST_ONLY_COMMANDS.contains(&command)
}

/// Anything that can execute device commands.
///
/// `Dispatcher` is the real implementation; tests substitute a scripted runner.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion. Success yields the trimmed combined output,
    /// failure keeps the raw output in `DriverError::CommandFailed`.
    async fn run(&self, command: &str, args: &[String]) -> Result<String>;

    /// Invoke the relay directly, without selecting a device (e.g. `adb devices`)
    async fn relay(&self, args: &[String]) -> Result<String>;

    /// Launch a long-running command and hand back its process handle
    async fn spawn(&self, command: &str, args: &[String]) -> Result<Child>;
}

/// A fully resolved invocation: executable plus argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Decide how `command args...` reaches the device.
    ///
    /// - co-located: `<shell> -c "command args..."`
    /// - remote, host-only command: `<relay> -s <device> command args...`
    /// - remote, anything else: `<relay> -s <device> shell "command args..."`
    pub fn build(
        mode: ExecutionMode,
        shell: &str,
        relay: &str,
        device: Option<&str>,
        command: &str,
        args: &[String],
    ) -> Self {
        match mode {
            ExecutionMode::CoLocated => Self {
                program: shell.to_string(),
                args: vec!["-c".to_string(), join_command(command, args)],
            },
            ExecutionMode::Remote => {
                let mut relay_args = Vec::with_capacity(args.len() + 4);
                if let Some(device) = device.filter(|d| !d.is_empty()) {
                    relay_args.push("-s".to_string());
                    relay_args.push(device.to_string());
                }
                if is_host_only(command) {
                    relay_args.push(command.to_string());
                    relay_args.extend(args.iter().cloned());
                } else {
                    relay_args.push("shell".to_string());
                    relay_args.push(join_command(command, args));
                }
                Self {
                    program: relay.to_string(),
                    args: relay_args,
                }
            }
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

fn join_command(command: &str, args: &[String]) -> String {
    std::iter::once(command)
        .chain(args.iter().map(String::as_str))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Routes commands to the local shell or through the relay, depending on the
/// session's execution mode
pub struct Dispatcher {
    session: Arc<Session>,
}

impl Dispatcher {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn command_line(&self, command: &str, args: &[String]) -> CommandLine {
        let device = self.session.device().await;
        CommandLine::build(
            self.session.mode(),
            self.session.shell(),
            self.session.relay(),
            device.as_deref(),
            command,
            args,
        )
    }

    async fn execute(&self, line: CommandLine) -> Result<String> {
        tracing::debug!(command = %line, "Running command");

        let output = to_command(&line)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DriverError::Spawn {
                command: line.to_string(),
                source,
            })?;

        finish(line, output)
    }
}

#[async_trait]
impl CommandRunner for Dispatcher {
    async fn run(&self, command: &str, args: &[String]) -> Result<String> {
        let line = self.command_line(command, args).await;
        self.execute(line).await
    }

    async fn relay(&self, args: &[String]) -> Result<String> {
        let line = CommandLine {
            program: self.session.relay().to_string(),
            args: args.to_vec(),
        };
        self.execute(line).await
    }

    async fn spawn(&self, command: &str, args: &[String]) -> Result<Child> {
        let line = self.command_line(command, args).await;
        tracing::debug!(command = %line, "Launching background command");

        to_command(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| DriverError::Spawn {
                command: line.to_string(),
                source,
            })
    }
}

fn to_command(line: &CommandLine) -> Command {
    let mut cmd = Command::new(&line.program);
    cmd.args(&line.args);

    // Hide console windows for relay invocations on Windows
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);

    cmd
}

fn finish(line: CommandLine, output: Output) -> Result<String> {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(combined.trim().to_string())
    } else {
        tracing::debug!(command = %line, status = %output.status, "Command failed");
        Err(DriverError::CommandFailed {
            command: line.to_string(),
            code: output.status.code(),
            output: combined,
        })
    }
}
