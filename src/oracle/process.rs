// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Oracle backed by a local command (`ollama run <model> <prompt>` by default)

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::{AbortHandle, JoinError};
use tracing::{debug, warn};

use super::{normalize_reply, OracleError, TextOracle};
use crate::cancel::CancelToken;
use crate::config::OracleConfig;

/// Spawns one process per prompt and enforces a wall-clock timeout
pub struct ProcessOracle {
    command: String,
    args: Vec<String>,
    model: String,
    timeout: Duration,
}

impl ProcessOracle {
    pub fn new(config: &OracleConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Check that the command can be launched at all
    pub async fn is_installed(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .is_ok()
    }

    /// Kill the child's process group, then kill and reap the child itself
    async fn terminate(child: &mut Child, pid: Option<u32>) {
        if let Some(pid) = pid {
            kill_group(pid).await;
        }
        if let Err(e) = child.kill().await {
            warn!("Failed to kill oracle process: {}", e);
        }
    }
}

/// How long output pipes may stay open after the oracle process exits
const PIPE_GRACE: Duration = Duration::from_secs(2);

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
async fn kill_group(pid: u32) {
    let killed = Command::new("kill")
        .args(["-KILL", "--", &format!("-{}", pid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = killed {
        debug!("Could not signal process group {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
async fn kill_group(_pid: u32) {}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

fn joined(read: std::result::Result<std::io::Result<Vec<u8>>, JoinError>) -> std::io::Result<Vec<u8>> {
    read.map_err(std::io::Error::other)?
}

#[async_trait]
impl TextOracle for ProcessOracle {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn generate(
        &self,
        prompt: &str,
        cancel: &CancelToken,
    ) -> Result<String, OracleError> {
        if cancel.is_cancelled() {
            return Err(OracleError::Cancelled);
        }

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers the command starts can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| OracleError::Process(format!("failed to spawn {}: {}", self.command, e)))?;

        let pid = child.id();
        debug!("Spawned oracle process {:?} for model {}", pid, self.model);

        let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));

        let outcome = tokio::select! {
            waited = tokio::time::timeout(self.timeout, child.wait()) => Some(waited),
            _ = cancel.cancelled() => None,
        };

        let status = match outcome {
            Some(Ok(status)) => status,
            Some(Err(_elapsed)) => {
                Self::terminate(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(OracleError::Timeout(self.timeout));
            }
            None => {
                Self::terminate(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(OracleError::Cancelled);
            }
        };

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                stdout_task.abort();
                stderr_task.abort();
                return Err(OracleError::Process(format!("wait failed: {}", e)));
            }
        };

        // A descendant that inherited stdout keeps the pipe open after exit.
        let aborts = [stdout_task.abort_handle(), stderr_task.abort_handle()];
        let drain = async { tokio::join!(stdout_task, stderr_task) };
        tokio::pin!(drain);

        let (stdout, stderr) = match tokio::time::timeout(PIPE_GRACE, &mut drain).await {
            Ok(read) => read,
            Err(_elapsed) => {
                warn!("Oracle process exited but its output is still held open; killing its process group");
                if let Some(pid) = pid {
                    kill_group(pid).await;
                }
                match tokio::time::timeout(PIPE_GRACE, &mut drain).await {
                    Ok(read) => read,
                    Err(_elapsed) => {
                        aborts.iter().for_each(AbortHandle::abort);
                        return Err(OracleError::Process(
                            "output still held open after the process exited".to_string(),
                        ));
                    }
                }
            }
        };

        let stdout =
            joined(stdout).map_err(|e| OracleError::Process(format!("reading stdout failed: {}", e)))?;
        let stderr = joined(stderr).unwrap_or_default();

        if !status.success() {
            warn!(
                "Oracle command exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            );
            return Err(OracleError::Process(format!("exited with {}", status)));
        }

        normalize_reply(&String::from_utf8_lossy(&stdout))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::oracle::{invoke, FailureKind};
    use std::time::Instant;

    /// `sh -c <script> <model> <prompt>`: the script sees the prompt as `$1`
    fn shell(script: &str, timeout: Duration) -> ProcessOracle {
        let config = OracleConfig {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            model: "test-model".to_string(),
            ..OracleConfig::default()
        };
        ProcessOracle::new(&config).with_timeout(timeout)
    }

    fn process_alive(pid: &str) -> bool {
        std::process::Command::new("kill")
            .args(["-0", pid])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Alive and not a zombie waiting for an unrelated reaper
    fn process_running(pid: &str) -> bool {
        std::process::Command::new("ps")
            .args(["-o", "stat=", "-p", pid])
            .output()
            .map(|o| {
                let stat = String::from_utf8_lossy(&o.stdout);
                o.status.success() && !stat.trim().is_empty() && !stat.trim().starts_with('Z')
            })
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_success_strips_stdout() {
        let oracle = shell(r#"printf '  %s\n\n' "$1""#, Duration::from_secs(10));
        let result = invoke(&oracle, "hello oracle", &CancelToken::never()).await;

        assert!(result.succeeded);
        assert_eq!(result.raw_text, "hello oracle");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_process_error() {
        let oracle = shell("echo boom >&2; exit 3", Duration::from_secs(10));
        let result = invoke(&oracle, "prompt", &CancelToken::never()).await;

        assert!(!result.succeeded);
        assert_eq!(result.failure_kind, Some(FailureKind::ProcessError));
        assert!(result.raw_text.is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_output_is_empty_response() {
        let oracle = shell("printf '  \\n\\t\\n'", Duration::from_secs(10));
        let result = invoke(&oracle, "prompt", &CancelToken::never()).await;

        assert_eq!(result.failure_kind, Some(FailureKind::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_binary_is_process_error() {
        let config = OracleConfig {
            command: "/nonexistent/oracle-binary".to_string(),
            ..OracleConfig::default()
        };
        let oracle = ProcessOracle::new(&config);
        let result = invoke(&oracle, "prompt", &CancelToken::never()).await;

        assert_eq!(result.failure_kind, Some(FailureKind::ProcessError));
        assert!(!oracle.is_installed().await);
    }

    #[tokio::test]
    async fn test_launchable_command_is_installed() {
        let oracle = shell("exit 0", Duration::from_secs(10));
        assert!(oracle.is_installed().await);
    }

    #[tokio::test]
    async fn test_background_helper_holding_stdout_does_not_stall() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("helper");
        let script = format!("sleep 30 & echo $! > '{}'; echo answer", pid_file.display());
        let oracle = shell(&script, Duration::from_secs(60));

        let started = Instant::now();
        let result = invoke(&oracle, "prompt", &CancelToken::never()).await;

        assert!(started.elapsed() < Duration::from_secs(15));
        assert!(result.succeeded);
        assert_eq!(result.raw_text, "answer");

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let mut running = process_running(pid.trim());
        for _ in 0..20 {
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            running = process_running(pid.trim());
        }
        assert!(!running);
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
        let oracle = shell(&script, Duration::from_millis(500));

        let started = Instant::now();
        let result = invoke(&oracle, "prompt", &CancelToken::never()).await;

        assert_eq!(result.failure_kind, Some(FailureKind::Timeout));
        assert!(started.elapsed() < Duration::from_secs(10));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!process_alive(pid.trim()));
    }

    #[tokio::test]
    async fn test_cancel_kills_in_flight_process() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
        let oracle = shell(&script, Duration::from_secs(60));

        let (tx, cancel) = CancelToken::new();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = tx.send(true);
        });

        let started = Instant::now();
        let result = invoke(&oracle, "prompt", &cancel).await;
        canceller.await.unwrap();

        assert_eq!(result.failure_kind, Some(FailureKind::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!process_alive(pid.trim()));
    }

    #[tokio::test]
    async fn test_already_cancelled_does_not_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let oracle = shell(&format!("touch '{}'", marker.display()), Duration::from_secs(10));

        let (tx, cancel) = CancelToken::new();
        tx.send(true).unwrap();

        let result = invoke(&oracle, "prompt", &cancel).await;
        assert_eq!(result.failure_kind, Some(FailureKind::Cancelled));
        assert!(!marker.exists());
    }
}
