//! Lifecycle supervisor for the out-of-process comparison backend.
//!
//! A launch walks a fixed state machine: Idle, Launching (candidate
//! resolution and spawn), Polling (bounded readiness probes), then Ready
//! or Failed. There is no restart logic; a dead backend fails the session
//! and the user relaunches the shell.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use super::BackendError;
use super::client::BackendClient;
use crate::config::ShellConfig;

/// Observable lifecycle phase of the managed backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Launching,
    Polling { attempt: u32 },
    Ready,
    Failed { reason: String },
}

pub struct ProcessSupervisor {
    config: ShellConfig,
    state: SupervisorState,
    child: Option<Child>,
    /// Set on Ready, consumed exactly once by [`take_base_url`].
    base_url: Option<String>,
}

impl ProcessSupervisor {
    pub fn new(config: ShellConfig) -> ProcessSupervisor {
        ProcessSupervisor {
            config,
            state: SupervisorState::Idle,
            child: None,
            base_url: None,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Bring the backend up and wait until it answers health probes.
    ///
    /// With `backend_url` configured the spawn is skipped and the shell
    /// attaches to the external process; it still has to pass the probe
    /// loop before the supervisor reports Ready.
    pub async fn start(&mut self) -> Result<(), BackendError> {
        let base_url = match self.config.backend_url.clone() {
            Some(url) => {
                info!(url = %url, "attaching to external backend");
                url
            }
            None => {
                self.state = SupervisorState::Launching;
                let program = match resolve_candidate(&self.config.backend_candidates) {
                    Some(path) => path,
                    None => {
                        return Err(self.fail("no backend entry point found".to_string()));
                    }
                };
                match self.spawn(&program) {
                    Ok(child) => self.child = Some(child),
                    Err(err) => {
                        return Err(self.fail(format!(
                            "cannot launch {}: {err}",
                            program.display()
                        )));
                    }
                }
                self.config.local_base_url()
            }
        };

        let client = BackendClient::new(&base_url)?;
        for attempt in 1..=self.config.health_poll_attempts {
            self.state = SupervisorState::Polling { attempt };

            // A child that already exited will never answer; bail out
            // instead of burning the remaining attempts.
            if let Some(child) = self.child.as_mut()
                && let Ok(Some(exit)) = child.try_wait()
            {
                return Err(self.fail(format!("backend exited during startup ({exit})")));
            }

            match client.health().await {
                Ok(()) => {
                    info!(attempt, url = %base_url, "backend ready");
                    self.state = SupervisorState::Ready;
                    self.base_url = Some(base_url);
                    return Ok(());
                }
                Err(err) => {
                    debug!(attempt, error = %err, "backend not ready yet");
                }
            }
            // No point sleeping once the attempt budget is spent.
            if attempt < self.config.health_poll_attempts {
                tokio::time::sleep(self.config.health_poll_interval).await;
            }
        }

        let reason = format!(
            "backend did not become ready after {} probes",
            self.config.health_poll_attempts
        );
        self.shutdown().await;
        Err(self.fail(reason))
    }

    /// Hand the ready base URL to the caller. Yields `Some` exactly once.
    pub fn take_base_url(&mut self) -> Option<String> {
        self.base_url.take()
    }

    /// Terminate the child: polite signal first, hard kill after the
    /// grace period. Idempotent; attached external backends are left alone.
    pub async fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            info!(pid, "sending SIGTERM to backend");
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            match tokio::time::timeout(self.config.kill_grace, child.wait()).await {
                Ok(Ok(status)) => {
                    info!(%status, "backend exited");
                    return;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "waiting for backend exit failed");
                    return;
                }
                Err(_) => {
                    warn!(pid, "backend ignored SIGTERM, killing");
                }
            }
        }

        if let Err(err) = child.kill().await {
            error!(error = %err, "failed to kill backend");
        }
    }

    fn fail(&mut self, reason: String) -> BackendError {
        error!(reason = %reason, "backend launch failed");
        self.state = SupervisorState::Failed {
            reason: reason.clone(),
        };
        BackendError::Unavailable(reason)
    }

    fn spawn(&self, program: &Path) -> std::io::Result<Child> {
        let mut command = if program.extension().is_some_and(|ext| ext == "py") {
            let mut cmd = Command::new("python3");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        };
        command
            .env("PYTHONUNBUFFERED", "1")
            .env("PORT", self.config.backend_port.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        info!(program = %program.display(), port = self.config.backend_port, "launching backend");
        let mut child = command.spawn()?;
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_output("backend stdout", stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_output("backend stderr", stderr));
        }
        Ok(child)
    }
}

/// First candidate that exists on disk, in declaration order.
fn resolve_candidate(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.exists()).cloned()
}

async fn forward_output(label: &'static str, stream: impl tokio::io::AsyncRead + Unpin) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(source = label, line = %line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_config() -> ShellConfig {
        ShellConfig {
            health_poll_interval: Duration::from_millis(5),
            health_poll_attempts: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_supervisor_is_idle() {
        let sup = ProcessSupervisor::new(fast_config());
        assert_eq!(*sup.state(), SupervisorState::Idle);
    }

    #[test]
    fn test_resolve_candidate_prefers_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let packaged = dir.path().join("backend");
        let script = dir.path().join("app.py");
        std::fs::write(&script, "").unwrap();
        // Only the dev script exists, so it wins despite coming second.
        let found = resolve_candidate(&[packaged.clone(), script.clone()]);
        assert_eq!(found, Some(script.clone()));
        // Once both exist the packaged executable is preferred.
        std::fs::write(&packaged, "").unwrap();
        let found = resolve_candidate(&[packaged.clone(), script]);
        assert_eq!(found, Some(packaged));
    }

    #[test]
    fn test_resolve_candidate_empty_when_nothing_exists() {
        assert_eq!(resolve_candidate(&[PathBuf::from("/nonexistent/x")]), None);
    }

    #[tokio::test]
    async fn test_start_fails_without_entry_point() {
        let mut sup = ProcessSupervisor::new(ShellConfig {
            backend_candidates: vec![PathBuf::from("/nonexistent/backend")],
            ..fast_config()
        });
        let err = sup.start().await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(matches!(sup.state(), SupervisorState::Failed { .. }));
        assert!(sup.take_base_url().is_none());
    }

    #[tokio::test]
    async fn test_take_base_url_yields_once() {
        let mut sup = ProcessSupervisor::new(fast_config());
        sup.base_url = Some("http://127.0.0.1:5000".to_string());
        assert_eq!(sup.take_base_url().as_deref(), Some("http://127.0.0.1:5000"));
        assert!(sup.take_base_url().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_without_child_is_noop() {
        let mut sup = ProcessSupervisor::new(fast_config());
        sup.shutdown().await;
        assert_eq!(*sup.state(), SupervisorState::Idle);
    }
}
