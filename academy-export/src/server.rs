//! Lifecycle of the throwaway server that the exporter crawls.
//!
//! The server is a child process running `<program> serve` on a loopback
//! port with a fresh SQLite file in a private temp directory, so a crawl
//! never sees or touches a learner's real progress. The child is spawned
//! with `kill_on_drop`, so it is released even when the export bails out
//! early.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const HEALTH_PATH: &str = "/healthz";

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("server executable {path} is not runnable: {reason}")]
    NotRunnable { path: PathBuf, reason: String },

    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create temporary database directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to stop server: {0}")]
    Stop(#[source] std::io::Error),

    #[error("failed to build health-check client: {0}")]
    Client(#[from] reqwest::Error),
}

/// How to launch the server
#[derive(Debug, Clone)]
pub struct ServerSpec {
    pub program: PathBuf,
    pub config_path: Option<PathBuf>,
    pub port: u16,
}

impl ServerSpec {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Confirm the program starts at all by asking for its version
    pub async fn check_runnable(&self) -> Result<String, ServerError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .map_err(|e| ServerError::NotRunnable {
                path: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ServerError::NotRunnable {
                path: self.program.clone(),
                reason: format!("--version exited with {:?}", output.status.code()),
            });
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        tracing::debug!(bin = %self.program.display(), %version, "server executable ready");
        Ok(version)
    }
}

/// A running server child process
pub struct EphemeralServer {
    child: Child,
    base_url: String,
    /// Holds the disposable database; removed on drop
    _db_dir: TempDir,
}

impl EphemeralServer {
    pub async fn start(spec: &ServerSpec) -> Result<Self, ServerError> {
        let db_dir = tempfile::Builder::new()
            .prefix("academy-export-")
            .tempdir()
            .map_err(ServerError::TempDir)?;
        let db_path = db_dir.path().join("progress.db");

        let mut command = Command::new(&spec.program);
        if let Some(config) = &spec.config_path {
            command.arg("--config").arg(config);
        }
        command
            .arg("serve")
            .arg("--port")
            .arg(spec.port.to_string())
            .arg("--db")
            .arg(&db_path)
            .arg("--no-watch")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| ServerError::Spawn {
            path: spec.program.clone(),
            source,
        })?;
        tracing::info!(pid = ?child.id(), port = spec.port, "started export server");

        Ok(Self {
            child,
            base_url: spec.base_url(),
            _db_dir: db_dir,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Poll the health endpoint until it answers 2xx or `limit` elapses.
    /// Returns false early if the child exits.
    pub async fn await_ready(&mut self, limit: Duration) -> Result<bool, ServerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let deadline = Instant::now() + limit;

        loop {
            if let Ok(Some(status)) = self.child.try_wait() {
                tracing::warn!(%status, "export server exited before becoming ready");
                return Ok(false);
            }

            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(true),
                Ok(resp) => tracing::debug!(status = %resp.status(), "server not ready"),
                Err(err) => tracing::trace!("server not ready: {}", err),
            }

            if Instant::now() + POLL_INTERVAL > deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Ask the server to exit, then kill it once `grace` has elapsed
    pub async fn stop(mut self, grace: Duration) -> Result<Option<ExitStatus>, ServerError> {
        if let Ok(Some(status)) = self.child.try_wait() {
            return Ok(Some(status));
        }

        self.terminate();
        match timeout(grace, self.child.wait()).await {
            Ok(status) => status.map(Some).map_err(ServerError::Stop),
            Err(_) => {
                tracing::warn!("export server ignored SIGTERM for {:?}; killing", grace);
                self.child.kill().await.map_err(ServerError::Stop)?;
                Ok(None)
            }
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        if let Some(pid) = self.child.id() {
            // SAFETY: kill(2) has no memory-safety preconditions; the pid is
            // our own unreaped child.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                tracing::warn!(
                    "failed to send SIGTERM to {}: {}",
                    pid,
                    std::io::Error::last_os_error()
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        if let Err(err) = self.child.start_kill() {
            tracing::warn!("failed to stop export server: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_runnable() {
        let spec = ServerSpec {
            program: PathBuf::from("/definitely/not/academy"),
            config_path: None,
            port: 18999,
        };
        assert!(matches!(
            spec.check_runnable().await,
            Err(ServerError::NotRunnable { .. })
        ));
    }

    /// A stand-in server that never answers HTTP and ignores SIGTERM
    #[cfg(unix)]
    fn stubborn_server(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("stubborn-server");
        std::fs::write(&script, "#!/bin/sh\ntrap '' TERM\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unready_server_times_out_and_is_killed() {
        let dir = TempDir::new().unwrap();
        let spec = ServerSpec {
            program: stubborn_server(dir.path()),
            config_path: None,
            port: 18996,
        };

        let mut server = EphemeralServer::start(&spec).await.unwrap();
        assert!(!server.await_ready(Duration::from_millis(700)).await.unwrap());

        let started = Instant::now();
        let status = server.stop(Duration::from_millis(300)).await.unwrap();
        assert!(status.is_none(), "SIGTERM was ignored, so the child must be killed");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_uses_loopback() {
        let spec = ServerSpec {
            program: PathBuf::from("academy"),
            config_path: None,
            port: 18765,
        };
        assert_eq!(spec.base_url(), "http://127.0.0.1:18765");
    }
}
