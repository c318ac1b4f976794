//! Shell configuration.
//!
//! Defaults match the packaged desktop deployment; everything is
//! overridable through `ECART_*` environment variables (a `.env` file next
//! to the binary works too, via dotenvy).

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the desktop shell and its backend supervisor.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Base URL of an already-running backend. When set, the supervisor
    /// is skipped entirely and the shell attaches to this URL.
    pub backend_url: Option<String>,
    /// Port the spawned backend listens on.
    pub backend_port: u16,
    /// Interval between readiness probes.
    pub health_poll_interval: Duration,
    /// Probe attempts before the launch is declared failed.
    pub health_poll_attempts: u32,
    /// Grace period between the polite termination signal and a hard kill.
    pub kill_grace: Duration,
    /// Rows per result page.
    pub page_size: usize,
    /// Candidate backend entry points, tried in order. The packaged
    /// executable comes before the development script.
    pub backend_candidates: Vec<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_port: 5000,
            health_poll_interval: Duration::from_millis(500),
            health_poll_attempts: 60,
            kill_grace: Duration::from_secs(5),
            page_size: 25,
            backend_candidates: vec![
                PathBuf::from("resources/backend/backend"),
                PathBuf::from("src/backend/app.py"),
            ],
        }
    }
}

impl ShellConfig {
    /// Load config from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(url) = dotenvy::var("ECART_BACKEND_URL") {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            if !trimmed.is_empty() {
                cfg.backend_url = Some(trimmed);
            }
        }

        if let Ok(val) = dotenvy::var("ECART_BACKEND_PORT")
            && let Ok(port) = val.parse()
        {
            cfg.backend_port = port;
        }

        if let Ok(val) = dotenvy::var("ECART_HEALTH_POLL_MS")
            && let Ok(ms) = val.parse()
        {
            cfg.health_poll_interval = Duration::from_millis(ms);
        }

        if let Ok(val) = dotenvy::var("ECART_HEALTH_POLL_ATTEMPTS")
            && let Ok(n) = val.parse()
        {
            cfg.health_poll_attempts = n;
        }

        if let Ok(val) = dotenvy::var("ECART_KILL_GRACE_SECS")
            && let Ok(secs) = val.parse()
        {
            cfg.kill_grace = Duration::from_secs(secs);
        }

        if let Ok(val) = dotenvy::var("ECART_PAGE_SIZE")
            && let Ok(n) = val.parse::<usize>()
            && n > 0
        {
            cfg.page_size = n;
        }

        if let Ok(val) = dotenvy::var("ECART_BACKEND_PATH") {
            cfg.backend_candidates = vec![PathBuf::from(val)];
        }

        cfg
    }

    /// URL the spawned backend will serve on.
    pub fn local_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.backend_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_packaged_deployment() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.backend_port, 5000);
        assert_eq!(cfg.health_poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.health_poll_attempts, 60);
        assert_eq!(cfg.kill_grace, Duration::from_secs(5));
        assert_eq!(cfg.page_size, 25);
        assert!(cfg.backend_url.is_none());
        assert_eq!(cfg.backend_candidates.len(), 2);
    }

    #[test]
    fn test_local_base_url_uses_port() {
        let cfg = ShellConfig {
            backend_port: 5999,
            ..Default::default()
        };
        assert_eq!(cfg.local_base_url(), "http://127.0.0.1:5999");
    }
}
