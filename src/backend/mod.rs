//! Backend process management and HTTP access.
//!
//! The comparison engine runs out of process; [`supervisor`] owns its
//! lifecycle and [`client`] talks to it over loopback HTTP. Nothing above
//! this module touches the child process or raw requests.

pub mod client;
pub mod supervisor;

pub use client::{AnalysisRequest, BackendClient, ComparisonRequest};
pub use supervisor::{ProcessSupervisor, SupervisorState};

use thiserror::Error;

/// Failures surfaced by the backend layer.
///
/// `Unavailable` is fatal to the session and rendered as a full error
/// view; `Rejected` and `Status` are transient and shown as
/// notifications; decode failures mean a contract break and are treated
/// like transient request failures.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned HTTP {code}")]
    Status { code: u16 },
    #[error("{message}")]
    Rejected { message: String },
    #[error("malformed backend response: {0}")]
    Decode(#[from] serde_json::Error),
}
