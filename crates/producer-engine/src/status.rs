//! Status snapshot and lifecycle events exposed by the Producer Façade
//! (`spec.md` §4.H), grounded on `client-engine/src/api.rs`'s
//! `StatusSnapshot`/`EngineEvent`.

use producer_core::model::RemoteProducerConfig;
use serde::Serialize;

/// A point-in-time read of the runtime's state, handed out over a `watch`
/// channel the same way `EngineHandle::snapshot()` does.
#[derive(Debug, Clone, Default)]
pub struct ProducerStatus {
    pub remote_config: Option<RemoteProducerConfig>,
    pub producer_error: Option<String>,
    pub job_id: Option<String>,
    pub ran_job_number: u64,
}

/// Lifecycle events broadcast while the runtime is active. Serializable so
/// a demo front end (the CLI) can log them structurally if it chooses to,
/// mirroring `EngineEvent`'s `#[serde(tag = "type")]` shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ProducerEvent {
    Started,
    ConfigAdopted { global_id: String, version: String },
    JobStarted { job_id: String, batch_size: usize },
    JobFinished { job_id: String, finished: usize, failed: usize, timeout: usize },
    /// A transient, expected failure (watcher fetch failed, dispatch to the
    /// control plane failed) that the next tick will retry on its own.
    Warning { message: String },
    /// A task panicked (fetch or worker execution). Surfaced distinctly
    /// from `Warning` because it indicates a crash, not an expected
    /// HTTP-level failure; the runtime still recovers on its own.
    Error { message: String },
    Stopped,
}
