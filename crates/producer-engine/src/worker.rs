//! The pluggable execution worker contract (`spec.md` §9 "Pluggable worker
//! as a callable").
//!
//! A boxed-future trait rather than a bare `async fn` in a trait: it keeps
//! the runtime from assuming any particular concurrency primitive inside the
//! worker (it may spawn its own tasks, hold its own thread pool, whatever),
//! the same separation the teacher draws between `EngineRuntime` and the
//! `WorkerCommand`/`WorkerInternalEvent` channel pair in `worker.rs`.

use futures::future::BoxFuture;
use producer_core::model::RemoteProducerConfig;
use producer_core::Intelligence;
use serde_json::Value;

/// Per-item result the worker reports back for one batch (`spec.md` §9:
/// "a tagged variant `{Ok(item) | Err(reason)}`").
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Ok { global_id: String, dataset: Value },
    Err { global_id: Option<String>, reason: Value },
}

/// Read-only context handed to the worker alongside the batch. Carries the
/// identity fields the worker might need to tag its own telemetry with, but
/// no handle back into the runtime — `spec.md` §9 calls out the source's
/// "Producer on its context" cycle and asks for a lookup-only reference at
/// most; here there is simply no reference at all, since nothing in this
/// contract requires the worker to reach back into the runtime.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub producer_type: String,
    pub serial_id: String,
}

/// The black-box execution capability (`spec.md` §1, §9). The runtime
/// invokes this once per job with the full batch and awaits the returned
/// future under its own timeout; the worker's internal concurrency is
/// opaque to the runtime.
pub trait IntelligenceWorker: Send + Sync {
    fn run<'a>(
        &'a self,
        batch: &'a [Intelligence],
        job_id: &'a str,
        config: &'a RemoteProducerConfig,
        ctx: &'a WorkerContext,
    ) -> BoxFuture<'a, Vec<WorkerOutcome>>;
}

/// The worker used when a `Producer` is started without one configured
/// (`spec.md` §4.H: "ensure defaults for type and worker"). Resolves every
/// item to nothing, which reconciliation then marks `FAILED` with "timeout
/// or not resolved" — the same outcome as a worker that silently drops the
/// batch.
pub struct NoopWorker;

impl IntelligenceWorker for NoopWorker {
    fn run<'a>(
        &'a self,
        _batch: &'a [Intelligence],
        _job_id: &'a str,
        _config: &'a RemoteProducerConfig,
        _ctx: &'a WorkerContext,
    ) -> BoxFuture<'a, Vec<WorkerOutcome>> {
        Box::pin(async { Vec::new() })
    }
}
