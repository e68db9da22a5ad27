//! The single task that owns all mutable producer state (`spec.md` §5): one
//! `tokio::select!` loop combining the Config Watcher, the Job Loop, and the
//! Job Runner's two-race execution model.
//!
//! Grounded on `client-engine/src/engine.rs`'s `EngineRuntime::run`: the same
//! shape of `Option<JoinHandle<_>>` fields polled via `self.field.as_mut()`
//! inside `select!` arms guarded by `if self.field.is_some()`, and a
//! re-armable `Pin<Box<Sleep>>` in place of a fixed `tokio::time::interval`
//! wherever the period can change at runtime.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use producer_client::{ControlPlaneClient, TargetSystemClient};
use producer_core::constants::{COLLECT_JOB_TIMEOUT, POLLING_INTERVAL_WATCH_AGENT, WATCH_BACKOFF_MAX_MULTIPLIER};
use producer_core::model::{Intelligence, IntelligenceState, RemoteProducerConfig};
use producer_core::{ProducerConfig, ProducerError};
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, Instant as TokioInstant, Sleep};

use crate::dispatcher;
use crate::job::RunningJob;
use crate::status::{ProducerEvent, ProducerStatus};
use crate::worker::{IntelligenceWorker, WorkerContext, WorkerOutcome};

enum FetchOutcome {
    Empty,
    Batch(Vec<Intelligence>),
    Err(ProducerError),
}

pub(crate) struct ProducerRuntime {
    control_plane: ControlPlaneClient,
    target: TargetSystemClient,
    config: ProducerConfig,
    producer_type: String,
    worker: Arc<dyn IntelligenceWorker>,

    remote_config: Option<RemoteProducerConfig>,
    producer_error: Option<ProducerError>,
    ran_job_number: u64,

    job: Option<RunningJob>,
    fetch_task: Option<JoinHandle<FetchOutcome>>,
    exec_task: Option<JoinHandle<Vec<WorkerOutcome>>>,
    liveness_task: Option<JoinHandle<()>>,
    job_deadline: Option<Pin<Box<Sleep>>>,

    job_loop_running: bool,
    watch_backoff_streak: u32,
    watch_sleep: Pin<Box<Sleep>>,
    job_sleep: Pin<Box<Sleep>>,

    events_tx: broadcast::Sender<ProducerEvent>,
    status_tx: watch::Sender<ProducerStatus>,
}

impl ProducerRuntime {
    pub(crate) fn new(
        config: ProducerConfig,
        producer_type: String,
        worker: Arc<dyn IntelligenceWorker>,
        events_tx: broadcast::Sender<ProducerEvent>,
        status_tx: watch::Sender<ProducerStatus>,
    ) -> Self {
        ProducerRuntime {
            control_plane: ControlPlaneClient::new(),
            target: TargetSystemClient::new(),
            config,
            producer_type,
            worker,
            remote_config: None,
            producer_error: None,
            ran_job_number: 0,
            job: None,
            fetch_task: None,
            exec_task: None,
            liveness_task: None,
            job_deadline: None,
            job_loop_running: false,
            watch_backoff_streak: 0,
            watch_sleep: Box::pin(sleep(Duration::ZERO)),
            job_sleep: Box::pin(sleep(Duration::from_secs(365 * 24 * 3600))),
            events_tx,
            status_tx,
        }
    }

    pub(crate) async fn run(mut self, stop: Arc<Notify>) {
        let _ = self.events_tx.send(ProducerEvent::Started);

        loop {
            tokio::select! {
                _ = stop.notified() => {
                    self.terminate_active_job().await;
                    break;
                }
                _ = &mut self.watch_sleep => {
                    self.watch_tick().await;
                    let interval = self.watch_interval();
                    self.watch_sleep.as_mut().reset(TokioInstant::now() + interval);
                }
                _ = &mut self.job_sleep, if self.job_loop_running => {
                    self.job_tick();
                    let interval = self.job_loop_interval();
                    self.job_sleep.as_mut().reset(TokioInstant::now() + interval);
                }
                result = async { self.fetch_task.as_mut().unwrap().await }, if self.fetch_task.is_some() => {
                    self.fetch_task = None;
                    self.handle_fetch_result(result).await;
                }
                result = async { self.exec_task.as_mut().unwrap().await }, if self.exec_task.is_some() => {
                    self.exec_task = None;
                    self.job_deadline = None;
                    self.handle_worker_completion(result).await;
                }
                _ = async { self.job_deadline.as_mut().unwrap().await }, if self.job_deadline.is_some() => {
                    self.handle_job_timeout().await;
                }
                result = async { self.liveness_task.as_mut().unwrap().await }, if self.liveness_task.is_some() => {
                    self.liveness_task = None;
                    if let Err(err) = result {
                        tracing::warn!(%err, "empty-batch liveness invocation panicked");
                    }
                }
            }
        }

        let _ = self.events_tx.send(ProducerEvent::Stopped);
    }

    fn watch_interval(&self) -> Duration {
        let max_streak = WATCH_BACKOFF_MAX_MULTIPLIER.ilog2();
        let multiplier = 1u32 << self.watch_backoff_streak.min(max_streak);
        POLLING_INTERVAL_WATCH_AGENT * multiplier
    }

    fn job_loop_interval(&self) -> Duration {
        let secs = self
            .remote_config
            .as_ref()
            .and_then(|c| c.polling_interval)
            .unwrap_or(self.config.default_polling_interval_secs);
        Duration::from_secs(secs.max(self.config.default_polling_interval_secs))
    }

    /// Config Watcher tick (`spec.md` §4.D).
    async fn watch_tick(&mut self) {
        let (Some(base_url), Some(global_id)) = (self.config.base_url.clone(), self.config.global_id.clone()) else {
            self.producer_error = Some(ProducerError::ConfigMissing);
            self.publish_status();
            return;
        };

        match self
            .control_plane
            .get_producer_config(&base_url, &global_id, &self.producer_type, self.config.security_key.as_deref())
            .await
        {
            Ok(remote) => {
                self.watch_backoff_streak = 0;
                let is_new = self.remote_config.as_ref().map(|c| c.identity()) != Some(remote.identity());
                if is_new {
                    let _ = self.events_tx.send(ProducerEvent::ConfigAdopted {
                        global_id: remote.global_id.clone(),
                        version: remote.system.version.clone(),
                    });
                    self.remote_config = Some(remote.clone());
                    self.evaluate_run_preconditions(&remote).await;
                }
            }
            Err(err) => {
                self.watch_backoff_streak = (self.watch_backoff_streak + 1).min(WATCH_BACKOFF_MAX_MULTIPLIER.ilog2());
                tracing::warn!(%err, "config watcher fetch failed");
                let _ = self.events_tx.send(ProducerEvent::Warning { message: err.to_string() });
                self.producer_error = Some(err);
            }
        }
        self.publish_status();
    }

    /// `spec.md` §4.D preconditions. "Changed" transitions are idempotent
    /// when the producer stays active (scenario 6: a config change mid-run
    /// must not preempt the active job) — only a transition to *inactive*
    /// tears the active job down.
    async fn evaluate_run_preconditions(&mut self, remote: &RemoteProducerConfig) {
        let should_run = self.config.base_url.is_some()
            && remote
                .type_
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(&self.producer_type))
            && !remote.global_id.is_empty()
            && remote.is_active();

        if should_run {
            if !self.job_loop_running {
                self.job_loop_running = true;
                self.job_sleep.as_mut().reset(TokioInstant::now());
            }
        } else {
            self.job_loop_running = false;
            self.terminate_active_job().await;
        }
    }

    /// Job Loop tick (`spec.md` §4.E): start a job only if the single-job
    /// slot is free.
    fn job_tick(&mut self) {
        if self.job.is_some() {
            tracing::debug!("job already active; skipping tick");
            return;
        }
        self.start_job();
    }

    /// Acquisition (`spec.md` §4.F): the only place a `RunningJob` is
    /// created, immediately followed by the async fetch.
    fn start_job(&mut self) {
        let (Some(base_url), Some(global_id)) = (self.config.base_url.clone(), self.config.global_id.clone()) else {
            self.producer_error = Some(ProducerError::ConfigMissing);
            return;
        };
        let security_key = self.config.security_key.clone();
        let client = self.control_plane.clone();

        self.job = Some(RunningJob::acquire());
        self.fetch_task = Some(tokio::spawn(async move {
            match client.get_intelligences(&base_url, &global_id, security_key.as_deref()).await {
                Ok(items) if items.is_empty() => FetchOutcome::Empty,
                Ok(items) => FetchOutcome::Batch(items),
                Err(err) => FetchOutcome::Err(err),
            }
        }));
    }

    async fn handle_fetch_result(&mut self, result: Result<FetchOutcome, JoinError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(%err, "fetch task panicked");
                let _ = self.events_tx.send(ProducerEvent::Error { message: err.to_string() });
                self.job = None;
                self.publish_status();
                return;
            }
        };

        match outcome {
            FetchOutcome::Err(err) => {
                tracing::warn!(%err, "fetch intelligences failed");
                self.producer_error = Some(err);
                self.job = None;
            }
            // "invoke the worker once with an empty batch... then teardown
            // directly (no reporting)" (`spec.md` §4.F "Fetch"). Spawned
            // rather than awaited inline: the worker invocation must not be
            // able to block this select loop (and therefore `stop()`) if it
            // hangs.
            FetchOutcome::Empty => {
                if let (Some(remote), Some(job)) = (self.remote_config.clone(), self.job.as_ref()) {
                    let job_id = job.job_id.clone();
                    let ctx = self.worker_context();
                    let worker = self.worker.clone();
                    self.liveness_task = Some(tokio::spawn(async move {
                        let _ = worker.run(&[], &job_id, &remote, &ctx).await;
                    }));
                }
                self.job = None;
                // Teardown always re-invokes the Job Loop's tick logic
                // immediately (`spec.md` §4.F "Teardown"), the same as the
                // normal post-report path in `complete_job`.
                if self.job_loop_running {
                    self.job_tick();
                }
            }
            FetchOutcome::Batch(items) => {
                self.ran_job_number += 1;
                let job_id = self.job.as_ref().map(|j| j.job_id.clone()).unwrap_or_default();
                let batch_size = items.len();
                if let Some(job) = self.job.as_mut() {
                    job.total_intelligences = items;
                }
                let _ = self.events_tx.send(ProducerEvent::JobStarted {
                    job_id: job_id.clone(),
                    batch_size,
                });
                self.spawn_worker_execution(job_id);
            }
        }
        self.publish_status();
    }

    /// Execution (`spec.md` §4.F): hand the batch to the worker as its own
    /// task, and immediately arm the timeout it races against.
    fn spawn_worker_execution(&mut self, job_id: String) {
        let Some(remote) = self.remote_config.clone() else {
            self.job = None;
            return;
        };
        let Some(job) = self.job.as_ref() else {
            return;
        };
        let items = job.total_intelligences.clone();
        let ctx = self.worker_context();
        let worker = self.worker.clone();

        self.exec_task = Some(tokio::spawn(async move { worker.run(&items, &job_id, &remote, &ctx).await }));
        self.job_deadline = Some(Box::pin(sleep(COLLECT_JOB_TIMEOUT)));
    }

    fn worker_context(&self) -> WorkerContext {
        WorkerContext {
            producer_type: self.producer_type.clone(),
            serial_id: self.config.serial_id.clone(),
        }
    }

    /// "(a) Worker completes first" (`spec.md` §4.F).
    async fn handle_worker_completion(&mut self, result: Result<Vec<WorkerOutcome>, JoinError>) {
        let outcomes = match result {
            Ok(outcomes) => outcomes,
            Err(err) => {
                tracing::error!(%err, "worker task panicked; reconciling as failed");
                let _ = self.events_tx.send(ProducerEvent::Error { message: err.to_string() });
                Vec::new()
            }
        };
        if let Some(job) = self.job.as_mut() {
            job.reconcile_outcomes(outcomes);
        }
        self.complete_job(true).await;
    }

    /// "(b) Timeout first" (`spec.md` §4.F).
    async fn handle_job_timeout(&mut self) {
        self.job_deadline = None;
        if let Some(task) = self.exec_task.take() {
            task.abort();
        }
        if let Some(job) = self.job.as_mut() {
            job.reconcile_timeout();
        }
        self.complete_job(true).await;
    }

    /// Reconciliation + Reporting + Teardown (`spec.md` §4.F). `retick`
    /// distinguishes the normal end-of-job path (which immediately
    /// re-invokes the Job Loop's tick logic) from an externally-forced
    /// termination (watcher deactivation, `stop()`), which must not.
    async fn complete_job(&mut self, retick: bool) {
        let Some(mut job) = self.job.take() else {
            return;
        };
        job.ending = true;
        let finalized = job.finalize();
        let (finished, failed, timeout) = count_terminal_states(&finalized);
        let _ = self.events_tx.send(ProducerEvent::JobFinished {
            job_id: job.job_id.clone(),
            finished,
            failed,
            timeout,
        });
        self.report(finalized).await;
        self.publish_status();

        if retick && self.job_loop_running {
            self.job_tick();
        }
    }

    /// Cancels in-flight work for the active job and reconciles it as
    /// terminated, without re-arming the Job Loop (`spec.md` §4.E "stopping
    /// the loop... invokes the terminal phase on any active job").
    async fn terminate_active_job(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        if let Some(task) = self.exec_task.take() {
            task.abort();
        }
        if let Some(task) = self.liveness_task.take() {
            task.abort();
        }
        self.job_deadline = None;
        if self.job.is_some() {
            self.complete_job(false).await;
        }
    }

    async fn report(&mut self, items: Vec<Intelligence>) {
        let (Some(base_url), Some(global_id)) = (self.config.base_url.clone(), self.config.global_id.clone()) else {
            tracing::warn!("cannot report results without BITSKY_BASE_URL/GLOBAL_ID");
            return;
        };
        let security_key = self.config.security_key.clone();
        dispatcher::dispatch(
            &self.target,
            &self.control_plane,
            &base_url,
            &global_id,
            security_key.as_deref(),
            items,
        )
        .await;
    }

    fn publish_status(&self) {
        let _ = self.status_tx.send(ProducerStatus {
            remote_config: self.remote_config.clone(),
            producer_error: self.producer_error.as_ref().map(|e| e.to_string()),
            job_id: self.job.as_ref().map(|j| j.job_id.clone()),
            ran_job_number: self.ran_job_number,
        });
    }
}

fn count_terminal_states(items: &[Intelligence]) -> (usize, usize, usize) {
    let mut finished = 0;
    let mut failed = 0;
    let mut timeout = 0;
    for item in items {
        match item.system.state {
            Some(IntelligenceState::Finished) => finished += 1,
            Some(IntelligenceState::Failed) => failed += 1,
            Some(IntelligenceState::Timeout) => timeout += 1,
            None => {}
        }
    }
    (finished, failed, timeout)
}
