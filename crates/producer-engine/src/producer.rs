//! The `Producer` façade (`spec.md` §4.H), grounded on
//! `client-engine/src/api.rs`'s `EngineHandle`: `start()` spawns the single
//! background task owning all runtime state and hands back lightweight
//! observation channels; `stop()` signals and awaits it.

use std::sync::Arc;

use producer_core::{ConfigOverrides, ProducerConfig, RemoteProducerConfig};
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

use crate::runtime::ProducerRuntime;
use crate::status::{ProducerEvent, ProducerStatus};
use crate::worker::{IntelligenceWorker, NoopWorker};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ProducerSubscribeError {
    #[error("producer is not running")]
    NotRunning,
}

struct RunningHandle {
    events_tx: broadcast::Sender<ProducerEvent>,
    status_rx: watch::Receiver<ProducerStatus>,
    stop: Arc<Notify>,
    join: JoinHandle<()>,
}

pub struct Producer {
    producer_type: String,
    worker: Arc<dyn IntelligenceWorker>,
    overrides: ConfigOverrides,
    handle: Option<RunningHandle>,
}

impl Default for Producer {
    fn default() -> Self {
        Producer {
            producer_type: producer_core::constants::SERVICE_AGENT_TYPE.to_string(),
            worker: Arc::new(NoopWorker),
            overrides: ConfigOverrides::default(),
            handle: None,
        }
    }
}

impl Producer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent (`spec.md` §8 "idempotent start/stop"): a no-op if
    /// already running. Resolves a fresh `ProducerConfig` from the current
    /// override snapshot and spawns the single background task.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }

        let config = ProducerConfig::resolve(self.overrides.clone());
        let (events_tx, _events_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(ProducerStatus::default());
        let stop = Arc::new(Notify::new());

        let runtime = ProducerRuntime::new(
            config,
            self.producer_type.clone(),
            self.worker.clone(),
            events_tx.clone(),
            status_tx,
        );
        let join = tokio::spawn(runtime.run(stop.clone()));

        self.handle = Some(RunningHandle {
            events_tx,
            status_rx,
            stop,
            join,
        });
    }

    /// Idempotent: a no-op if not running. Cancels the background task's
    /// timers and any active job, then awaits its shutdown. Exceptions from
    /// the task are logged, never propagated (`spec.md` §4.H).
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        handle.stop.notify_one();
        if let Err(err) = handle.join.await {
            tracing::warn!(%err, "producer task ended abnormally");
        }
    }

    /// Replaces the caller-override snapshot (`spec.md` §4.H
    /// `setConfigs`). Takes effect on the next `start()`.
    pub fn set_configs(&mut self, overrides: ConfigOverrides) {
        self.overrides = overrides;
    }

    pub fn producer_type(&self) -> &str {
        &self.producer_type
    }

    /// Rejects empty values (`spec.md` §4.H `type([t])`).
    pub fn set_producer_type(&mut self, producer_type: impl Into<String>) -> Result<(), &'static str> {
        let producer_type = producer_type.into();
        if producer_type.trim().is_empty() {
            return Err("producer type must not be empty");
        }
        self.producer_type = producer_type;
        Ok(())
    }

    pub fn worker(&self) -> Arc<dyn IntelligenceWorker> {
        self.worker.clone()
    }

    pub fn set_worker(&mut self, worker: Arc<dyn IntelligenceWorker>) {
        self.worker = worker;
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<ProducerEvent>, ProducerSubscribeError> {
        self.handle
            .as_ref()
            .map(|h| h.events_tx.subscribe())
            .ok_or(ProducerSubscribeError::NotRunning)
    }

    pub fn producer_configuration(&self) -> Option<RemoteProducerConfig> {
        self.handle.as_ref()?.status_rx.borrow().remote_config.clone()
    }

    pub fn producer_error(&self) -> Option<String> {
        self.handle.as_ref()?.status_rx.borrow().producer_error.clone()
    }

    pub fn job_id(&self) -> Option<String> {
        self.handle.as_ref()?.status_rx.borrow().job_id.clone()
    }
}
