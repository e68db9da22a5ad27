//! `RunningJob` — the per-job record (`spec.md` §3/§4.F). Owned exclusively
//! by `ProducerRuntime`'s single task, mirroring how the teacher's
//! `EngineRuntime` owns `pending`/`inflight` with no cross-task mutation.

use std::collections::HashMap;
use std::time::Instant;

use producer_core::model::{Intelligence, IntelligenceState};
use serde_json::Value;
use uuid::Uuid;

pub(crate) use crate::worker::WorkerOutcome;

pub(crate) struct RunningJob {
    pub job_id: String,
    pub start_time: Instant,
    pub total_intelligences: Vec<Intelligence>,
    pub collected_by_global_id: HashMap<String, Intelligence>,
    pub job_timeout: bool,
    pub ending: bool,
}

impl RunningJob {
    /// The sole admission gate for the single-job invariant (`spec.md`
    /// §4.F "Acquisition"): a `RunningJob` only ever comes into existence
    /// here, with a fresh id and a clean collected map.
    pub fn acquire() -> Self {
        RunningJob {
            job_id: Uuid::new_v4().to_string(),
            start_time: Instant::now(),
            total_intelligences: Vec::new(),
            collected_by_global_id: HashMap::new(),
            job_timeout: false,
            ending: false,
        }
    }

    pub fn collected_count(&self) -> usize {
        self.collected_by_global_id.len()
    }

    /// Worker completed before the timeout (`spec.md` §4.F "(a)"). A no-op
    /// if the timeout has already fired — late outcomes must not overwrite
    /// the `TIMEOUT` reconciliation.
    pub fn reconcile_outcomes(&mut self, outcomes: Vec<WorkerOutcome>) {
        if self.job_timeout {
            return;
        }
        for outcome in outcomes {
            match outcome {
                WorkerOutcome::Ok { global_id, dataset } => {
                    self.collect(&global_id, IntelligenceState::Finished, Some(dataset), None);
                }
                WorkerOutcome::Err {
                    global_id: Some(global_id),
                    reason,
                } => {
                    self.collect(&global_id, IntelligenceState::Failed, None, Some(reason));
                }
                WorkerOutcome::Err { global_id: None, .. } => {
                    tracing::debug!("worker outcome missing globalId; skipping");
                }
            }
        }
    }

    fn collect(
        &mut self,
        global_id: &str,
        state: IntelligenceState,
        dataset: Option<Value>,
        reason: Option<Value>,
    ) {
        let Some(item) = self
            .total_intelligences
            .iter()
            .find(|item| item.global_id == global_id)
        else {
            tracing::debug!(global_id, "worker outcome for unknown item; skipping");
            return;
        };
        let mut item = item.clone();
        if dataset.is_some() {
            item.dataset = dataset;
        }
        set_intelligence_state(&mut item, state, reason);
        self.collected_by_global_id.insert(global_id.to_string(), item);
    }

    /// Timeout fired before the worker completed (`spec.md` §4.F "(b)"):
    /// every item in the batch is reconciled as `TIMEOUT`, discarding
    /// whatever partial outcomes had already landed.
    pub fn reconcile_timeout(&mut self) {
        self.job_timeout = true;
        self.collected_by_global_id.clear();
        for item in self.total_intelligences.clone() {
            let global_id = item.global_id.clone();
            let mut item = item;
            set_intelligence_state(
                &mut item,
                IntelligenceState::Timeout,
                Some(Value::String("collect intelligences timeout".to_string())),
            );
            self.collected_by_global_id.insert(global_id, item);
        }
    }

    /// Reconciliation entering REPORTING (`spec.md` §4.F): build the final
    /// ordered list, looking up each original item's collected counterpart.
    /// Callers must guard with `ending` so only the first pass runs.
    pub fn finalize(&self) -> Vec<Intelligence> {
        self.total_intelligences
            .iter()
            .map(|item| match self.collected_by_global_id.get(&item.global_id) {
                None => {
                    let mut item = item.clone();
                    set_intelligence_state(
                        &mut item,
                        IntelligenceState::Failed,
                        Some(Value::String("timeout or not resolved".to_string())),
                    );
                    item
                }
                Some(collected) if collected.system.state.is_none() => {
                    let mut item = collected.clone();
                    let has_dataset = item.dataset.as_ref().is_some_and(|d| !d.is_null());
                    if has_dataset {
                        set_intelligence_state(&mut item, IntelligenceState::Finished, None);
                    } else {
                        set_intelligence_state(&mut item, IntelligenceState::Failed, None);
                    }
                    item
                }
                Some(collected) => collected.clone(),
            })
            .collect()
    }
}

/// Writes `system.state`, stamps `system.producer.ended_at`, and serializes
/// `reason` into `system.failures_reason` (`spec.md` §4.F).
///
/// Corrected from the flagged source anomaly (`spec.md` §9, REDESIGN FLAGS
/// #1): `ended_at` is set whenever it is currently absent, not only when
/// already present.
pub(crate) fn set_intelligence_state(item: &mut Intelligence, state: IntelligenceState, reason: Option<Value>) {
    item.system.state = Some(state);
    let already_ended = item
        .system
        .producer
        .as_ref()
        .is_some_and(|p| p.ended_at.is_some());
    if !already_ended {
        let mut producer = item.system.producer.clone().unwrap_or_default();
        producer.ended_at = Some(chrono::Utc::now());
        item.system.producer = Some(producer);
    }
    if let Some(reason) = reason {
        item.system.failures_reason = Some(reason);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
