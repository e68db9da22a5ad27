//! Result Dispatcher (`spec.md` §4.G): group reconciled intelligences by
//! destination, POST each bucket to its SOI, then PUT the (possibly
//! rewritten) bucket back to the control plane.
//!
//! Per-bucket dispatch is driven with `futures::future::join_all` rather
//! than `tokio::spawn` per bucket: grounded on the teacher's
//! `worker_join: JoinSet<()>` as the nearest analogue of "run N things
//! concurrently, never let one kill the batch", `join_all` is the simpler
//! tool here because buckets don't need independent cancellation.

use std::collections::HashMap;

use producer_client::{ControlPlaneClient, TargetSystemClient};
use producer_core::model::{Intelligence, IntelligenceState, SoiDescriptor};
use serde_json::Value;

use crate::job::set_intelligence_state;

struct Bucket {
    soi: SoiDescriptor,
    items: Vec<Intelligence>,
}

/// Groups by `lower(method) ":" lower(baseURL + path)` (`spec.md` §4.G).
/// Items missing any required `soi` field are dropped with a debug log.
fn group_by_destination(items: Vec<Intelligence>) -> HashMap<String, Bucket> {
    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    for item in items {
        match item.soi.routing_key() {
            Some(key) => {
                buckets
                    .entry(key)
                    .or_insert_with(|| Bucket {
                        soi: item.soi.clone(),
                        items: Vec::new(),
                    })
                    .items
                    .push(item);
            }
            None => {
                tracing::debug!(global_id = %item.global_id, "intelligence missing soi routing fields; skipping dispatch");
            }
        }
    }
    buckets
}

/// Dispatches every bucket concurrently and waits for all of them to
/// settle. A bucket's own failures never propagate out — they're folded
/// into that bucket's items as `FAILED` and still reported to the control
/// plane (`spec.md` §4.G steps 2-4).
pub(crate) async fn dispatch(
    target: &TargetSystemClient,
    control_plane: &ControlPlaneClient,
    base_url: &str,
    global_id: &str,
    security_key: Option<&str>,
    items: Vec<Intelligence>,
) {
    let buckets = group_by_destination(items);
    let sends = buckets
        .into_values()
        .map(|bucket| dispatch_one(target, control_plane, base_url, global_id, security_key, bucket));
    futures::future::join_all(sends).await;
}

async fn dispatch_one(
    target: &TargetSystemClient,
    control_plane: &ControlPlaneClient,
    base_url: &str,
    global_id: &str,
    security_key: Option<&str>,
    bucket: Bucket,
) {
    let Bucket { soi, mut items } = bucket;
    // Required by `routing_key()` already having matched: base_url/callback present.
    let soi_base_url = soi.base_url.as_deref().unwrap_or_default();
    let callback = soi.callback.as_ref().expect("grouped bucket has a callback");

    if let Err(err) = target
        .dispatch(soi_base_url, &callback.method, &callback.path, soi.api_key.as_deref(), &items)
        .await
    {
        tracing::warn!(%err, soi_base_url, "target-system dispatch failed; marking bucket FAILED");
        let reason = Value::String(err.to_string());
        for item in &mut items {
            set_intelligence_state(item, IntelligenceState::Failed, Some(reason.clone()));
        }
    }

    if let Err(err) = control_plane
        .update_intelligences(base_url, global_id, security_key, &items)
        .await
    {
        tracing::warn!(%err, "control-plane update_intelligences failed; relying on reissue");
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
