//! Wire-facing data types shared by the control-plane client, the job
//! runner, and the result dispatcher.
//!
//! Grounded on `client-engine/src/backend.rs`'s `Dto`-suffixed structs: small,
//! explicitly-typed structs with `serde` derives, optional fields modeled as
//! `Option<T>` rather than left implicit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The producer config snapshot returned by the control plane.
///
/// Only the fields the core loop actually branches on are modeled; anything
/// else the control plane sends is dropped on deserialization rather than
/// round-tripped, since the core never needs to re-serialize this type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteProducerConfig {
    #[serde(rename = "globalId")]
    pub global_id: String,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub system: RemoteSystemInfo,
    #[serde(rename = "pollingInterval")]
    pub polling_interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteSystemInfo {
    pub version: String,
    pub state: RemoteSystemState,
}

/// Only `Active` permits job execution (`spec.md` §4.C/§4.D).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RemoteSystemState {
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(other)]
    Other,
}

impl RemoteProducerConfig {
    /// `(globalId, system.version)` identity used by the Config Watcher to
    /// short-circuit unchanged ticks (`spec.md` §4.D).
    pub fn identity(&self) -> (&str, &str) {
        (&self.global_id, &self.system.version)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.system.state, RemoteSystemState::Active)
    }
}

/// One unit of work dispatched to the pluggable worker and reported back to
/// both the SOI and the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intelligence {
    #[serde(rename = "globalId")]
    pub global_id: String,
    pub soi: SoiDescriptor,
    #[serde(default)]
    pub system: IntelligenceSystem,
    #[serde(default)]
    pub dataset: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoiDescriptor {
    #[serde(rename = "baseURL", default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub callback: Option<SoiCallback>,
    #[serde(rename = "apiKey", default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoiCallback {
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelligenceSystem {
    #[serde(default)]
    pub state: Option<IntelligenceState>,
    #[serde(rename = "failuresReason", default)]
    pub failures_reason: Option<Value>,
    #[serde(default)]
    pub producer: Option<IntelligenceProducerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelligenceProducerInfo {
    #[serde(rename = "endedAt", default)]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Terminal state written by the Job Runner's reconciliation pass
/// (`spec.md` §4.F). Serializes upper-case to match the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntelligenceState {
    #[serde(rename = "FINISHED")]
    Finished,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "TIMEOUT")]
    Timeout,
}

impl SoiDescriptor {
    /// Required fields for dispatch grouping (`spec.md` §4.G): base URL,
    /// callback method, and callback path must all be present.
    pub fn routing_key(&self) -> Option<String> {
        let base_url = self.base_url.as_deref()?;
        let callback = self.callback.as_ref()?;
        if callback.method.is_empty() || callback.path.is_empty() {
            return None;
        }
        Some(format!(
            "{}:{}",
            callback.method.to_lowercase(),
            format!("{base_url}{}", callback.path).to_lowercase()
        ))
    }
}
