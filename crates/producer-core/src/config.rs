//! Config Resolver (`spec.md` §4.C): merge defaults, process environment,
//! and caller overrides into a `ProducerConfig` snapshot, deriving and
//! persisting a stable per-install serial id when one isn't supplied.
//!
//! Grounded on `client-core/src/submitter.rs` and
//! `client-engine/src/inflight.rs`: both persist small JSON documents with
//! the same write-tmp-then-rename routine. Unlike those (which resolve an
//! XDG path under the invoking user's home), this resolves a caller-provided
//! "public" directory per `spec.md` §6, falling back to `./public` —
//! a per-install directory, not a per-user one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_POLLING_INTERVAL_SECS, PREFERENCES_FILE_NAME, SERVICE_AGENT_TYPE};

/// Caller-supplied overrides, highest precedence in the merge (`spec.md`
/// §4.C: "caller overrides > environment > defaults").
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub security_key: Option<String>,
    pub global_id: Option<String>,
    pub serial_id: Option<String>,
    pub producer_type: Option<String>,
    /// Directory the preferences file lives under. Defaults to `./public`.
    pub public_dir: Option<PathBuf>,
}

/// A resolved configuration snapshot consumed by the rest of the core.
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub base_url: Option<String>,
    pub security_key: Option<String>,
    pub global_id: Option<String>,
    pub serial_id: String,
    pub producer_type: String,
    pub default_polling_interval_secs: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(rename = "PRODUCER_SERIAL_ID", default)]
    producer_serial_id: Option<String>,
}

impl ProducerConfig {
    /// Resolve a config snapshot, persisting a freshly-derived serial id
    /// when none is available from overrides, environment, or a prior run.
    pub fn resolve(overrides: ConfigOverrides) -> Self {
        let base_url = overrides
            .base_url
            .or_else(|| std::env::var("BITSKY_BASE_URL").ok());
        let security_key = overrides
            .security_key
            .or_else(|| std::env::var("BITSKY_SECURITY_KEY").ok());
        let global_id = overrides
            .global_id
            .or_else(|| std::env::var("GLOBAL_ID").ok());
        let producer_type = overrides
            .producer_type
            .unwrap_or_else(|| SERVICE_AGENT_TYPE.to_string());
        let public_dir = overrides
            .public_dir
            .unwrap_or_else(|| PathBuf::from("public"));

        if base_url.is_none() {
            tracing::warn!("BITSKY_BASE_URL is not set; producer cannot operate until it is");
        }
        if global_id.is_none() {
            tracing::warn!("GLOBAL_ID is not set; producer cannot operate until it is");
        }

        let serial_id = overrides
            .serial_id
            .or_else(|| std::env::var("PRODUCER_SERIAL_ID").ok())
            .or_else(|| load_preferences(&public_dir).and_then(|p| p.producer_serial_id))
            .unwrap_or_else(|| derive_and_persist_serial_id(&public_dir));

        ProducerConfig {
            base_url,
            security_key,
            global_id,
            serial_id,
            producer_type,
            default_polling_interval_secs: DEFAULT_POLLING_INTERVAL_SECS,
        }
    }
}

fn preferences_path(public_dir: &Path) -> PathBuf {
    public_dir.join(PREFERENCES_FILE_NAME)
}

fn load_preferences(public_dir: &Path) -> Option<Preferences> {
    let path = preferences_path(public_dir);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(prefs) => Some(prefs),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to parse preferences file");
            None
        }
    }
}

/// Derive a fresh UUID and attempt to persist it. On any failure, fall back
/// to the in-memory id for this process only (`spec.md` §4.C, §7).
fn derive_and_persist_serial_id(public_dir: &Path) -> String {
    let serial_id = Uuid::new_v4().to_string();
    if let Err(err) = persist_serial_id(public_dir, &serial_id) {
        tracing::warn!(
            %err,
            "failed to persist PRODUCER_SERIAL_ID; using an in-memory id for this run"
        );
    }
    serial_id
}

fn persist_serial_id(public_dir: &Path, serial_id: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(public_dir)?;
    let path = preferences_path(public_dir);
    let prefs = Preferences {
        producer_serial_id: Some(serial_id.to_string()),
    };
    let json = serde_json::to_string_pretty(&prefs)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(tmp, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
