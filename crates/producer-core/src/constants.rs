//! Protocol and timing constants.
//!
//! Grounded on `client/src/constants.rs` from the teacher crate: a small
//! module of `pub const` values rather than a config struct, because these
//! are compile-time invariants of the protocol, not something an operator
//! tunes per run.

use std::time::Duration;

/// How often the Config Watcher re-fetches the remote producer config.
pub const POLLING_INTERVAL_WATCH_AGENT: Duration = Duration::from_secs(60);

/// How long the Job Runner waits for the worker to finish a batch before
/// marking every item `TIMEOUT`.
pub const COLLECT_JOB_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default Job Loop polling interval (seconds) when the remote config omits
/// `pollingInterval`.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 30;

/// Default producer `type` tag when the caller never sets one.
pub const SERVICE_AGENT_TYPE: &str = "SERVICE_AGENT";

/// Header carrying the security key on every outbound request.
pub const SECURITY_KEY_HEADER: &str = "X-Security-Key";

/// Base backoff multiplier applied per consecutive Config Watcher failure
/// (REDESIGN FLAG #3 — `spec.md` §9 flags the absence of backoff as a
/// source anomaly worth fixing).
pub const WATCH_BACKOFF_MAX_MULTIPLIER: u32 = 8;

/// Name of the persisted preferences file under the "public" directory.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
