use std::path::PathBuf;

use clap::Parser;

/// Demo front end for the producer agent core (`producer-engine::Producer`),
/// grounded on `client/src/cli.rs`'s env-first argument defaults.
#[derive(Debug, Clone, Parser)]
#[command(name = "producer-agent", version, about = "Bitsky producer agent")]
pub struct Cli {
    /// Control-plane base URL.
    #[arg(long, env = "BITSKY_BASE_URL")]
    pub base_url: Option<String>,

    /// Control-plane security key, sent as `X-Security-Key`.
    #[arg(long, env = "BITSKY_SECURITY_KEY")]
    pub security_key: Option<String>,

    /// Identity this producer is bound to in the control plane.
    #[arg(long, env = "GLOBAL_ID")]
    pub global_id: Option<String>,

    /// Stable per-install id. Auto-derived and persisted when absent.
    #[arg(long, env = "PRODUCER_SERIAL_ID")]
    pub serial_id: Option<String>,

    /// Producer type tag; must match the remote config's `type` field
    /// case-insensitively for the job loop to run.
    #[arg(long, env = "PRODUCER_TYPE", default_value_t = producer_core::constants::SERVICE_AGENT_TYPE.to_string())]
    pub producer_type: String,

    /// Directory `preferences.json` is read from/written to.
    #[arg(long, env = "PRODUCER_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
}
