//! Error taxonomy (`spec.md` §7) classified from an HTTP status code plus an
//! optional vendor error code carried in the response body.
//!
//! Grounded on `client-engine/src/backend.rs::BackendError`: a small
//! `thiserror` enum for domain-specific failures, with everything else
//! (transport failures, JSON decode failures) folded in as opaque variants
//! rather than re-derived per call site.

use serde::Deserialize;

/// Vendor error codes the control plane embeds in 4xx bodies.
mod vendor_code {
    pub const SERIAL_REQUIRED: &str = "00144000002";
    pub const TYPE_MISMATCH: &str = "00144000004";
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("missing BITSKY_BASE_URL or GLOBAL_ID")]
    ConfigMissing,

    #[error("cannot find producer by {global_id}")]
    NotRegistered { global_id: String },

    #[error("invalid security key")]
    BadCredentials,

    #[error("producer already connected by another instance")]
    AlreadyBound,

    #[error("set PRODUCER_SERIAL_ID")]
    SerialRequired,

    #[error("type mismatch; expected {expected}")]
    TypeMismatch { expected: String },

    #[error("check GLOBAL_ID / SERIAL_ID / SECURITY_KEY")]
    BadRequest,

    #[error("internal server error")]
    ServerError,

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ProducerError {
    /// Classify a non-2xx control-plane response (`spec.md` §7).
    ///
    /// `expected_type` is the producer's configured type, used to fill in
    /// the `TypeMismatch` message; `global_id` fills in `NotRegistered`.
    pub fn classify(
        status: reqwest::StatusCode,
        body: &str,
        expected_type: &str,
        global_id: &str,
    ) -> Self {
        use reqwest::StatusCode;

        match status {
            StatusCode::NOT_FOUND => ProducerError::NotRegistered {
                global_id: global_id.to_string(),
            },
            StatusCode::UNAUTHORIZED => ProducerError::BadCredentials,
            StatusCode::FORBIDDEN => ProducerError::AlreadyBound,
            s if s.is_client_error() => {
                let vendor_code = serde_json::from_str::<VendorErrorBody>(body)
                    .ok()
                    .and_then(|b| b.code);
                match vendor_code.as_deref() {
                    Some(vendor_code::SERIAL_REQUIRED) => ProducerError::SerialRequired,
                    Some(vendor_code::TYPE_MISMATCH) => ProducerError::TypeMismatch {
                        expected: expected_type.to_string(),
                    },
                    _ => ProducerError::BadRequest,
                }
            }
            _ => ProducerError::ServerError,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
