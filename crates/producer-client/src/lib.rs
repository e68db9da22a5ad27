#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! HTTP clients for the two systems the producer talks to: the control plane
//! (config + task leasing) and an arbitrary target system ("SOI") a batch of
//! intelligences gets dispatched to.
//!
//! Grounded on `client-engine/src/backend.rs`: build a URL by joining a path
//! onto a base, attach an auth header when present, classify non-2xx
//! responses once at the boundary instead of letting `reqwest::Error` leak
//! into callers.

mod control_plane;
mod target_system;

pub use control_plane::ControlPlaneClient;
pub use target_system::TargetSystemClient;
