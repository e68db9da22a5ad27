#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! Shared data model, configuration resolution, and error taxonomy for the
//! producer agent (job leasing, intelligence/SOI types, control-plane error
//! classification).

pub mod config;
pub mod constants;
pub mod error;
pub mod model;

pub use config::{ConfigOverrides, ProducerConfig};
pub use error::ProducerError;
pub use model::{
    Intelligence, IntelligenceProducerInfo, IntelligenceState, IntelligenceSystem,
    RemoteProducerConfig, RemoteSystemInfo, RemoteSystemState, SoiCallback, SoiDescriptor,
};
