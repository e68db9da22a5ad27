#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! The producer runtime: Config Watcher, Job Loop, Job Runner, and Result
//! Dispatcher wired into one background task, fronted by the `Producer`
//! façade (`spec.md` §2, §4, §5).

mod dispatcher;
mod job;
mod producer;
mod runtime;
pub mod status;
pub mod worker;

pub use producer::{Producer, ProducerSubscribeError};
pub use status::{ProducerEvent, ProducerStatus};
pub use worker::{IntelligenceWorker, NoopWorker, WorkerContext, WorkerOutcome};
