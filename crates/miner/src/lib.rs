//! The effort miner: a rate-controlled scheduler that keeps submitting batches
//! of mining calls to the effort contract.
//!
//! ## Flow
//!
//! 1. [`config::MinerConfig::load`] reads the layered configuration and
//!    resolves it into immutable [`config::Settings`].
//! 2. The [`preflight`] checks verify the node, the deposit account's opt-ins
//!    and the miner's balance.
//! 3. [`scheduler::Scheduler::run`] waits for mining to open, then ticks every
//!    two seconds, dispatching [`submit`]ted batches of at most
//!    [`quota::MAX_GROUP_SIZE`] calls without waiting on them.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub use error::{MinerError, MinerResult};
pub use quota::Rate;
pub use scheduler::Scheduler;

pub mod clock;
pub mod config;
pub mod error;
pub mod inflight;
pub mod preflight;
pub mod quota;
pub mod scheduler;
pub mod submit;
