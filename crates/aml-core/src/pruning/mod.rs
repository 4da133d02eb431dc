//! Multi-criteria pruning of an agent's memory collections.
//!
//! - `filter`: the time, performance and space axes
//! - `service`: `PruningService` (prune, live config, scheduling)
//! - `schedule`: the timer task behind scheduled pruning
//! - `locks`: per-agent mutexes for load-prune-persist cycles

pub mod filter;
pub mod locks;
mod schedule;
pub mod service;

pub use locks::AgentLocks;
pub use schedule::ScheduleStart;
pub use service::{PruneOutcome, PruningService};
