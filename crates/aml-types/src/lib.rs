//! Shared domain types for the Agent Memory Layer.
//!
//! This crate contains the memory entities (Pattern, Solution, Decision),
//! pruning strategies and results, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod memory;
pub mod pruning;
