//! Computed metrics over memory entities.
//!
//! `scoring` turns a Pattern, Solution or Decision snapshot into the
//! confidence, usage and weight values the pruning service ranks by.

pub mod scoring;
