//! Scoring and pruning logic for the Agent Memory Layer.
//!
//! This crate depends only on `aml-types` -- never on `aml-infra` or any
//! file/crypto crate. Callers load an agent's collections, hand them to
//! [`pruning::PruningService`], and persist what comes back.

pub mod memory;
pub mod pruning;
