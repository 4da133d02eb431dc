//! Infrastructure layer for the Agent Memory Layer.
//!
//! Password-based encryption of memory collections at rest and loading of
//! the memory `config.toml` from a data directory.

pub mod config;
pub mod crypto;
