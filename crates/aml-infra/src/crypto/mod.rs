//! At-rest encryption for memory collections.
//!
//! - `encryption`: Argon2id + AES-256-GCM sealing of serializable values
//! - `envelope`: byte layout of the sealed blob

pub mod encryption;
mod envelope;

pub use encryption::{DerivedKey, EncryptionError, EnhancedEncryption, KdfParams};
pub use envelope::MIN_BLOB_LEN;
