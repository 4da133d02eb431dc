//! Password-based AES-256-GCM encryption for memory collections at rest.
//!
//! `EnhancedEncryption` seals any serializable value:
//! - a fresh 16-byte salt and Argon2id turn the password into a 256-bit key
//! - a fresh 12-byte nonce and AES-256-GCM encrypt the JSON payload
//! - salt, nonce, tag, a SHA-256 digest and the KDF parameters travel in
//!   the blob (see `envelope`)
//!
//! Encrypting the same value twice with the same password therefore gives
//! different blobs. Decryption re-derives the key with the parameters the
//! blob was sealed with.
//!
//! SECURITY: Error types never contain plaintext, passwords or key material.

use std::fmt;

use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce, Tag};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::envelope::{self, Envelope, SALT_LEN};

/// Length of derived keys (AES-256).
pub const KEY_LEN: usize = 32;

/// Upper bounds accepted from a blob header, so a crafted blob cannot make
/// decryption allocate or spin without limit.
const MAX_MEMORY_KIB: u32 = 256 * 1024;
const MAX_ITERATIONS: u32 = 16;
const MAX_PARALLELISM: u32 = 8;

/// Errors from memory encryption operations.
///
/// IMPORTANT: These errors never include plaintext, key material, or
/// ciphertext in their Display/Debug output.
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Authentication failed: wrong password, or tampered/corrupted data.
    #[error("integrity check failed: wrong password or tampered data")]
    Integrity,

    /// The input is not a blob this module can parse.
    #[error("malformed encrypted blob: {0}")]
    MalformedInput(&'static str),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("payload (de)serialization failed")]
    Serialization,

    #[error("background crypto task failed")]
    TaskFailed,
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism (lanes).
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 2 MiB, one pass, one lane.
    ///
    /// Argon2id time grows linearly with memory. 4 MiB already costs close
    /// to 5 ms per derivation on a single slow core, so 2 MiB leaves about
    /// 2x headroom for a 10 KB encrypt or decrypt under 5 ms. Use
    /// [`KdfParams::hardened`] where that budget does not apply.
    fn default() -> Self {
        Self {
            memory_kib: 2048,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// OWASP recommended Argon2id parameters (19 MiB, 2 passes, 1 lane).
    pub fn hardened() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> Result<argon2::Params, EncryptionError> {
        argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|_| EncryptionError::KeyDerivationFailed)
    }

    /// Reject parameters outside what this module ever produces.
    fn check_bounds(&self) -> Result<(), EncryptionError> {
        if self.memory_kib > MAX_MEMORY_KIB
            || self.iterations > MAX_ITERATIONS
            || self.parallelism > MAX_PARALLELISM
        {
            return Err(EncryptionError::MalformedInput("KDF parameters out of range"));
        }
        self.to_argon2()
            .map(|_| ())
            .map_err(|_| EncryptionError::MalformedInput("invalid KDF parameters"))
    }
}

/// A 256-bit key derived from a password. Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

fn derive(params: &KdfParams, password: &str, salt: &[u8]) -> Result<DerivedKey, EncryptionError> {
    use argon2::{Algorithm, Argon2, Version};

    if password.is_empty() {
        return Err(EncryptionError::EmptyPassword);
    }
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|_| EncryptionError::KeyDerivationFailed)?;
    Ok(DerivedKey(key))
}

/// Generate a random salt using the OS CSPRNG.
fn random_salt() -> [u8; SALT_LEN] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Authenticated, password-based encryption for memory data.
///
/// Stateless apart from the KDF parameters used for new blobs; cheap to
/// copy and safe to use from many threads at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancedEncryption {
    params: KdfParams,
}

impl EnhancedEncryption {
    /// Use `params` for new blobs. Fails if Argon2 rejects them.
    pub fn new(params: KdfParams) -> Result<Self, EncryptionError> {
        params.to_argon2()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Derive a key from `password` and `salt` with this instance's params.
    ///
    /// Deterministic: the same inputs always give the same key. `salt` must
    /// be at least 8 bytes.
    pub fn derive_key(&self, password: &str, salt: &[u8]) -> Result<DerivedKey, EncryptionError> {
        derive(&self.params, password, salt)
    }

    /// Serialize `data` to JSON and seal it under `password`.
    pub fn encrypt<T: Serialize + ?Sized>(
        &self,
        data: &T,
        password: &str,
    ) -> Result<Vec<u8>, EncryptionError> {
        let mut buffer = serde_json::to_vec(data).map_err(|_| EncryptionError::Serialization)?;

        let salt = random_salt();
        let key = derive(&self.params, password, &salt)?;
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let header = envelope::header(&self.params, &salt, &nonce);
        let tag = cipher
            .encrypt_in_place_detached(&nonce, &header, &mut buffer)
            .map_err(|_| EncryptionError::EncryptionFailed)?;

        Ok(envelope::assemble(header, &tag, &buffer))
    }

    /// Open a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// The tag is verified before any plaintext is released. Wrong
    /// passwords and modified blobs give [`EncryptionError::Integrity`];
    /// input that is not a blob at all gives
    /// [`EncryptionError::MalformedInput`].
    pub fn decrypt<T: DeserializeOwned>(
        &self,
        blob: &[u8],
        password: &str,
    ) -> Result<T, EncryptionError> {
        if password.is_empty() {
            return Err(EncryptionError::EmptyPassword);
        }

        let envelope = Envelope::parse(blob)?;
        if !envelope.digest_matches() {
            return Err(EncryptionError::Integrity);
        }
        envelope.params.check_bounds()?;

        let key = derive(&envelope.params, password, envelope.salt)?;
        let cipher = Aes256Gcm::new(key.as_bytes().into());

        let mut buffer = envelope.ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(envelope.nonce),
                envelope.header,
                &mut buffer,
                Tag::from_slice(envelope.tag),
            )
            .map_err(|_| EncryptionError::Integrity)?;

        serde_json::from_slice(&buffer).map_err(|_| EncryptionError::Serialization)
    }

    /// Cheap pre-check: the blob parses and its digest matches.
    ///
    /// Needs no password and does not run the KDF. A `true` result does not
    /// prove the password is right; `decrypt` still authenticates.
    pub fn verify_integrity(&self, blob: &[u8]) -> bool {
        match Envelope::parse(blob) {
            Ok(envelope) => envelope.digest_matches() && envelope.params.check_bounds().is_ok(),
            Err(_) => false,
        }
    }

    /// [`encrypt`](Self::encrypt), returning standard base64 text.
    pub fn encrypt_to_string<T: Serialize + ?Sized>(
        &self,
        data: &T,
        password: &str,
    ) -> Result<String, EncryptionError> {
        self.encrypt(data, password).map(|blob| encode_blob(&blob))
    }

    /// [`decrypt`](Self::decrypt) for base64 text from
    /// [`encrypt_to_string`](Self::encrypt_to_string).
    pub fn decrypt_from_str<T: DeserializeOwned>(
        &self,
        text: &str,
        password: &str,
    ) -> Result<T, EncryptionError> {
        self.decrypt(&decode_blob(text)?, password)
    }

    /// [`encrypt`](Self::encrypt) on Tokio's blocking pool.
    ///
    /// Key derivation is CPU-bound; use this from async contexts.
    pub async fn encrypt_async<T>(&self, data: T, password: String) -> Result<Vec<u8>, EncryptionError>
    where
        T: Serialize + Send + 'static,
    {
        let this = *self;
        tokio::task::spawn_blocking(move || this.encrypt(&data, &password))
            .await
            .map_err(|_| EncryptionError::TaskFailed)?
    }

    /// [`decrypt`](Self::decrypt) on Tokio's blocking pool.
    pub async fn decrypt_async<T>(&self, blob: Vec<u8>, password: String) -> Result<T, EncryptionError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let this = *self;
        tokio::task::spawn_blocking(move || this.decrypt(&blob, &password))
            .await
            .map_err(|_| EncryptionError::TaskFailed)?
    }
}

/// Standard base64 text form of a blob.
pub fn encode_blob(blob: &[u8]) -> String {
    BASE64.encode(blob)
}

/// Inverse of [`encode_blob`].
pub fn decode_blob(text: &str) -> Result<Vec<u8>, EncryptionError> {
    BASE64
        .decode(text.trim())
        .map_err(|_| EncryptionError::MalformedInput("invalid base64"))
}
