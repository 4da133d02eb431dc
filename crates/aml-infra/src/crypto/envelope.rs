//! Byte layout of an encrypted memory blob.
//!
//! ```text
//! "AML" | version u8 | m_cost u32le | t_cost u32le | p_cost u32le
//!       | salt[16] | nonce[12] | tag[16] | sha256[32] | ciphertext
//! ```
//!
//! Everything up to and including the nonce is the header; it is bound to
//! the ciphertext as AEAD associated data. The SHA-256 digest covers
//! header, tag and ciphertext so gross tampering can be detected without
//! the password.
//!
//! A blob whose 4-byte prefix is one byte away from `"AML" 1` and whose
//! digest no longer matches is treated as a damaged blob of ours
//! (`Integrity`), not as foreign input.

use sha2::{Digest, Sha256};

use super::encryption::{EncryptionError, KdfParams};

const MAGIC: &[u8; 3] = b"AML";
const VERSION: u8 = 1;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const PARAMS_LEN: usize = 12;

const HEADER_LEN: usize = MAGIC.len() + 1 + PARAMS_LEN + SALT_LEN + NONCE_LEN;
/// Smallest possible blob: header, tag and digest around an empty ciphertext.
pub const MIN_BLOB_LEN: usize = HEADER_LEN + TAG_LEN + DIGEST_LEN;

/// Build the header for a new blob.
pub(crate) fn header(params: &KdfParams, salt: &[u8; SALT_LEN], nonce: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&params.memory_kib.to_le_bytes());
    out.extend_from_slice(&params.iterations.to_le_bytes());
    out.extend_from_slice(&params.parallelism.to_le_bytes());
    out.extend_from_slice(salt);
    out.extend_from_slice(nonce);
    out
}

fn digest(header: &[u8], tag: &[u8], ciphertext: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(header);
    hasher.update(tag);
    hasher.update(ciphertext);
    hasher.finalize().into()
}

/// Concatenate header, tag, digest and ciphertext into one blob.
pub(crate) fn assemble(header: Vec<u8>, tag: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let sum = digest(&header, tag, ciphertext);
    let mut blob = header;
    blob.reserve(TAG_LEN + DIGEST_LEN + ciphertext.len());
    blob.extend_from_slice(tag);
    blob.extend_from_slice(&sum);
    blob.extend_from_slice(ciphertext);
    blob
}

/// Number of bytes in the magic/version prefix that differ from ours.
fn prefix_mismatches(blob: &[u8]) -> usize {
    MAGIC
        .iter()
        .chain(std::iter::once(&VERSION))
        .zip(blob)
        .filter(|(expected, actual)| expected != actual)
        .count()
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

/// Borrowed view of a parsed blob.
#[derive(Debug)]
pub(crate) struct Envelope<'a> {
    pub header: &'a [u8],
    pub params: KdfParams,
    pub salt: &'a [u8],
    pub nonce: &'a [u8],
    pub tag: &'a [u8],
    digest: &'a [u8],
    pub ciphertext: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Split a blob into its parts.
    ///
    /// Checks structure only, except that a prefix with a single wrong byte
    /// is told apart from foreign data by consulting the digest.
    pub fn parse(blob: &'a [u8]) -> Result<Self, EncryptionError> {
        if blob.len() < MIN_BLOB_LEN {
            return Err(EncryptionError::MalformedInput("blob too short"));
        }
        let prefix_errors = prefix_mismatches(blob);
        if prefix_errors > 1 {
            return Err(EncryptionError::MalformedInput("not an encrypted memory blob"));
        }

        let params_at = MAGIC.len() + 1;
        let params = KdfParams {
            memory_kib: read_u32(blob, params_at),
            iterations: read_u32(blob, params_at + 4),
            parallelism: read_u32(blob, params_at + 8),
        };

        let (header, rest) = blob.split_at(HEADER_LEN);
        let salt_at = params_at + PARAMS_LEN;
        let (tag, rest) = rest.split_at(TAG_LEN);
        let (digest, ciphertext) = rest.split_at(DIGEST_LEN);

        let envelope = Self {
            header,
            params,
            salt: &header[salt_at..salt_at + SALT_LEN],
            nonce: &header[salt_at + SALT_LEN..],
            tag,
            digest,
            ciphertext,
        };

        if prefix_errors == 1 {
            // Intact digest: deliberately written with another magic/version.
            if envelope.digest_matches() {
                return Err(EncryptionError::MalformedInput("unsupported blob version"));
            }
            return Err(EncryptionError::Integrity);
        }
        Ok(envelope)
    }

    /// Whether the stored digest matches header, tag and ciphertext.
    pub fn digest_matches(&self) -> bool {
        digest(self.header, self.tag, self.ciphertext).as_slice() == self.digest
    }
}
