//! arenalog Wire Records
//!
//! This crate defines the Protobuf messages embedded, unencrypted, in every
//! session log: the key blob written at the head and repeated at the tail, and
//! the seal that closes the file.
//!
//! Both records are armored as a single text line (`<prefix><base64>`) so they
//! can live among the per-line ciphertext of the log body.
//!
//! # Layout
//!
//! ```text
//! ~KEY~<base64(KeyBlob)>            first physical line
//! <base64(ciphertext)>              one per logged line
//! ...
//! ~SEAL~<base64(SessionSeal)>       last physical line
//! ```

#![deny(unsafe_code)]

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use prost::Message;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Current log format version.
pub const FORMAT_VERSION: u32 = 1;

/// Cipher identifier recorded in the key blob.
pub const CIPHER_XCHACHA20_POLY1305: &str = "xchacha20poly1305";

/// Prefix of the armored key blob line.
pub const KEY_LINE_PREFIX: &str = "~KEY~";

/// Prefix of the armored seal line.
pub const SEAL_LINE_PREFIX: &str = "~SEAL~";

/// Key length in bytes.
pub const KEY_LEN: usize = 32;

/// IV (base nonce) length in bytes.
pub const IV_LEN: usize = 24;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while parsing armored records.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("missing record prefix, expected {expected:?}")]
    MissingPrefix { expected: &'static str },

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid key material: key {key_len} bytes, iv {iv_len} bytes")]
    InvalidKeyMaterial { key_len: usize, iv_len: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;

// ============================================================================
// Messages
// ============================================================================

/// Session-scoped key material, written at file head and tail.
#[derive(Clone, PartialEq, Message)]
pub struct KeyBlob {
    /// Log format version.
    #[prost(uint32, tag = "1")]
    pub format_version: u32,

    /// Cipher identifier.
    #[prost(string, tag = "2")]
    pub cipher: String,

    /// Symmetric key (32 bytes).
    #[prost(bytes = "vec", tag = "3")]
    pub key: Vec<u8>,

    /// Base nonce (24 bytes). Per-line nonces are derived from it.
    #[prost(bytes = "vec", tag = "4")]
    pub iv: Vec<u8>,

    /// Random session identifier, hex.
    #[prost(string, tag = "5")]
    pub session_id: String,

    /// Session creation time, unix milliseconds.
    #[prost(int64, tag = "6")]
    pub created_unix_ms: i64,
}

impl KeyBlob {
    /// Check version and key material lengths.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(WireError::UnsupportedVersion(self.format_version));
        }
        if self.key.len() != KEY_LEN || self.iv.len() != IV_LEN {
            return Err(WireError::InvalidKeyMaterial {
                key_len: self.key.len(),
                iv_len: self.iv.len(),
            });
        }
        Ok(())
    }
}

/// Tail record closing a session log.
#[derive(Clone, PartialEq, Message)]
pub struct SessionSeal {
    /// The same key blob as the file head.
    #[prost(message, optional, tag = "1")]
    pub key: Option<KeyBlob>,

    /// Number of encrypted lines written.
    #[prost(uint64, tag = "2")]
    pub line_count: u64,

    /// Lines dropped at enqueue because the queue stayed full.
    #[prost(uint64, tag = "3")]
    pub dropped_lines: u64,

    /// Lines the worker failed to encrypt or write.
    #[prost(uint64, tag = "4")]
    pub failed_lines: u64,

    /// SHA-256 over every written plaintext line, in order, each followed by `\n`.
    #[prost(bytes = "vec", tag = "5")]
    pub plaintext_sha256: Vec<u8>,
}

// ============================================================================
// Armor
// ============================================================================

/// Encode a key blob as a raw key line.
pub fn armor_key_blob(blob: &KeyBlob) -> String {
    armor(KEY_LINE_PREFIX, &blob.encode_to_vec())
}

/// Parse a raw key line.
pub fn parse_key_blob(line: &str) -> Result<KeyBlob> {
    let bytes = dearmor(KEY_LINE_PREFIX, line)?;
    let blob = KeyBlob::decode(bytes.as_slice())?;
    blob.validate()?;
    Ok(blob)
}

/// Encode a seal as a raw seal line.
pub fn armor_seal(seal: &SessionSeal) -> String {
    armor(SEAL_LINE_PREFIX, &seal.encode_to_vec())
}

/// Parse a raw seal line.
pub fn parse_seal(line: &str) -> Result<SessionSeal> {
    let bytes = dearmor(SEAL_LINE_PREFIX, line)?;
    Ok(SessionSeal::decode(bytes.as_slice())?)
}

fn armor(prefix: &str, bytes: &[u8]) -> String {
    let mut out = String::with_capacity(prefix.len() + bytes.len() * 4 / 3 + 4);
    out.push_str(prefix);
    STANDARD.encode_string(bytes, &mut out);
    out
}

fn dearmor(prefix: &'static str, line: &str) -> Result<Vec<u8>> {
    let body = line
        .trim_end_matches(['\r', '\n'])
        .strip_prefix(prefix)
        .ok_or(WireError::MissingPrefix { expected: prefix })?;
    Ok(STANDARD.decode(body)?)
}
