//! Per-line authenticated encryption.
//!
//! XChaCha20-Poly1305 with a session key and base IV. Line `n` uses the IV
//! with its last 8 bytes XORed with `n` (little endian) as nonce, and `n` as
//! associated data, so lines cannot be reordered or spliced between sessions.

use arenalog_wire::{CIPHER_XCHACHA20_POLY1305, FORMAT_VERSION, IV_LEN, KEY_LEN, KeyBlob};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::{JournalError, Result};

pub struct LineCipher {
    aead: XChaCha20Poly1305,
    iv: [u8; IV_LEN],
    blob: KeyBlob,
}

impl LineCipher {
    /// Fresh key material from the OS RNG.
    pub fn generate(created_unix_ms: i64) -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        let mut id = [0u8; 8];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);
        OsRng.fill_bytes(&mut id);

        let blob = KeyBlob {
            format_version: FORMAT_VERSION,
            cipher: CIPHER_XCHACHA20_POLY1305.to_string(),
            key: key.to_vec(),
            iv: iv.to_vec(),
            session_id: id.iter().map(|b| format!("{b:02x}")).collect(),
            created_unix_ms,
        };
        let aead = XChaCha20Poly1305::new(Key::from_slice(&key));
        key.zeroize();
        Self { aead, iv, blob }
    }

    /// Rebuild from a key blob read back from a log.
    pub fn from_blob(blob: &KeyBlob) -> Result<Self> {
        blob.validate()?;
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&blob.iv);
        Ok(Self {
            aead: XChaCha20Poly1305::new(Key::from_slice(&blob.key)),
            iv,
            blob: blob.clone(),
        })
    }

    pub fn key_blob(&self) -> &KeyBlob {
        &self.blob
    }

    pub fn session_id(&self) -> &str {
        &self.blob.session_id
    }

    fn nonce(&self, seq: u64) -> [u8; IV_LEN] {
        let mut nonce = self.iv;
        for (byte, mask) in nonce[IV_LEN - 8..].iter_mut().zip(seq.to_le_bytes()) {
            *byte ^= mask;
        }
        nonce
    }

    /// Encrypt line `seq`, returning base64 ciphertext.
    pub fn encrypt_line(&self, seq: u64, plaintext: &str) -> Result<String> {
        let nonce = self.nonce(seq);
        let aad = seq.to_le_bytes();
        let ciphertext = self
            .aead
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
            .map_err(|_| JournalError::Encrypt { seq })?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt line `seq` from base64 ciphertext.
    pub fn decrypt_line(&self, seq: u64, encoded: &str) -> Result<String> {
        let ciphertext = STANDARD.decode(encoded.trim_end_matches(['\r', '\n']))?;
        let nonce = self.nonce(seq);
        let aad = seq.to_le_bytes();
        let plaintext = self
            .aead
            .decrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| JournalError::Decrypt { seq })?;
        String::from_utf8(plaintext).map_err(|_| JournalError::Utf8 { seq })
    }
}

impl Drop for LineCipher {
    fn drop(&mut self) {
        self.iv.zeroize();
        self.blob.key.zeroize();
        self.blob.iv.zeroize();
    }
}

impl std::fmt::Debug for LineCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCipher")
            .field("session_id", &self.blob.session_id)
            .finish_non_exhaustive()
    }
}
