//! Reading and verifying finished session logs.

use std::fs;
use std::io;
use std::path::Path;

use arenalog_wire::{KeyBlob, SEAL_LINE_PREFIX, SessionSeal, WireError, parse_key_blob, parse_seal};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::JournalError;
use crate::cipher::LineCipher;

/// A decrypted log.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub key: KeyBlob,
    pub lines: Vec<String>,
    pub seal: Option<SessionSeal>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("log is empty")]
    Empty,

    #[error("bad key blob: {0}")]
    KeyBlob(#[source] WireError),

    #[error("bad seal: {0}")]
    Seal(#[source] WireError),

    #[error("line {seq}: {source}")]
    Line {
        seq: u64,
        #[source]
        source: JournalError,
    },

    #[error("log has no seal")]
    Unsealed,

    #[error("content after seal")]
    TrailingContent,

    #[error("tail key blob does not match head")]
    KeyMismatch,

    #[error("line count mismatch: seal says {sealed}, found {found}")]
    LineCount { sealed: u64, found: u64 },

    #[error("plaintext digest mismatch")]
    Digest,
}

/// Decrypt a log. An unsealed log (writer never closed) is accepted.
pub fn read_log(path: impl AsRef<Path>) -> Result<DecodedLog, VerifyError> {
    let text = fs::read_to_string(path)?;
    let mut physical = text.lines();

    let head = physical.next().ok_or(VerifyError::Empty)?;
    let key = parse_key_blob(head).map_err(VerifyError::KeyBlob)?;
    let cipher = LineCipher::from_blob(&key).map_err(|source| VerifyError::Line { seq: 0, source })?;

    let mut lines = Vec::new();
    let mut seal = None;
    for line in physical {
        if seal.is_some() {
            if line.trim().is_empty() {
                continue;
            }
            return Err(VerifyError::TrailingContent);
        }
        if line.starts_with(SEAL_LINE_PREFIX) {
            seal = Some(parse_seal(line).map_err(VerifyError::Seal)?);
            continue;
        }
        let seq = lines.len() as u64;
        let plain = cipher
            .decrypt_line(seq, line)
            .map_err(|source| VerifyError::Line { seq, source })?;
        lines.push(plain);
    }

    Ok(DecodedLog { key, lines, seal })
}

/// Decrypt a log and check its seal: key, line count and digest.
pub fn verify_log(path: impl AsRef<Path>) -> Result<DecodedLog, VerifyError> {
    let log = read_log(path)?;
    let seal = log.seal.as_ref().ok_or(VerifyError::Unsealed)?;

    if seal.key.as_ref() != Some(&log.key) {
        return Err(VerifyError::KeyMismatch);
    }
    let found = log.lines.len() as u64;
    if seal.line_count != found {
        return Err(VerifyError::LineCount {
            sealed: seal.line_count,
            found,
        });
    }
    let mut digest = Sha256::new();
    for line in &log.lines {
        digest.update(line.as_bytes());
        digest.update(b"\n");
    }
    if digest.finalize().as_slice() != seal.plaintext_sha256.as_slice() {
        return Err(VerifyError::Digest);
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::writer::{AsyncLogWriter, WriterConfig};

    fn write_log(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("verify.log");
        let writer = AsyncLogWriter::create(&path, LineCipher::generate(5), WriterConfig::default()).unwrap();
        for line in lines {
            writer.write_line(line);
        }
        writer.close().unwrap();
        path
    }

    #[test]
    fn test_verify_sealed_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), &["a", "b\nc", ""]);
        let log = verify_log(&path).unwrap();
        assert_eq!(log.lines, vec!["a", "b\nc", ""]);
        assert_eq!(log.seal.unwrap().line_count, 3);
        assert_eq!(log.key.created_unix_ms, 5);
    }

    #[test]
    fn test_swapped_lines_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), &["first", "second"]);
        let text = fs::read_to_string(&path).unwrap();
        let mut physical: Vec<&str> = text.lines().collect();
        physical.swap(1, 2);
        fs::write(&path, physical.join("\n")).unwrap();

        assert!(matches!(
            read_log(&path),
            Err(VerifyError::Line { seq: 0, .. })
        ));
    }

    #[test]
    fn test_removed_line_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), &["first", "second", "third"]);
        let text = fs::read_to_string(&path).unwrap();
        let mut physical: Vec<&str> = text.lines().collect();
        physical.remove(3);
        fs::write(&path, physical.join("\n")).unwrap();

        assert!(matches!(
            verify_log(&path),
            Err(VerifyError::LineCount { sealed: 3, found: 2 })
        ));
    }

    #[test]
    fn test_unsealed_log_is_readable_not_verifiable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(dir.path(), &["only"]);
        let text = fs::read_to_string(&path).unwrap();
        let physical: Vec<&str> = text.lines().collect();
        fs::write(&path, physical[..2].join("\n")).unwrap();

        assert_eq!(read_log(&path).unwrap().lines, vec!["only"]);
        assert!(matches!(verify_log(&path), Err(VerifyError::Unsealed)));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.log");
        fs::write(&path, "").unwrap();
        assert!(matches!(read_log(&path), Err(VerifyError::Empty)));
    }
}
