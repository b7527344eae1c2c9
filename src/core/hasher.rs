//! Streaming content-digest comparison for (copy, original) pairs.

use super::error::CoreError;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Compares file contents via a streaming blake3 digest.
///
/// Streaming keeps peak memory bounded regardless of file size. Equal
/// digests are the working definition of "identical content"; this is
/// collision-resistant, not a defense against adversarial inputs.
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Returns `true` iff both files hash to the same digest.
    ///
    /// The two digests are computed concurrently; the first I/O failure
    /// short-circuits the comparison. An error means "cannot verify",
    /// never "mismatch" — callers must not treat it as either outcome.
    pub async fn compare(path_a: &Path, path_b: &Path) -> Result<bool, CoreError> {
        let (digest_a, digest_b) = tokio::try_join!(
            Self::digest(path_a.to_path_buf()),
            Self::digest(path_b.to_path_buf())
        )?;
        Ok(digest_a == digest_b)
    }

    async fn digest(path: PathBuf) -> Result<blake3::Hash, CoreError> {
        tokio::task::spawn_blocking(move || {
            let file = File::open(&path).map_err(|e| CoreError::Io(e, path.clone()))?;
            let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
            let mut hasher = blake3::Hasher::new();
            let mut buffer = [0u8; HASH_BUFFER_SIZE];
            loop {
                let read = reader
                    .read(&mut buffer)
                    .map_err(|e| CoreError::Io(e, path.clone()))?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[..read]);
            }
            Ok(hasher.finalize())
        })
        .await?
    }
}
