// Dataset location and fingerprint

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::IoError;

/// Pick the dataset: an explicit path wins over the configured one. The file
/// must exist.
pub fn resolve_dataset_path(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf, IoError> {
    let path = explicit.or(configured).ok_or(IoError::DatasetNotConfigured)?;
    if !path.is_file() {
        return Err(IoError::DatasetMissing { path: path.to_path_buf() });
    }
    Ok(path.to_path_buf())
}

/// Hex SHA-256 of the file's bytes, streamed.
pub fn sha256_file(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read { path: path.to_path_buf(), source };
    let mut reader = BufReader::new(File::open(path).map_err(read_err)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(read_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// File name only; full paths never go into artifacts.
pub fn dataset_basename(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
