//! Small filesystem helpers that attach the offending path to every error

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Read and deserialize a JSON document
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_bytes(path)?;
    serde_json::from_slice(&content).map_err(|e| Error::json(path, e))
}

/// Read a file as raw bytes
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::io(path, e))
}

/// Write bytes to `path`, creating parent directories as needed.
/// Existing files are overwritten.
pub fn write_bytes(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| Error::io(path, e))
}

/// Serialize `value` as two-space indented JSON and write it to `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value).map_err(|e| Error::json(path, e))?;
    write_bytes(path, &content)
}

/// Create a directory and its parents if absent
pub fn create_dir_all(path: &Path) -> Result<()> {
    if !path.is_dir() {
        std::fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}
