//! # Modhost Filesystem I/O Operations
//!
//! File: cli/src/common/fs/io.rs
//!
//! ## Overview
//!
//! This module centralizes the filesystem input/output the host performs:
//! reading module manifests and controller descriptors, reading config layers
//! leniently, and writing the config file atomically. It wraps `std::fs`,
//! `serde_json` and `tempfile` with consistent error context.
//!
//! ## Architecture
//!
//! - **`ensure_dir_exists`**: creates a directory (and parents) if missing; fails if the path is a file.
//! - **`read_file_to_string`**: `fs::read_to_string` with context.
//! - **`read_json`**: strict JSON read into any `Deserialize` type. Used for manifests, where a
//!   broken file is a module-load error.
//! - **`read_json_object_or_empty`**: lenient JSON read. Missing, unreadable, invalid or non-object
//!   files all yield an empty map. Used for config layers.
//! - **`write_string_atomically`**: writes through a sibling `NamedTempFile` and persists it over
//!   the target, so readers never observe a half-written config file.
//! - **`expand_path`**: tilde expansion plus resolution against a base directory.
//!
use crate::core::error::{HostError, Result};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Ensures that a directory exists at the specified path.
///
/// If the path does not exist it is created including any missing parents
/// (like `mkdir -p`). If the path exists but is not a directory, a
/// `HostError::Io` is returned.
///
/// # Arguments
///
/// * `path` - A `&Path` reference to the directory path to ensure exists.
///
/// # Returns
///
/// * `Result<()>` - `Ok(())` if the directory exists or was created.
///
/// # Errors
///
/// Returns an `Err` if:
/// - The path exists but is not a directory.
/// - Creating the directory fails (e.g., due to permissions).
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        info!("Created directory: {:?}", path);
    } else if !path.is_dir() {
        anyhow::bail!(HostError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Path exists but is not a directory",
            ),
        });
    } else {
        debug!("Directory already exists: {:?}", path);
    }
    Ok(())
}

/// Reads the entire content of a file into a string.
///
/// # Arguments
///
/// * `path` - A `&Path` reference to the file to read.
///
/// # Returns
///
/// * `Result<String>` - The file content.
///
/// # Errors
///
/// Returns an `Err` if the file cannot be found, opened, or read, with context
/// naming the file.
pub fn read_file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file {:?}", path))
}

/// Reads and deserializes a JSON file. Any failure is an error.
///
/// Used for module manifests and controller descriptors.
///
/// # Arguments
///
/// * `path` - The JSON file to read.
///
/// # Returns
///
/// * `Result<T>` - The deserialized value.
///
/// # Errors
///
/// Returns an `Err` if the file cannot be read, or if its content is not valid
/// JSON for `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = read_file_to_string(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file {:?}", path))
}

/// Reads a JSON object from `path`, treating every failure as an empty object.
///
/// Config layers must never prevent the host from starting, so a missing file,
/// a permission problem, malformed JSON and a top-level value that is not an
/// object all produce `{}`.
pub fn read_json_object_or_empty(path: &Path) -> Map<String, Value> {
    match read_json::<Value>(path) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("Ignoring non-object JSON in {:?}", path);
            Map::new()
        }
        Err(e) => {
            debug!("Ignoring unreadable JSON in {:?}: {:#}", path, e);
            Map::new()
        }
    }
}

/// Writes `content` to `path` atomically, creating parent directories first.
///
/// The content goes to a temporary file in the same directory which is then
/// renamed over the target.
///
/// # Arguments
///
/// * `path` - The destination file.
/// * `content` - The full new content of the file.
///
/// # Returns
///
/// * `Result<()>` - `Ok(())` once the file has been replaced.
///
/// # Errors
///
/// Returns an `Err` if the parent directory cannot be created, or
/// `HostError::Io` if creating, writing or persisting the temporary file fails.
/// The target is left untouched in that case.
pub fn write_string_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir_exists(&parent)?;

    let io_err = |source: std::io::Error| HostError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(&parent).map_err(io_err)?;
    temp.write_all(content.as_bytes()).map_err(io_err)?;
    temp.flush().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    info!("Wrote content to file: {:?}", path);
    Ok(())
}

/// Expands a leading `~` and resolves relative paths against `base`.
///
/// Absolute paths (after expansion) are returned unchanged.
///
/// # Arguments
///
/// * `raw` - The path as the user or config file wrote it, e.g. `~/mods/a` or `./a`.
/// * `base` - Directory relative paths are joined to.
///
/// # Returns
///
/// * `PathBuf` - The expanded path. It is not canonicalized and need not exist.
pub fn expand_path(raw: &str, base: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(raw).into_owned());
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}
