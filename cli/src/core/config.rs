//! # Modhost Layered Configuration Store
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system shared by the host and all
//! of its modules. Configuration is read from several candidate file locations
//! and merged into one in-memory JSON object; modules then *register* the
//! top-level keys they own, and only registered keys are ever written back.
//!
//! ## Architecture
//!
//! The store follows these principles:
//! - Locations are ordered from highest to lowest priority. Each location is a
//!   directory or a file path; directories get the config file name appended.
//! - On read, an earlier location always wins over a later one for the same
//!   top-level key. Missing or corrupt files count as `{}`.
//! - `register_config` declares ownership of a key. A value already read from
//!   disk is kept; otherwise the default becomes the live value. Registering
//!   the same key again never resets it.
//! - On save, each registered key goes through its serializer (if any). A
//!   serializer returning `None` omits the key. Unregistered keys that were
//!   merely read from disk are dropped.
//!
//! Besides the store itself this module also computes the binary's default
//! location list (`default_locations`).
//!
//! ## Examples
//!
//! ```rust
//! use modhost::core::config::ConfigStore;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let mut store = ConfigStore::new(vec![dir.path().to_path_buf()], ".modhostrc")?;
//!
//! let value = store.register_config("greeting", json!("hello"), None);
//! assert_eq!(value, json!("hello"));
//!
//! let written = store.save(None)?;
//! assert!(written.ends_with(".modhostrc"));
//! # Ok(())
//! # }
//! ```
//!
use crate::common::fs::io;
use crate::core::error::{HostError, Result};
use directories::ProjectDirs;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The file name the `modhost` binary reads and writes.
pub const CONFIG_FILE_NAME: &str = ".modhostrc";

/// Environment variable naming an extra, highest-priority config location.
pub const CONFIG_ENV_VAR: &str = "MODHOST_CONFIG";

/// Maps the live value of a key to the value that should be persisted, or
/// `None` to leave the key out of the file.
pub type Serializer = Box<dyn Fn(&Value) -> Option<Value>>;

struct Registration {
    key: String,
    serializer: Option<Serializer>,
}

/// One candidate location and whether a file currently exists there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationStatus {
    pub path: PathBuf,
    pub exists: bool,
}

/// The layered configuration store.
pub struct ConfigStore {
    file_name: String,
    locations: Vec<PathBuf>,
    registry: Vec<Registration>,
    materialized: Map<String, Value>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("file_name", &self.file_name)
            .field("locations", &self.locations)
            .field(
                "registered",
                &self.registry.iter().map(|r| &r.key).collect::<Vec<_>>(),
            )
            .field("materialized", &self.materialized)
            .finish()
    }
}

/// Appends `file_name` to `location` unless it already names that file.
fn suffix_path(location: &Path, file_name: &str) -> PathBuf {
    if location.file_name().is_some_and(|name| name == file_name) {
        location.to_path_buf()
    } else {
        location.join(file_name)
    }
}

impl ConfigStore {
    /// Creates a store over `locations` (highest priority first) and reads it.
    ///
    /// Empty paths are filtered out first; if nothing is left the store cannot
    /// be created and a `HostError::Config` is returned.
    ///
    /// # Arguments
    ///
    /// * `locations` - Candidate directories (or full file paths), highest priority first.
    /// * `file_name` - The config file name appended to directory locations, e.g. `.modhostrc`.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The store with every existing layer already merged.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Config` when no non-empty location is given. Unreadable
    /// or malformed files are never an error; they count as `{}`.
    pub fn new(locations: Vec<PathBuf>, file_name: &str) -> Result<Self> {
        let locations: Vec<PathBuf> = locations
            .into_iter()
            .filter(|location| !location.as_os_str().is_empty())
            .collect();

        if locations.is_empty() {
            anyhow::bail!(HostError::Config("No config location".to_string()));
        }

        let mut store = ConfigStore {
            file_name: file_name.to_string(),
            locations,
            registry: Vec::new(),
            materialized: Map::new(),
        };
        store.read();
        Ok(store)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declares ownership of `key` and returns its live value.
    ///
    /// A value that was read from disk wins over `default`; a `null` default
    /// leaves the key as `null`. Repeated registrations of the same key keep
    /// the first registration and return the current value untouched.
    ///
    /// Only register from a module's load routine: registering later may
    /// replace a `null` that other code already relies on.
    ///
    /// # Arguments
    ///
    /// * `key` - Top-level key in the config file.
    /// * `default` - Live value used when no layer defines `key` (or defines it as `null`).
    /// * `serializer` - Maps the live value to what gets saved; `None` from it omits
    ///   the key. Without a serializer the live value is saved verbatim.
    ///
    /// # Returns
    ///
    /// * `Value` - The live value of `key` after registration.
    pub fn register_config(
        &mut self,
        key: &str,
        default: Value,
        serializer: Option<Serializer>,
    ) -> Value {
        if self.is_registered(key) {
            debug!("Config key '{}' already registered", key);
            return self.get(key).cloned().unwrap_or(Value::Null);
        }

        let has_value = self.materialized.get(key).is_some_and(|v| !v.is_null());
        if !has_value {
            self.materialized.insert(key.to_string(), default);
        }

        self.registry.push(Registration {
            key: key.to_string(),
            serializer,
        });
        debug!("Registered config key '{}'", key);

        self.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.registry.iter().any(|r| r.key == key)
    }

    /// The live value of `key`, registered or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.materialized.get(key)
    }

    /// Mutable access to the live value of `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.materialized.get_mut(key)
    }

    /// Replaces the live value of `key`.
    pub fn set(&mut self, key: &str, value: Value) {
        self.materialized.insert(key.to_string(), value);
    }

    /// Path and existence of every candidate config file, in priority order.
    pub fn status(&self) -> Vec<LocationStatus> {
        self.locations
            .iter()
            .map(|location| suffix_path(location, &self.file_name))
            .map(|path| {
                let exists = path.exists();
                LocationStatus { path, exists }
            })
            .collect()
    }

    /// Re-reads every existing location and merges them into the live object.
    ///
    /// Folding runs from the lowest priority location to the highest, each
    /// layer overwriting the keys it defines, so the earliest location wins.
    /// Registered keys absent from every file keep their live value.
    pub fn read(&mut self) {
        let merged = self
            .status()
            .into_iter()
            .rev()
            .filter(|location| location.exists)
            .fold(Map::new(), |mut merged, location| {
                debug!("Reading config layer {:?}", location.path);
                for (key, value) in io::read_json_object_or_empty(&location.path) {
                    merged.insert(key, value);
                }
                merged
            });

        for (key, value) in merged {
            self.materialized.insert(key, value);
        }
    }

    /// Serializes the registered keys to a tab-indented JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let mut persisted = Map::new();
        for registration in &self.registry {
            let live = self.get(&registration.key).unwrap_or(&Value::Null);
            let value = match &registration.serializer {
                Some(serialize) => serialize(live),
                None => Some(live.clone()),
            };
            match value {
                Some(Value::Null) | None => {
                    debug!("Omitting config key '{}' from save", registration.key)
                }
                Some(value) => {
                    persisted.insert(registration.key.clone(), value);
                }
            }
        }

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        Value::Object(persisted).serialize(&mut serializer)?;
        Ok(String::from_utf8(out)?)
    }

    /// Writes the registered keys to disk and returns the written path.
    ///
    /// Without an explicit `location` the first existing candidate is used,
    /// falling back to the lowest priority one when none exist yet.
    ///
    /// # Arguments
    ///
    /// * `location` - Optional directory or file to write instead of the default choice.
    ///
    /// # Returns
    ///
    /// * `Result<PathBuf>` - The path of the file that was written.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if serialization fails, the parent directory cannot be
    /// created, or the atomic write fails (`HostError::Io`).
    pub fn save(&self, location: Option<&Path>) -> Result<PathBuf> {
        let target = match location {
            Some(location) => suffix_path(location, &self.file_name),
            None => {
                let status = self.status();
                status
                    .iter()
                    .find(|loc| loc.exists)
                    .or_else(|| status.last())
                    .map(|loc| loc.path.clone())
                    .ok_or_else(|| HostError::Config("No config location".to_string()))?
            }
        };

        let content = self.to_json_string()?;
        io::write_string_atomically(&target, &content)?;
        info!("Saved configuration to {}", target.display());
        Ok(target)
    }
}

/// Default config locations for the binary, highest priority first:
/// `$MODHOST_CONFIG` (if set), the current directory, the user config directory.
pub fn default_locations(cwd: &Path) -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        if !explicit.trim().is_empty() {
            locations.push(io::expand_path(explicit.trim(), cwd));
        }
    }

    locations.push(cwd.to_path_buf());

    if let Some(proj_dirs) = ProjectDirs::from("", "", "modhost") {
        locations.push(proj_dirs.config_dir().to_path_buf());
    } else {
        debug!("Could not determine user config directory.");
    }

    locations
}
