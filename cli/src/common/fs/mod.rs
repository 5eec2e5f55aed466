//! # Modhost Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//!
//! ## Overview
//!
//! Filesystem helpers shared by the config store, the module loader and the
//! lazy controller resolver. Everything lives in the `io` submodule; callers
//! import it directly (`crate::common::fs::io::read_json`).
//!

/// Reading manifests and config layers, atomic writes, path expansion.
pub mod io;
