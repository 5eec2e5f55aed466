//! # Modhost Built-in Commands
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! Command modules compiled into the binary. Each one is an ordinary module
//! (a manifest plus an entry point registered in the `EntryCatalog`); the host
//! enables them as built-ins so they are never written to the config file.
//!
//! ## Modules
//!
//! - `core`: the root controller, `--help`, `module` and `who`.
//!

/// The core module every host enables first.
pub mod core;
