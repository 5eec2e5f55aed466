//! # Modhost Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared, domain-agnostic helpers used by the host infrastructure in `core::`
//! and by the built-in commands in `commands::`:
//!
//! - **`fs`**: JSON reads (strict and lenient), atomic writes, path expansion.
//! - **`ui`**: the `Console` output sink every controller writes to.
//!

/// Utilities for filesystem operations.
pub mod fs;
/// The write-only console sink.
pub mod ui;
