//! # Modhost Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error taxonomy used throughout the host. It follows
//! the same two-part approach as the rest of the crate:
//! - `HostError`: a `thiserror` enum naming the failure categories the host
//!   reacts to differently (fatal configuration problems, module load failures,
//!   user input errors, I/O on save).
//! - `Result<T>`: an alias for `anyhow::Result<T>` so callers can attach context
//!   freely while still being able to `downcast_ref::<HostError>()`.
//!
//! ## Categories
//!
//! - `Config`: no usable config location. Fatal at construction.
//! - `ModuleLoad` / `NotCallable`: a module could not be read or its entry point
//!   could not be resolved. Skipped during boot, propagated for explicit enables.
//! - `ControllerLoad`: a lazily bound controller failed to resolve at invocation.
//! - `Input`: the command line did not match the tree. Rendered with its
//!   `solution` hint by `AppHost::error`.
//! - `Io`: writing the config file failed.
//!
//! ## Examples
//!
//! ```rust
//! use modhost::core::error::{input_solution, HostError};
//!
//! let err = anyhow::Error::new(HostError::Input {
//!     message: "Could not find a match for input \"nope\"".into(),
//!     solution: Some("Use --help to list the available commands.".into()),
//! });
//! assert!(input_solution(&err).is_some());
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for the module host.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not load module at '{path}': {reason}")]
    ModuleLoad { path: PathBuf, reason: String },

    #[error("{name} is not a function.")]
    NotCallable { name: String },

    #[error("Could not load controller '{path}': {reason}")]
    ControllerLoad { path: PathBuf, reason: String },

    /// An error caused by what the user typed. `solution`, when present, is a
    /// remediation hint printed under the message.
    #[error("{message}")]
    Input {
        message: String,
        solution: Option<String>,
    },

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    /// Shorthand for an input error carrying a remediation hint.
    pub fn input(message: impl Into<String>, solution: impl Into<String>) -> Self {
        HostError::Input {
            message: message.into(),
            solution: Some(solution.into()),
        }
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Returns `Some(solution)` when `err` is (or wraps) an input error.
///
/// The outer `Option` tells whether the error is an input error at all; the
/// inner one carries the optional hint.
pub fn input_solution(err: &anyhow::Error) -> Option<Option<&str>> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<HostError>())
        .and_then(|host_err| match host_err {
            HostError::Input { solution, .. } => Some(solution.as_deref()),
            _ => None,
        })
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        let config_err = HostError::Config("No config location".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: No config location"
        );

        let not_callable = HostError::NotCallable {
            name: "broken-module".into(),
        };
        assert_eq!(not_callable.to_string(), "broken-module is not a function.");

        let input = HostError::input("Could not find a match for input \"x\"", "hint");
        assert_eq!(input.to_string(), "Could not find a match for input \"x\"");
    }

    #[test]
    fn test_input_solution_sees_through_context() {
        let err = Err::<(), _>(HostError::input("bad input", "try --help"))
            .context("while running")
            .unwrap_err();
        assert_eq!(input_solution(&err), Some(Some("try --help")));

        let generic = anyhow::anyhow!("something else");
        assert_eq!(input_solution(&generic), None);
    }
}
