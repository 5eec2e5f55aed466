//! # Modhost Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the host machinery that modules plug into. Nothing
//! here knows about any particular command; the built-in commands live in
//! `commands::core` and are loaded through the same path as any other module.
//!
//! ## Architecture
//!
//! - `error`: the `HostError` taxonomy and the crate-wide `Result` alias.
//! - `config`: the layered JSON config store with per-key serializers.
//! - `command`: the arena command tree, its builder and controller binding.
//! - `dispatch`: projects the tree onto clap and produces a `Request`.
//! - `module`: manifests, the `ModuleApi` façade and the entry catalog.
//! - `registry`: the ordered, name-unique set of enabled modules.
//! - `app`: `AppHost`, which boots everything and runs argument lists.
//!
//! ## Usage
//!
//! ```rust
//! use modhost::core::command::{CommandTree, OptionSpec};
//! use modhost::core::dispatch::interpret;
//!
//! let mut tree = CommandTree::new("app");
//! let root = tree.root();
//! tree.command(root)
//!     .add_command("greet")
//!     .add_parameter("name", Some("Who to greet"), true)
//!     .add_option(OptionSpec::flag("loud").short('l'));
//!
//! let args = vec!["greet".to_string(), "world".to_string(), "-l".to_string()];
//! let request = interpret(&tree, &args).unwrap();
//! assert_eq!(request.parameter("name"), Some("world"));
//! assert!(request.flag("loud"));
//! ```
//!
pub mod app;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod module;
pub mod registry;
