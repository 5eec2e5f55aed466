//! # Modhost
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! A host for pluggable command-line tools. Modules are directories with a
//! `module.json` manifest; when enabled they contribute commands to one
//! shared command tree, register keys in a layered JSON configuration and
//! add context to the `who` command. The host persists which modules are
//! enabled in that same configuration.
//!
//! Module entry points and lazily bound controllers are resolved by name
//! through an `EntryCatalog`, so an embedding binary registers its code once
//! and manifests on disk select what gets loaded:
//!
//! ```rust,no_run
//! use modhost::core::app::{AppHost, HostOptions};
//! use modhost::core::config::CONFIG_FILE_NAME;
//! use modhost::core::module::EntryCatalog;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut catalog = EntryCatalog::new();
//! catalog.register_module("greeter", |api, _extra| {
//!     api.register_command("hello")
//!         .set_description("Say hello.")
//!         .set_controller(|_host, _request, console| {
//!             console.log("Hello!");
//!             Ok(())
//!         });
//!     Ok(())
//! });
//!
//! let cwd = std::env::current_dir()?;
//! let mut host = AppHost::new(vec![cwd], CONFIG_FILE_NAME, HostOptions::default(), catalog)?;
//! host.run(&["hello".to_string()])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - `core`: host infrastructure (config, command tree, dispatch, modules).
//! - `common`: filesystem and console helpers.
//! - `commands`: the built-in core module (`help`, `module`, `who`, root).
//!

/// Built-in command modules.
pub mod commands;
/// Shared helpers.
pub mod common;
/// Host infrastructure.
pub mod core;
