//! # Modhost Core Module
//!
//! File: cli/src/commands/core/mod.rs
//!
//! ## Overview
//!
//! The module every host enables first, as a hidden built-in. It provides the
//! commands a bare host needs to be useful:
//!
//! - the root controller, printing a logo and a usage hint (`motd`),
//! - the global `--help` flag and its renderer (`help`),
//! - `module`, to add, remove and list modules persisted in the config,
//! - `who` (alias `whoami`), describing the running configuration.
//!
//! It also registers the context informer that lists the visible modules
//! in the `who` output.
//!
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::dispatch::Request;
use crate::core::error::Result;
use crate::core::module::{ModuleApi, ModuleManifest};
use serde_json::Value;

pub mod help;
pub mod module;
pub mod motd;
pub mod who;

/// Name of the core module.
pub const NAME: &str = "core";

/// Catalog name of the core module entry point.
pub const ENTRY_NAME: &str = "modhost-core";

/// Manifest of the compiled-in core module.
pub fn manifest() -> ModuleManifest {
    ModuleManifest {
        name: NAME.to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        description: Some(env!("CARGO_PKG_DESCRIPTION").to_string()),
        main: Some(ENTRY_NAME.to_string()),
    }
}

/// Entry point. `extra[0]` may carry `{"silent": bool}`.
pub fn load(api: &mut ModuleApi<'_>, extra: &[Value]) -> Result<()> {
    let silent = extra
        .first()
        .and_then(|options| options.get("silent"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    api.register_context_informer(modules_informer);

    motd::register(api, silent);
    module::register(api);
    help::register(api);
    who::register(api);
    Ok(())
}

fn modules_informer(host: &AppHost, _request: &Request, console: &Console) -> Result<()> {
    console.caption("Modules");

    let visible: Vec<_> = host
        .registry()
        .modules()
        .iter()
        .filter(|module| !module.is_hidden())
        .map(|module| module.get_info())
        .collect();

    if visible.is_empty() {
        console.debug("No external modules loaded.");
        return Ok(());
    }

    for info in visible {
        console.log(&info.name);
        console.indent();
        console.properties(&module::info_rows(&info));
        console.outdent();
    }
    Ok(())
}
