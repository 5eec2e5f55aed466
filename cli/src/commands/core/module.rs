//! # `module` Command
//!
//! File: cli/src/commands/core/module.rs
//!
//! ## Overview
//!
//! Manages the modules persisted in the `modules` config key:
//!
//! ```bash
//! modhost module --add ./anywhere/my-module      # enable and save
//! modhost module --remove ./anywhere/my-module   # disable and save
//! modhost module --add ./a --dry                 # enable for this run only
//! modhost module --list --verbose                # show what is enabled
//! ```
//!
//! Paths are resolved against the current directory. Removals run before
//! additions. Each outcome is reported as one property line; a module that
//! fails to load is reported as skipped and does not abort the others.
//!
use crate::common::fs::io;
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::command::OptionSpec;
use crate::core::dispatch::Request;
use crate::core::error::Result;
use crate::core::module::{ModuleApi, ModuleInfo};
use crate::core::registry::same_path;
use std::path::Path;
use tracing::debug;

pub fn register(api: &mut ModuleApi<'_>) {
    let app_name = api.get_app_info().name;
    api.register_command("module")
        .set_description("Tool's module management.")
        .set_controller(module_controller)
        .add_option(OptionSpec::multi("add").short('a').description("Add a module."))
        .add_option(OptionSpec::multi("remove").short('r').description("Remove a module."))
        .add_option(
            OptionSpec::flag("dry")
                .short('D')
                .description("Simulated run, do not save the new module configuration."),
        )
        .add_option(OptionSpec::flag("list").short('l').description("List all enabled modules."))
        .add_option(
            OptionSpec::flag("verbose")
                .short('v')
                .description("Use verbose output when listing modules."),
        )
        .add_example(
            &format!("{} module --add ./anywhere/my-module", app_name),
            "Add a module to the tool and store it in the configuration file.",
        )
        .add_example(
            &format!("{} module --remove ./anywhere/my-module", app_name),
            "Remove a module from the tool and store it in the configuration file.",
        )
        .add_example(
            &format!("{} module --list --verbose", app_name),
            "List the enabled modules with their version, description and location.",
        );
}

/// Property rows describing a module, without its name.
pub fn info_rows(info: &ModuleInfo) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    if let Some(version) = &info.version {
        rows.push(("version".to_string(), version.clone()));
    }
    if let Some(description) = &info.description {
        rows.push(("description".to_string(), description.clone()));
    }
    rows.push(("path".to_string(), info.path.display().to_string()));
    rows
}

fn label(info: &ModuleInfo) -> String {
    format!(
        "{} ({})",
        info.name,
        info.version.as_deref().unwrap_or("unversioned")
    )
}

fn module_controller(host: &mut AppHost, request: &Request, console: &Console) -> Result<()> {
    console.caption(host.tree().long_name(request.command));

    if request.flag("list") {
        let infos = host.registry().infos();
        if request.flag("verbose") {
            for info in &infos {
                console.caption(&info.name);
                console.indent();
                console.properties(&info_rows(info));
                console.outdent();
            }
        } else {
            let names: Vec<&str> = infos.iter().map(|info| info.name.as_str()).collect();
            console.list(&names, "-");
        }
        return Ok(());
    }

    let to_remove = request.values("remove");
    let to_add = request.values("add");
    if to_remove.is_empty() && to_add.is_empty() {
        console.debug("No modules to add or remove");
        return Ok(());
    }

    if !to_remove.is_empty() {
        console.debug(format!("Try disabling {} modules", to_remove.len()));
    }
    for raw in to_remove {
        let path = io::expand_path(raw, host.process_path());
        if !is_loaded(host, &path) {
            console.property("skipped", format!("{} was not loaded", path.display()));
            continue;
        }
        for info in host.disable_module(&path) {
            console.property("disable", label(&info));
        }
    }

    if !to_add.is_empty() {
        console.debug(format!("Try enabling {} modules", to_add.len()));
    }
    for raw in to_add {
        let path = io::expand_path(raw, host.process_path());
        match host.enable_module(&path, &[]) {
            Ok(Some(info)) => console.property("enabled", label(&info)),
            Ok(None) => console.property("skipped", format!("{} is already loaded", path.display())),
            Err(err) => {
                debug!("Enabling {:?} failed: {:?}", path, err);
                console.property("skipped", format!("{:#}", err));
            }
        }
    }

    console.break_line();

    if request.flag("dry") {
        console.notice("Not saving configuration file");
        return Ok(());
    }

    let location = host.save_config()?;
    let file_name = location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.display().to_string());
    console.success(format!("Saved {}", file_name));
    console.debug(format!(
        "Type \"{} who\" to find your current running configuration.",
        host.get_info().name
    ));
    Ok(())
}

fn is_loaded(host: &AppHost, path: &Path) -> bool {
    host.registry()
        .modules()
        .iter()
        .any(|module| same_path(module.path(), path))
}
