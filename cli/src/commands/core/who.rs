//! # `who` Command
//!
//! File: cli/src/commands/core/who.rs
//!
//! Describes the running configuration: host name, install location and the
//! config layers (missing ones marked), followed by whatever every enabled
//! module contributes through its context informers.
//!
use crate::common::ui::Console;
use crate::core::app::{install_dir, AppHost};
use crate::core::dispatch::Request;
use crate::core::error::Result;
use crate::core::module::ModuleApi;
use std::env;
use std::fs;

pub fn register(api: &mut ModuleApi<'_>) {
    api.register_command("who")
        .add_alias("whoami")
        .set_description("Tells you what you are, and what you're doing here.")
        .set_controller(who_controller);
}

fn hostname() -> String {
    env::var("HOSTNAME")
        .or_else(|_| env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn who_controller(host: &mut AppHost, request: &Request, console: &Console) -> Result<()> {
    console.caption(format!("{} who", host.get_info().name));

    let config = host
        .config()
        .status()
        .iter()
        .map(|location| {
            let suffix = if location.exists { "" } else { " (missing)" };
            format!("{}{}", location.path.display(), suffix)
        })
        .collect::<Vec<_>>()
        .join("\n");

    console.properties(&[
        ("Hostname", hostname()),
        ("Install", install_dir().display().to_string()),
        ("Config", config),
    ]);

    let informers = host.registry().context_informers();
    for informer in informers {
        informer(host, request, console)?;
    }
    Ok(())
}
