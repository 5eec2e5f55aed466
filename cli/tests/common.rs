//! # Modhost Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared fixtures for the integration tests in `cli/tests/`:
//! - `modhost_cmd`: the compiled binary, isolated from the user's config.
//! - `test_catalog` / `write_test_module`: a module exercising every
//!   registration feature, and its directory on disk.
//! - `test_host`: an `AppHost` writing to a captured console.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use modhost::common::ui::{CapturedOutput, Console};
use modhost::core::app::{AppHost, HostOptions};
use modhost::core::command::OptionSpec;
use modhost::core::module::{EntryCatalog, MANIFEST_FILE_NAME};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".modhosttestrc";
pub const APP_NAME: &str = "modhost-test";
pub const APP_VERSION: &str = "1.2.3";
pub const TEST_MODULE: &str = "test-module-1";
pub const LAZY_CONTROLLER: &str = "test-lazy-load";
pub const LAZY_DESCRIPTOR: &str = "src/testLazyLoadCommand.json";

/// The `modhost` binary, running in `home` with no outside config layers.
pub fn modhost_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("modhost").expect("Failed to find modhost binary for testing");
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("MODHOST_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

pub fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Catalog with the `test-module-1` entry point and its lazy controller.
pub fn test_catalog() -> EntryCatalog {
    let mut catalog = EntryCatalog::new();

    catalog.register_module(TEST_MODULE, |api, _extra| {
        api.register_configuration("test-configuration", json!("test"), None);

        api.register_command("test-command-1")
            .set_long_description("Test command is used for test cases.")
            .add_parameter("tp1", Some("A parameter for testing"), false)
            .add_parameter("tp2", None, true)
            .add_option(OptionSpec::flag("to1").short('t').description("A option for testing"))
            .add_option(OptionSpec::value("to2").required())
            .set_controller(|_, request, console| {
                console.log(format!("tp2 is {}", request.parameter("tp2").unwrap_or("-")));
                Ok(())
            });

        api.register_command("test-command-2")
            .set_long_description("Test command is used for test cases.")
            .set_as_help_command(true);

        api.register_command("test-command-3")
            .set_long_description("Test command is used for test cases.")
            .set_as_help_command(true)
            .set_as_help_command(false);

        api.register_command("test-command-4")
            .set_lazy_controller(LAZY_DESCRIPTOR)
            .add_command("test-command-4-sub-command-1")
            .set_lazy_controller(LAZY_DESCRIPTOR);

        let absolute = api.get_info().path.join(LAZY_DESCRIPTOR);
        api.register_command("test-command-5").set_lazy_controller(absolute);

        api.register_command("test-command-6")
            .add_command("test-command-6-sub-command")
            .set_lazy_controller(LAZY_DESCRIPTOR);

        api.register_command("test-command-7")
            .set_lazy_controller("src/doesNotExist.json");

        api.register_context_informer(|_, _, console| {
            console.caption("Test");
            console.debug("test context informer");
            Ok(())
        });
        Ok(())
    });

    catalog.register_controller(LAZY_CONTROLLER, |host, request, console| {
        let tree = host.tree();
        console.caption(format!(
            "Test lazy load command: \"{}\"",
            tree.node(request.command).name()
        ));
        console.property(
            "module registration",
            tree.module_registration(request.command).unwrap_or("(none)"),
        );
        Ok(())
    });

    catalog
}

/// Writes a module directory with a manifest. `main` overrides the entry name.
pub fn write_module(root: &Path, dir_name: &str, name: &str, main: Option<&str>) -> PathBuf {
    let path = root.join(dir_name);
    fs::create_dir_all(&path).unwrap();
    let mut manifest = json!({
        "name": name,
        "version": "1.0.0",
        "description": format!("The {} module", name)
    });
    if let Some(main) = main {
        manifest["main"] = json!(main);
    }
    fs::write(path.join(MANIFEST_FILE_NAME), manifest.to_string()).unwrap();
    path
}

/// `test-module-1` on disk, including its lazy controller descriptor.
pub fn write_test_module(root: &Path) -> PathBuf {
    let path = write_module(root, TEST_MODULE, TEST_MODULE, None);
    fs::create_dir_all(path.join("src")).unwrap();
    fs::write(
        path.join(LAZY_DESCRIPTOR),
        json!({ "controller": LAZY_CONTROLLER }).to_string(),
    )
    .unwrap();
    path
}

/// A host over the single config location `config_dir`, errors propagating.
pub fn test_host(config_dir: &Path) -> (AppHost, CapturedOutput) {
    let (console, output) = Console::captured();
    let host = AppHost::new(
        vec![config_dir.to_path_buf()],
        CONFIG_FILE_NAME,
        HostOptions {
            app_name: Some(APP_NAME.to_string()),
            app_version: Some(APP_VERSION.to_string()),
            catch_errors: false,
            silent: false,
            console: Some(console),
            process_path: Some(config_dir.to_path_buf()),
        },
        test_catalog(),
    )
    .expect("host should boot");
    (host, output)
}

/// Writes `content` as the config file in `dir`.
pub fn write_config(dir: &Path, content: serde_json::Value) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(CONFIG_FILE_NAME), content.to_string()).unwrap();
}
