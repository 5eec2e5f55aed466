//! # Modhost Core Command Integration Tests
//!
//! File: cli/tests/core_commands.rs
//!
//! ## Overview
//!
//! Exercises the commands of the built-in core module through `AppHost::run`:
//! the root controller, `--help`, `module` and `who`.
//!

mod common;
use common::*;
use modhost::core::app::RunStatus;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn saved_modules(dir: &std::path::Path) -> Value {
    let raw = fs::read_to_string(dir.join(CONFIG_FILE_NAME)).unwrap();
    let config: Value = serde_json::from_str(&raw).unwrap();
    config["modules"].clone()
}

// --- root controller ---

#[test]
fn test_motd_prints_logo_version_and_hint() {
    let dir = tempdir().unwrap();
    let (mut host, output) = test_host(dir.path());
    assert_eq!(host.run(&[]).unwrap(), RunStatus::Completed);
    assert!(output.contains(&format!("v{}", APP_VERSION)));
    assert!(output.contains(&format!("Run \"{} --help\" to show usage information.", APP_NAME)));
}

#[test]
fn test_motd_uses_configured_logos() {
    let dir = tempdir().unwrap();
    write_config(
        dir.path(),
        json!({ "logo": { "logoIndex": 3, "logos": [["FIRST-LOGO"], ["SECOND-LOGO"]] } }),
    );
    let (mut host, output) = test_host(dir.path());
    host.run(&[]).unwrap();
    assert!(output.contains("  SECOND-LOGO\n"));
    assert!(!output.contains("FIRST-LOGO"));
}

#[test]
fn test_motd_without_logos_shows_app_name() {
    let dir = tempdir().unwrap();
    write_config(dir.path(), json!({ "logo": { "logos": [] } }));
    let (mut host, output) = test_host(dir.path());
    host.run(&[]).unwrap();
    assert!(output.contains(&format!("\n{}\n", APP_NAME)));
}

// --- help ---

#[test]
fn test_root_help_lists_children_and_options() {
    let dir = tempdir().unwrap();
    let (mut host, output) = test_host(dir.path());
    host.run(&args(&["--help"])).unwrap();

    let text = output.contents();
    assert!(text.contains(&format!("{} --help", APP_NAME)));
    assert!(text.contains("Child commands"));
    assert!(text.contains("module\n  Tool's module management."));
    assert!(text.contains("who\n  Tells you what you are"));
    assert!(text.contains("-h  --help"));
    assert!(text.contains("Show usage information, works for any command."));
    // Children are sorted by name.
    assert!(text.find("module\n").unwrap() < text.find("who\n").unwrap());
}

#[test]
fn test_command_help_shows_parameters_options_and_aliases() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    let (mut host, output) = test_host(dir.path());
    host.enable_module(&module, &[]).unwrap();

    host.run(&args(&["test-command-1", "-h"])).unwrap();
    let text = output.contents();
    assert!(text.contains("help for the test-command-1 command"));
    assert!(text.contains(&format!("{} test-command-1 <tp1> <tp2>", APP_NAME)));
    assert!(text.contains("Test command is used for test cases."));
    assert!(text.contains("Parameters"));
    assert!(text.contains("<tp1>  A parameter for testing"));
    assert!(text.contains("<tp2>  <no description> [required]"));
    assert!(text.contains("-t  --to1"));
    assert!(text.contains("A option for testing"));
    assert!(text.contains("--  --to2"));
    assert!(text.contains("<no description> [required]"));

    output.reset();
    host.run(&args(&["whoami", "--help"])).unwrap();
    assert!(output.contains("Aliases"));
    assert!(output.contains("whoami"));
    assert!(output.contains("Summary"));
}

#[test]
fn test_module_help_shows_examples() {
    let dir = tempdir().unwrap();
    let (mut host, output) = test_host(dir.path());
    host.run(&args(&["module", "--help"])).unwrap();
    assert!(output.contains("Examples"));
    assert!(output.contains(&format!("{} module --list --verbose", APP_NAME)));
    assert!(output.contains("-a  --add"));
    assert!(output.contains("-D  --dry"));
}

// --- module ---

#[test]
fn test_module_add_enables_and_saves() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    let (mut host, output) = test_host(dir.path());

    host.run(&args(&["module", "--add", &module.display().to_string()])).unwrap();
    assert!(output.contains("enabled"));
    assert!(output.contains("test-module-1 (1.0.0)"));
    assert!(output.contains(&format!("Saved {}", CONFIG_FILE_NAME)));
    assert!(output.contains(&format!("Type \"{} who\"", APP_NAME)));
    assert_eq!(saved_modules(dir.path()), json!([module.display().to_string()]));

    let root = host.tree().root();
    assert!(host.tree().find_child(root, "test-command-1").is_some());
}

#[test]
fn test_module_add_reports_failures_and_continues() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    let broken = dir.path().join("no-such-module");
    let (mut host, output) = test_host(dir.path());

    host.run(&args(&[
        "module",
        "-a",
        &broken.display().to_string(),
        "-a",
        &module.display().to_string(),
    ]))
    .unwrap();
    assert!(output.contains("skipped"));
    assert!(output.contains("Could not load module"));
    assert!(output.contains("test-module-1 (1.0.0)"));
    assert_eq!(saved_modules(dir.path()), json!([module.display().to_string()]));
}

#[test]
fn test_module_dry_run_does_not_save() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    let (mut host, output) = test_host(dir.path());

    host.run(&args(&["module", "--add", &module.display().to_string(), "--dry"])).unwrap();
    assert!(output.contains("Not saving configuration file"));
    assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
}

#[test]
fn test_module_remove_disables_and_saves() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    write_config(dir.path(), json!({ "modules": [module.display().to_string()] }));
    let (mut host, output) = test_host(dir.path());

    host.run(&args(&["module", "-r", &module.display().to_string()])).unwrap();
    assert!(output.contains("disable"));
    assert_eq!(saved_modules(dir.path()), json!([]));

    output.reset();
    host.run(&args(&["module", "-r", &module.display().to_string(), "-D"])).unwrap();
    assert!(output.contains("was not loaded"));
}

#[test]
fn test_module_without_arguments_does_nothing() {
    let dir = tempdir().unwrap();
    let (mut host, output) = test_host(dir.path());
    host.run(&args(&["module"])).unwrap();
    assert!(output.contains("No modules to add or remove"));
    assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
}

#[test]
fn test_module_list() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    let (mut host, output) = test_host(dir.path());
    host.enable_module(&module, &[]).unwrap();

    host.run(&args(&["module", "--list"])).unwrap();
    assert!(output.contains("- core\n"));
    assert!(output.contains("- test-module-1\n"));

    output.reset();
    host.run(&args(&["module", "-l", "-v"])).unwrap();
    assert!(output.contains("The test-module-1 module"));
    assert!(output.contains(&module.display().to_string()));
}

// --- who ---

#[test]
fn test_who_without_external_modules() {
    let dir = tempdir().unwrap();
    let (mut host, output) = test_host(dir.path());
    host.run(&args(&["who"])).unwrap();

    let text = output.contents();
    assert!(text.contains(&format!("{} who", APP_NAME)));
    assert!(text.contains("Hostname"));
    assert!(text.contains("Install"));
    assert!(text.contains(&format!(
        "{} (missing)",
        dir.path().join(CONFIG_FILE_NAME).display()
    )));
    assert!(text.contains("Modules"));
    assert!(text.contains("No external modules loaded."));
}

#[test]
fn test_who_runs_module_informers() {
    let dir = tempdir().unwrap();
    let module = write_test_module(dir.path());
    write_config(dir.path(), json!({ "modules": [module.display().to_string()] }));
    let (mut host, output) = test_host(dir.path());

    host.run(&args(&["whoami"])).unwrap();
    let text = output.contents();
    assert!(!text.contains("(missing)"));
    assert!(!text.contains("No external modules loaded."));
    assert!(text.contains("test-module-1\n"));
    assert!(text.contains("test context informer"));
    // The hidden core module is not listed.
    assert!(!text.contains("\ncore\n"));
}
