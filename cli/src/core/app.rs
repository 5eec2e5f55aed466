//! # Modhost Application Host
//!
//! File: cli/src/core/app.rs
//!
//! ## Overview
//!
//! `AppHost` ties the pieces together: it owns the layered configuration,
//! the command tree, the module registry and the entry catalog, boots the
//! core module plus every module persisted in the `modules` config key,
//! and executes argument lists against the result.
//!
//! ## Boot Sequence
//!
//! 1. Read every config layer (`ConfigStore::new`). No usable location is fatal.
//! 2. Create the root command, named after the application.
//! 3. Register the `modules` key, serialized from the registry at save time.
//! 4. Enable the core module as a hidden built-in.
//! 5. Enable each persisted module path in order. A module that fails to
//!    load is reported and skipped; it stays in the registry's config value
//!    only if it loaded.
//!
//! ## Execution
//!
//! `run` matches the arguments, runs the pre-controllers from the root down
//! to the matched command (any of them may halt), checks required input and
//! finally invokes the command's controller. Errors are rendered on the
//! console and reported as `RunStatus::Failed` unless `catch_errors` is off,
//! in which case they propagate to the caller.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use modhost::core::app::{AppHost, HostOptions};
//! use modhost::core::config::{default_locations, CONFIG_FILE_NAME};
//! use modhost::core::module::EntryCatalog;
//!
//! # fn main() -> anyhow::Result<()> {
//! let cwd = std::env::current_dir()?;
//! let mut host = AppHost::new(
//!     default_locations(&cwd),
//!     CONFIG_FILE_NAME,
//!     HostOptions::default(),
//!     EntryCatalog::new(),
//! )?;
//! let status = host.run(&["who".to_string()])?;
//! std::process::exit(status.exit_code());
//! # }
//! ```
//!
use crate::commands::core::{self as core_module, help};
use crate::common::fs::io;
use crate::common::ui::Console;
use crate::core::command::{CommandTree, Controller, ControllerFn, Flow, NodeId};
use crate::core::config::ConfigStore;
use crate::core::dispatch;
use crate::core::error::{input_solution, HostError, Result};
use crate::core::module::{AppInfo, EntryCatalog, LoadEnv, ModuleHandle, ModuleInfo};
use crate::core::registry::{ModuleRegistry, MODULES_CONFIG_KEY};
use anyhow::Context;
use serde_json::{json, Value};
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Construction options for `AppHost`.
#[derive(Clone)]
pub struct HostOptions {
    /// Defaults to the executable's file stem.
    pub app_name: Option<String>,
    pub app_version: Option<String>,
    /// Render errors and return `RunStatus::Failed` instead of propagating.
    pub catch_errors: bool,
    /// Suppress decorative output (the logo). Also selects a silent console
    /// when no console is given.
    pub silent: bool,
    pub console: Option<Console>,
    /// Base directory for relative module paths. Defaults to the current
    /// working directory.
    pub process_path: Option<PathBuf>,
}

impl Default for HostOptions {
    fn default() -> Self {
        HostOptions {
            app_name: None,
            app_version: None,
            catch_errors: true,
            silent: false,
            console: None,
            process_path: None,
        }
    }
}

/// How a run ended when errors are caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::Failed => 1,
        }
    }
}

pub struct AppHost {
    info: AppInfo,
    config: ConfigStore,
    tree: CommandTree,
    registry: ModuleRegistry,
    catalog: EntryCatalog,
    console: Console,
    process_path: PathBuf,
    catch_errors: bool,
    silent: bool,
}

impl AppHost {
    /// Reads configuration from `locations` and boots the core module and
    /// every persisted module.
    ///
    /// # Arguments
    ///
    /// * `locations` - Config locations, highest priority first.
    /// * `file_name` - Config file name inside each location.
    /// * `options` - Identity, console and error handling of the host.
    /// * `catalog` - Compiled-in module entry points and controllers. The core
    ///   module's entry is added to it.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The booted host.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if no config location is usable, the current directory
    /// cannot be determined (when `options.process_path` is unset) or the core
    /// module fails to load. Persisted modules that fail are rendered on the
    /// console and skipped, never returned.
    pub fn new(
        locations: Vec<PathBuf>,
        file_name: &str,
        options: HostOptions,
        mut catalog: EntryCatalog,
    ) -> Result<Self> {
        let config = ConfigStore::new(locations, file_name)?;
        let name = options.app_name.unwrap_or_else(default_app_name);
        let console = match options.console {
            Some(console) => console,
            None if options.silent => Console::silent(),
            None => Console::stdout(),
        };
        let process_path = match options.process_path {
            Some(path) => path,
            None => env::current_dir().context("Failed to determine the current directory")?,
        };
        catalog.register_module(core_module::ENTRY_NAME, core_module::load);

        let mut host = AppHost {
            tree: CommandTree::new(&name),
            info: AppInfo {
                name,
                version: options.app_version,
            },
            config,
            registry: ModuleRegistry::new(),
            catalog,
            console,
            process_path,
            catch_errors: options.catch_errors,
            silent: options.silent,
        };

        let persisted = host.config.register_config(
            MODULES_CONFIG_KEY,
            json!([]),
            Some(host.registry.serializer()),
        );

        host.enable_core()?;

        let paths: Vec<String> = persisted
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        for raw in paths {
            let path = io::expand_path(&raw, &host.process_path);
            if let Err(err) = host.enable_module(&path, &[]) {
                warn!("Skipping module {:?}: {:#}", path, err);
                host.error(&format!("Could not load module \"{}\"", raw), &err, None);
            }
        }

        info!("Host '{}' booted with {} module(s)", host.info.name, host.registry.infos().len());
        Ok(host)
    }

    fn enable_core(&mut self) -> Result<()> {
        let handle = ModuleHandle::from_manifest(core_module::manifest(), install_dir());
        let extra = [json!({ "silent": self.silent })];
        let env = LoadEnv {
            tree: &mut self.tree,
            config: &mut self.config,
            catalog: &self.catalog,
            app: &self.info,
            console: &self.console,
        };
        self.registry.enable_handle(handle, true, &extra, env)?;
        self.registry.set_hidden(core_module::NAME, true);
        Ok(())
    }

    /// Enables the module at `path`. `Ok(None)` means a module with the same
    /// name was already enabled and nothing was loaded.
    pub fn enable_module(&mut self, path: &Path, extra: &[Value]) -> Result<Option<ModuleInfo>> {
        let env = LoadEnv {
            tree: &mut self.tree,
            config: &mut self.config,
            catalog: &self.catalog,
            app: &self.info,
            console: &self.console,
        };
        self.registry.enable_module(path, extra, env)
    }

    /// Enables a module that is never written to the `modules` config key.
    pub fn enable_built_in_module(
        &mut self,
        path: &Path,
        extra: &[Value],
    ) -> Result<Option<ModuleInfo>> {
        let env = LoadEnv {
            tree: &mut self.tree,
            config: &mut self.config,
            catalog: &self.catalog,
            app: &self.info,
            console: &self.console,
        };
        self.registry.enable_built_in_module(path, extra, env)
    }

    pub fn disable_module(&mut self, path: &Path) -> Vec<ModuleInfo> {
        self.registry.disable_module(path)
    }

    pub fn get_info(&self) -> AppInfo {
        self.info.clone()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConfigStore {
        &mut self.config
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut CommandTree {
        &mut self.tree
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &EntryCatalog {
        &self.catalog
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Directory relative module paths resolve against.
    pub fn process_path(&self) -> &Path {
        &self.process_path
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn set_catch_errors(&mut self, catch_errors: bool) {
        self.catch_errors = catch_errors;
    }

    /// Writes the configuration to the first existing location (or the last
    /// configured one) and returns the written file.
    pub fn save_config(&self) -> Result<PathBuf> {
        self.config.save(None)
    }

    /// Executes one argument list (without the binary name).
    ///
    /// # Arguments
    ///
    /// * `args` - The command line after the binary name.
    ///
    /// # Returns
    ///
    /// * `Result<RunStatus>` - `Completed`, or `Failed` when an error was caught
    ///   and rendered. The console is flushed before returning either way.
    ///
    /// # Errors
    ///
    /// Only when `catch_errors` is off: any input, controller or lookup error
    /// from the run is returned unrendered.
    pub fn run(&mut self, args: &[String]) -> Result<RunStatus> {
        let outcome = self.execute(args);
        let status = match outcome {
            Ok(()) => RunStatus::Completed,
            Err(err) if self.catch_errors => {
                let vars = [
                    ("cwd".to_string(), self.process_path.display().to_string()),
                    ("args".to_string(), quote_args(args)),
                    ("mods".to_string(), self.module_summary()),
                ];
                self.error("Failure", &err, Some(&vars[..]));
                RunStatus::Failed
            }
            Err(err) => {
                self.console.flush();
                return Err(err);
            }
        };
        self.console.flush();
        Ok(status)
    }

    fn execute(&mut self, args: &[String]) -> Result<()> {
        let request = dispatch::interpret(&self.tree, args)?;
        let console = self.console.clone();

        for id in self.tree.path_to(request.command) {
            let pre_controllers = self.tree.node(id).pre_controllers().to_vec();
            for pre_controller in pre_controllers {
                if pre_controller(self, &request, &console)? == Flow::Halt {
                    debug!("Execution halted by a pre-controller of '{}'", self.tree.node(id).name());
                    return Ok(());
                }
            }
        }

        dispatch::check_required(&self.tree, &request)?;

        match self.controller_for(request.command)? {
            Some(controller) => controller(self, &request, &console),
            None if self.tree.node(request.command).is_help_command() => {
                help::render_help(self, request.command, &console);
                Ok(())
            }
            None => Err(HostError::input(
                format!(
                    "Command \"{}\" cannot be run on its own",
                    self.tree.node(request.command).name()
                ),
                "Use the \"--help\" flag to list its child commands.",
            )
            .into()),
        }
    }

    fn module_summary(&self) -> String {
        self.registry
            .infos()
            .iter()
            .map(|info| format!("{} ({})", info.name, info.version.as_deref().unwrap_or("-")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn controller_for(&self, id: NodeId) -> Result<Option<ControllerFn>> {
        match self.tree.node(id).controller() {
            Controller::Unbound => Ok(None),
            Controller::Direct(controller) => Ok(Some(Rc::clone(controller))),
            Controller::Lazy(lazy) => lazy.resolve(&self.catalog).map(Some),
        }
    }

    /// Renders `error` on the console.
    ///
    /// Input errors get a fixed caption and their remediation hint. Anything
    /// else shows `caption`, the error chain and the optional debug variables.
    ///
    /// # Arguments
    ///
    /// * `caption` - Heading for generic errors; ignored for input errors.
    /// * `error` - The error to render, including its context chain.
    /// * `debug_vars` - Optional key/value rows printed under generic errors.
    pub fn error(&self, caption: &str, error: &anyhow::Error, debug_vars: Option<&[(String, String)]>) {
        let console = &self.console;

        if let Some(solution) = input_solution(error) {
            debug!("Input error: {}", error);
            console.caption("Input error");
            console.error(error);
            console.break_line();
            console.notice("You might be able to fix this, use the \"--help\" flag for usage info.");
            if let Some(solution) = solution {
                console.log(solution);
            }
            return;
        }

        debug!("{}: {:#}", caption, error);
        console.caption(caption);
        console.error(format!("{:#}", error));
        console.indent();
        console.debug(format!("{:?}", error));
        console.outdent();
        if let Some(vars) = debug_vars {
            console.break_line();
            console.properties(vars);
        }
    }
}

fn quote_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn default_app_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "modhost".to_string())
}

/// Directory holding the running executable.
pub fn install_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ui::CapturedOutput;
    use crate::core::command::OptionSpec;
    use tempfile::{tempdir, TempDir};

    fn host(dir: &TempDir, catch_errors: bool) -> (AppHost, CapturedOutput) {
        let (console, output) = Console::captured();
        let host = AppHost::new(
            vec![dir.path().to_path_buf()],
            ".testrc",
            HostOptions {
                app_name: Some("app".into()),
                app_version: Some("1.0.0".into()),
                catch_errors,
                silent: true,
                console: Some(console),
                process_path: Some(dir.path().to_path_buf()),
            },
            EntryCatalog::new(),
        )
        .unwrap();
        (host, output)
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_boot_enables_hidden_core_module() {
        let dir = tempdir().unwrap();
        let (host, _) = host(&dir, true);
        let modules = host.registry().modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), core_module::NAME);
        assert!(modules[0].is_built_in());
        assert!(modules[0].is_hidden());
        assert!(host.registry().persisted_paths().is_empty());
    }

    #[test]
    fn test_no_locations_is_fatal() {
        let result = AppHost::new(Vec::new(), ".testrc", HostOptions::default(), EntryCatalog::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_command_renders_input_error() {
        let dir = tempdir().unwrap();
        let (mut host, output) = host(&dir, true);
        let status = host.run(&args(&["nope"])).unwrap();
        assert_eq!(status, RunStatus::Failed);
        let text = output.contents();
        assert!(text.contains("Input error"));
        assert!(text.contains("Could not find a match for input \"nope\""));
        assert!(text.contains("use the \"--help\" flag for usage info"));
    }

    #[test]
    fn test_errors_propagate_when_not_caught() {
        let dir = tempdir().unwrap();
        let (mut host, _) = host(&dir, false);
        assert!(host.run(&args(&["nope"])).is_err());
    }

    #[test]
    fn test_pre_controller_halt_skips_controller() {
        let dir = tempdir().unwrap();
        let (mut host, output) = host(&dir, true);
        let root = host.tree().root();
        host.tree_mut()
            .command(root)
            .add_command("guarded")
            .add_pre_controller(|_, _, console| {
                console.log("halted");
                Ok(Flow::Halt)
            })
            .set_controller(|_, _, console| {
                console.log("ran");
                Ok(())
            });
        assert_eq!(host.run(&args(&["guarded"])).unwrap(), RunStatus::Completed);
        assert!(output.contains("halted"));
        assert!(!output.contains("ran"));
    }

    #[test]
    fn test_command_without_controller_is_input_error() {
        let dir = tempdir().unwrap();
        let (mut host, output) = host(&dir, true);
        let root = host.tree().root();
        host.tree_mut().command(root).add_command("group").add_command("leaf");
        assert_eq!(host.run(&args(&["group"])).unwrap(), RunStatus::Failed);
        assert!(output.contains("cannot be run on its own"));
    }

    #[test]
    fn test_generic_error_renders_debug_variables() {
        let dir = tempdir().unwrap();
        let (mut host, output) = host(&dir, true);
        let root = host.tree().root();
        host.tree_mut()
            .command(root)
            .add_command("explode")
            .set_controller(|_, _, _| Err(anyhow::anyhow!("boom")));
        assert_eq!(host.run(&args(&["explode"])).unwrap(), RunStatus::Failed);
        let text = output.contents();
        assert!(text.contains("Failure"));
        assert!(text.contains("boom"));
        assert!(text.contains("args"));
        assert!(text.contains("explode"));
        assert!(text.contains("mods"));
        assert!(text.contains(&format!("core ({})", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn test_option_clashing_with_help_short_does_not_break_run() {
        let dir = tempdir().unwrap();
        let (mut host, output) = host(&dir, true);
        let root = host.tree().root();
        host.tree_mut()
            .command(root)
            .add_command("secret")
            .add_parameter("target", None, false)
            .add_option(OptionSpec::flag("hidden").short('h'))
            .add_option(OptionSpec::value("target"))
            .set_controller(|_, request, console| {
                console.log(format!("target is {}", request.parameter("target").unwrap_or("-")));
                Ok(())
            });

        assert_eq!(host.run(&args(&["secret", "prod"])).unwrap(), RunStatus::Completed);
        assert!(output.contains("target is prod"));

        output.reset();
        assert_eq!(host.run(&args(&["secret", "-h"])).unwrap(), RunStatus::Completed);
        assert!(output.contains("help for the secret command"));
    }

    #[test]
    fn test_quote_args() {
        assert_eq!(quote_args(&args(&["run", "test param space"])), "run \"test param space\"");
    }
}
