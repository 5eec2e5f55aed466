//! # Modhost Modules
//!
//! File: cli/src/core/module.rs
//!
//! ## Overview
//!
//! A module is a directory with a `module.json` manifest:
//!
//! ```json
//! { "name": "mod-a", "version": "1.0.0", "description": "Adds foo.", "main": "mod-a" }
//! ```
//!
//! `main` names an entry point in the host's `EntryCatalog` (it defaults to
//! the module name). Loading a module calls that entry with a `ModuleApi`,
//! through which the module registers commands, config keys and context
//! informers. Nothing else of the host is reachable from a module.
//!
//! ## Architecture
//!
//! - `ModuleHandle` is the record the registry keeps per enabled module:
//!   manifest, location, visibility and the informers it registered.
//! - `ModuleApi` is a short-lived view handed to the entry point. It borrows
//!   the handle plus the host's command tree and config store for the
//!   duration of the load.
//! - `EntryCatalog` maps entry names to module entry points and controller
//!   names to controllers. It is how manifests and lazy controller
//!   descriptors on disk resolve to compiled code.
//!
use crate::common::fs::io;
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::command::{CommandMut, CommandTree, ControllerFn, NodeId};
use crate::core::config::{ConfigStore, Serializer};
use crate::core::dispatch::Request;
use crate::core::error::{HostError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

/// File name of a module manifest inside the module directory.
pub const MANIFEST_FILE_NAME: &str = "module.json";

/// A module entry point.
pub type ModuleEntry = Rc<dyn Fn(&mut ModuleApi<'_>, &[Value]) -> Result<()>>;

/// Contributes lines to the `who` command output.
pub type ContextInformer = Rc<dyn Fn(&AppHost, &Request, &Console) -> Result<()>>;

/// Contents of `module.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
}

/// Descriptive snapshot of an enabled module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub path: PathBuf,
}

/// Name and version of the application hosting the modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: Option<String>,
}

/// Registry of compiled entry points and controllers, keyed by name.
#[derive(Clone, Default)]
pub struct EntryCatalog {
    modules: HashMap<String, ModuleEntry>,
    controllers: HashMap<String, ControllerFn>,
}

impl EntryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_module<F>(&mut self, name: &str, entry: F) -> &mut Self
    where
        F: Fn(&mut ModuleApi<'_>, &[Value]) -> Result<()> + 'static,
    {
        self.modules.insert(name.to_string(), Rc::new(entry));
        self
    }

    pub fn register_controller<F>(&mut self, name: &str, controller: F) -> &mut Self
    where
        F: Fn(&mut AppHost, &Request, &Console) -> Result<()> + 'static,
    {
        self.controllers.insert(name.to_string(), Rc::new(controller));
        self
    }

    pub fn module_entry(&self, name: &str) -> Option<ModuleEntry> {
        self.modules.get(name).cloned()
    }

    pub fn controller(&self, name: &str) -> Option<ControllerFn> {
        self.controllers.get(name).cloned()
    }
}

/// Host-side borrows a module load needs.
pub struct LoadEnv<'a> {
    pub tree: &'a mut CommandTree,
    pub config: &'a mut ConfigStore,
    pub catalog: &'a EntryCatalog,
    pub app: &'a AppInfo,
    pub console: &'a Console,
}

/// Per-module record kept by the registry.
pub struct ModuleHandle {
    manifest: ModuleManifest,
    path: PathBuf,
    built_in: bool,
    hide_from_list: bool,
    context_informers: Vec<ContextInformer>,
}

impl ModuleHandle {
    /// Reads the manifest in `path`. Does not run any module code.
    ///
    /// # Arguments
    ///
    /// * `path` - The module directory.
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - A handle that is not yet loaded, built-in or hidden.
    ///
    /// # Errors
    ///
    /// Returns `HostError::ModuleLoad` if `module.json` is missing, unreadable or
    /// lacks a `name`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let manifest_path = path.join(MANIFEST_FILE_NAME);
        let manifest: ModuleManifest =
            io::read_json(&manifest_path).map_err(|e| HostError::ModuleLoad {
                path: path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;
        Ok(Self::from_manifest(manifest, path.to_path_buf()))
    }

    /// A handle for a module compiled into the binary.
    pub fn from_manifest(manifest: ModuleManifest, path: PathBuf) -> Self {
        ModuleHandle {
            manifest,
            path,
            built_in: false,
            hide_from_list: false,
            context_informers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entry_name(&self) -> &str {
        self.manifest.main.as_deref().unwrap_or(&self.manifest.name)
    }

    pub fn get_info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.manifest.name.clone(),
            version: self.manifest.version.clone(),
            description: self.manifest.description.clone(),
            path: self.path.clone(),
        }
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    pub(crate) fn set_built_in(&mut self, built_in: bool) {
        self.built_in = built_in;
    }

    pub fn is_hidden(&self) -> bool {
        self.hide_from_list
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hide_from_list = hidden;
    }

    /// A copy of the informers; mutating it does not affect the module.
    pub fn get_context_informers(&self) -> Vec<ContextInformer> {
        self.context_informers.clone()
    }

    /// Resolves the entry point and runs it.
    pub(crate) fn load(&mut self, env: LoadEnv<'_>, extra: &[Value]) -> Result<()> {
        let entry = env
            .catalog
            .module_entry(self.entry_name())
            .ok_or_else(|| HostError::NotCallable {
                name: self.entry_name().to_string(),
            })?;

        info!("Loading module '{}' from {:?}", self.name(), self.path);
        let name = self.name().to_string();
        let mut api = ModuleApi {
            handle: self,
            tree: env.tree,
            config: env.config,
            app: env.app,
        };
        entry(&mut api, extra).with_context(|| format!("Module '{}' failed to load", name))
    }
}

/// What a module sees of the host while it loads.
pub struct ModuleApi<'a> {
    handle: &'a mut ModuleHandle,
    tree: &'a mut CommandTree,
    config: &'a mut ConfigStore,
    app: &'a AppInfo,
}

impl<'a> ModuleApi<'a> {
    pub fn get_app_info(&self) -> AppInfo {
        self.app.clone()
    }

    pub fn get_info(&self) -> ModuleInfo {
        self.handle.get_info()
    }

    /// Adds a top-level command owned by this module.
    ///
    /// Lazy controller paths on the returned builder (and its children)
    /// resolve against the module's directory.
    ///
    /// # Arguments
    ///
    /// * `name` - The command word below the application's root.
    ///
    /// # Returns
    ///
    /// * `CommandMut<'_>` - A builder over the new node, already owned by this module.
    pub fn register_command(&mut self, name: &str) -> CommandMut<'_> {
        let root = self.tree.root();
        let id = self.tree.add_command(root, name);
        debug!("Module '{}' registered command '{}'", self.handle.name(), name);
        CommandMut::with_base_dir(self.tree, id, self.handle.path.clone())
            .set_module_owner(&self.handle.manifest.name)
    }

    /// A builder over a command registered earlier.
    pub fn command(&mut self, id: NodeId) -> CommandMut<'_> {
        CommandMut::with_base_dir(self.tree, id, self.handle.path.clone())
    }

    /// The application's root command. Only built-in modules should need this.
    pub fn root_command(&mut self) -> CommandMut<'_> {
        let root = self.tree.root();
        CommandMut::with_base_dir(self.tree, root, self.handle.path.clone())
    }

    /// Registers a config key and returns its materialized value.
    ///
    /// Call this from the entry point only. See `ConfigStore::register_config`
    /// for how `default` and `serializer` apply.
    pub fn register_configuration(
        &mut self,
        key: &str,
        default: Value,
        serializer: Option<Serializer>,
    ) -> Value {
        self.config.register_config(key, default, serializer)
    }

    pub fn register_context_informer<F>(&mut self, informer: F) -> ContextInformer
    where
        F: Fn(&AppHost, &Request, &Console) -> Result<()> + 'static,
    {
        let informer: ContextInformer = Rc::new(informer);
        self.handle.context_informers.push(Rc::clone(&informer));
        informer
    }

    pub fn get_context_informers(&self) -> Vec<ContextInformer> {
        self.handle.get_context_informers()
    }
}
