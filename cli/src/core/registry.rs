//! # Modhost Module Registry
//!
//! File: cli/src/core/registry.rs
//!
//! ## Overview
//!
//! Keeps the ordered list of enabled modules and enforces name uniqueness.
//! Built-in modules (the core module, anything the embedding application
//! enables with `enable_built_in_module`) live in the same list but are
//! flagged so they are never written back to the `modules` config key.
//!
//! ## Architecture
//!
//! The list sits behind `Rc<RefCell<..>>` because the `modules` config
//! serializer needs to read it at save time, long after registration. The
//! serializer holds a `Weak` reference so it never keeps the registry alive.
//!
use crate::core::config::Serializer;
use crate::core::error::Result;
use crate::core::module::{ContextInformer, LoadEnv, ModuleHandle, ModuleInfo};
use serde_json::Value;
use std::cell::{Ref, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{info, warn};

/// Config key holding the paths of non built-in modules.
pub const MODULES_CONFIG_KEY: &str = "modules";

#[derive(Default)]
pub struct ModuleRegistry {
    modules: Rc<RefCell<Vec<ModuleHandle>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the module at `path` and records it for persistence.
    ///
    /// Returns `Ok(None)` without loading anything when a module with the
    /// same name is already enabled.
    ///
    /// # Arguments
    ///
    /// * `path` - The module directory, containing `module.json`.
    /// * `extra` - Extra values handed to the module's entry point.
    /// * `env` - Borrows of the host parts the module may register into.
    ///
    /// # Returns
    ///
    /// * `Result<Option<ModuleInfo>>` - `Some(info)` for the enabled module, `None` for
    ///   a duplicate name (a notice is printed on the console instead).
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - The manifest is missing or invalid (`HostError::ModuleLoad`).
    /// - The manifest's entry point is not in the catalog (`HostError::NotCallable`).
    /// - The entry point itself fails.
    ///
    /// A failed module is not added to the registry.
    pub fn enable_module(
        &mut self,
        path: &Path,
        extra: &[Value],
        env: LoadEnv<'_>,
    ) -> Result<Option<ModuleInfo>> {
        let candidate = ModuleHandle::from_path(path)?;
        self.enable(candidate, false, extra, env)
    }

    /// Like `enable_module`, but the module is never persisted.
    pub fn enable_built_in_module(
        &mut self,
        path: &Path,
        extra: &[Value],
        env: LoadEnv<'_>,
    ) -> Result<Option<ModuleInfo>> {
        let candidate = ModuleHandle::from_path(path)?;
        self.enable(candidate, true, extra, env)
    }

    /// Enables an already constructed handle, typically a compiled-in module.
    pub fn enable_handle(
        &mut self,
        candidate: ModuleHandle,
        built_in: bool,
        extra: &[Value],
        env: LoadEnv<'_>,
    ) -> Result<Option<ModuleInfo>> {
        self.enable(candidate, built_in, extra, env)
    }

    fn enable(
        &mut self,
        mut candidate: ModuleHandle,
        built_in: bool,
        extra: &[Value],
        env: LoadEnv<'_>,
    ) -> Result<Option<ModuleInfo>> {
        let conflicts: Vec<String> = self
            .modules
            .borrow()
            .iter()
            .filter(|existing| existing.name() == candidate.name())
            .map(|existing| {
                if existing.is_built_in() {
                    format!("{} (built-in)", existing.path().display())
                } else {
                    existing.path().display().to_string()
                }
            })
            .collect();

        if !conflicts.is_empty() {
            warn!(
                "Skipping module '{}' at {:?}, name already taken",
                candidate.name(),
                candidate.path()
            );
            let console = env.console;
            console.notice(format!(
                "Not loading module \"{}\" from {}, a module with the same name is already loaded.",
                candidate.name(),
                candidate.path().display()
            ));
            console.indent();
            console.list(&conflicts, "-");
            console.outdent();
            console.debug(format!(
                "You can check your modules with \"{} module --list --verbose\"",
                env.app.name
            ));
            return Ok(None);
        }

        candidate.set_built_in(built_in);
        candidate.load(env, extra)?;

        let info = candidate.get_info();
        info!("Enabled module '{}' (built-in: {})", info.name, built_in);
        self.modules.borrow_mut().push(candidate);
        Ok(Some(info))
    }

    /// Removes every module located at `path`. Commands it registered stay
    /// in the tree until the process ends.
    pub fn disable_module(&mut self, path: &Path) -> Vec<ModuleInfo> {
        let mut modules = self.modules.borrow_mut();
        let (removed, kept): (Vec<ModuleHandle>, Vec<ModuleHandle>) =
            modules.drain(..).partition(|m| same_path(m.path(), path));
        *modules = kept;
        removed.iter().map(ModuleHandle::get_info).collect()
    }

    pub fn modules(&self) -> Ref<'_, Vec<ModuleHandle>> {
        self.modules.borrow()
    }

    pub fn infos(&self) -> Vec<ModuleInfo> {
        self.modules.borrow().iter().map(ModuleHandle::get_info).collect()
    }

    pub fn set_hidden(&mut self, name: &str, hidden: bool) {
        for module in self.modules.borrow_mut().iter_mut().filter(|m| m.name() == name) {
            module.set_hidden(hidden);
        }
    }

    /// Paths of the modules that belong in the `modules` config key, in
    /// enable order.
    pub fn persisted_paths(&self) -> Vec<PathBuf> {
        persisted_paths(&self.modules.borrow())
    }

    /// Every informer of every module, in enable order.
    pub fn context_informers(&self) -> Vec<ContextInformer> {
        self.modules
            .borrow()
            .iter()
            .flat_map(|m| m.get_context_informers())
            .collect()
    }

    /// Serializer for the `modules` config key.
    pub fn serializer(&self) -> Serializer {
        let modules = Rc::downgrade(&self.modules);
        Box::new(move |_: &Value| {
            let modules = modules.upgrade()?;
            let paths = persisted_paths(&modules.borrow());
            Some(Value::Array(
                paths
                    .iter()
                    .map(|p| Value::String(p.display().to_string()))
                    .collect(),
            ))
        })
    }
}

fn persisted_paths(modules: &[ModuleHandle]) -> Vec<PathBuf> {
    modules
        .iter()
        .filter(|m| !m.is_built_in())
        .map(|m| m.path().to_path_buf())
        .collect()
}

/// Path equality that also accepts two spellings of the same directory.
pub fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
