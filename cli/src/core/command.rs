//! # Modhost Command Tree
//!
//! File: cli/src/core/command.rs
//!
//! ## Overview
//!
//! Every command the host can run lives in one `CommandTree`. The tree starts
//! with a root node named after the application; modules hang their commands
//! below it and may nest further children below those.
//!
//! ## Architecture
//!
//! - The tree is an arena (`Vec<CommandNode>`) addressed by `NodeId`. Children
//!   are owned top-down through their parent's `children` list; `parent` is a
//!   plain index back-reference used for upward walks (long names, module
//!   ownership, pre-controller chains).
//! - `CommandMut` is a short-lived builder over one node. Its mutators return
//!   the builder so registrations chain the same way a module author reads
//!   them. It also carries the registering module's base directory, which is
//!   what relative lazy controller paths resolve against.
//! - A node's controller is `Unbound`, `Direct` (a function supplied up front)
//!   or `Lazy` (a descriptor file resolved through the `EntryCatalog` on first
//!   invocation and cached afterwards). Nodes never return to `Unbound`.
//!
//! ## Examples
//!
//! ```rust
//! use modhost::core::command::{CommandTree, OptionSpec};
//!
//! let mut tree = CommandTree::new("root");
//! let root = tree.root();
//! let grandchild = tree
//!     .command(root)
//!     .add_command("child")
//!     .add_command("grandchild")
//!     .add_parameter("p1", None, false)
//!     .add_parameter("p2", Some("Second"), true)
//!     .add_option(OptionSpec::flag("force").short('f'))
//!     .id();
//!
//! assert_eq!(tree.long_name(grandchild), "root child grandchild <p1> <p2>");
//! ```
//!
use crate::common::fs::io;
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::dispatch::Request;
use crate::core::error::{HostError, Result};
use crate::core::module::EntryCatalog;
use serde::Deserialize;
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// A command action. Receives the host mutably so built-in commands can
/// enable modules or save configuration.
pub type ControllerFn = Rc<dyn Fn(&mut AppHost, &Request, &Console) -> Result<()>>;

/// Runs before the matched command's controller; `Flow::Halt` stops execution.
pub type PreControllerFn = Rc<dyn Fn(&mut AppHost, &Request, &Console) -> Result<Flow>>;

/// Outcome of a pre-controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// Index of a node inside its `CommandTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub caption: String,
    pub content: String,
}

/// A positional parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

/// How many values an option takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A boolean switch, `--list`.
    Flag,
    /// A single value, `--name value`.
    Value,
    /// A repeatable value, `--add a --add b`.
    Multi,
}

/// A named option. Built with `OptionSpec::flag`, `::value` or `::multi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    pub name: String,
    pub short: Option<char>,
    pub description: Option<String>,
    pub required: bool,
    pub kind: OptionKind,
    /// Accepted on every descendant command as well.
    pub global: bool,
}

impl OptionSpec {
    fn new(name: &str, kind: OptionKind) -> Self {
        OptionSpec {
            name: name.to_string(),
            short: None,
            description: None,
            required: false,
            kind,
            global: false,
        }
    }

    pub fn flag(name: &str) -> Self {
        Self::new(name, OptionKind::Flag)
    }

    pub fn value(name: &str) -> Self {
        Self::new(name, OptionKind::Value)
    }

    pub fn multi(name: &str) -> Self {
        Self::new(name, OptionKind::Multi)
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn global(mut self) -> Self {
        self.global = true;
        self
    }
}

#[derive(Deserialize)]
struct ControllerDescriptor {
    controller: String,
}

/// A controller bound to a descriptor file, resolved on first invocation.
pub struct LazyController {
    path: PathBuf,
    resolved: OnceCell<ControllerFn>,
}

impl LazyController {
    pub fn new(path: PathBuf) -> Self {
        LazyController {
            path,
            resolved: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Reads the descriptor and binds its controller name through `catalog`.
    ///
    /// Runs at most once successfully; later calls return the cached
    /// controller.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Where the descriptor's controller name is looked up.
    ///
    /// # Returns
    ///
    /// * `Result<ControllerFn>` - The bound controller.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - The descriptor is missing or malformed (`HostError::ControllerLoad`).
    /// - The named controller is not in the catalog (`HostError::NotCallable`).
    ///
    /// A failed resolve is not cached, so a later call tries again.
    pub fn resolve(&self, catalog: &EntryCatalog) -> Result<ControllerFn> {
        if let Some(controller) = self.resolved.get() {
            return Ok(Rc::clone(controller));
        }

        debug!("Resolving lazy controller {:?}", self.path);
        let descriptor: ControllerDescriptor =
            io::read_json(&self.path).map_err(|e| HostError::ControllerLoad {
                path: self.path.clone(),
                reason: format!("{:#}", e),
            })?;

        let controller = catalog
            .controller(&descriptor.controller)
            .ok_or(HostError::NotCallable {
                name: descriptor.controller,
            })?;

        let _ = self.resolved.set(Rc::clone(&controller));
        Ok(controller)
    }
}

/// The action bound to a node.
pub enum Controller {
    Unbound,
    Direct(ControllerFn),
    Lazy(LazyController),
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Controller::Unbound => write!(f, "Unbound"),
            Controller::Direct(_) => write!(f, "Direct"),
            Controller::Lazy(lazy) => write!(f, "Lazy({:?})", lazy.path),
        }
    }
}

/// One command in the tree.
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    long_description: Option<String>,
    examples: Vec<Example>,
    parameters: Vec<ParameterSpec>,
    options: Vec<OptionSpec>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    controller: Controller,
    pre_controllers: Vec<PreControllerFn>,
    is_help_command: bool,
    module_owner: Option<String>,
}

impl CommandNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        CommandNode {
            name: name.to_string(),
            aliases: Vec::new(),
            description: None,
            long_description: None,
            examples: Vec::new(),
            parameters: Vec::new(),
            options: Vec::new(),
            parent,
            children: Vec::new(),
            controller: Controller::Unbound,
            pre_controllers: Vec::new(),
            is_help_command: false,
            module_owner: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn long_description(&self) -> Option<&str> {
        self.long_description.as_deref()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn options(&self) -> &[OptionSpec] {
        &self.options
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn pre_controllers(&self) -> &[PreControllerFn] {
        &self.pre_controllers
    }

    pub fn is_help_command(&self) -> bool {
        self.is_help_command
    }

    /// Name of the module that registered this exact node, if any.
    pub fn module_owner(&self) -> Option<&str> {
        self.module_owner.as_deref()
    }

    /// True when `word` is this node's name or one of its aliases.
    pub fn answers_to(&self, word: &str) -> bool {
        self.name == word || self.aliases.iter().any(|alias| alias == word)
    }
}

/// Arena of command nodes rooted at the application command.
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    pub fn new(root_name: &str) -> Self {
        CommandTree {
            nodes: vec![CommandNode::new(root_name, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    /// A builder over an existing node, without a module base directory.
    pub fn command(&mut self, id: NodeId) -> CommandMut<'_> {
        CommandMut {
            tree: self,
            id,
            base_dir: None,
        }
    }

    /// Appends a new child named `name` below `parent`.
    pub fn add_command(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(name, Some(parent)));
        self.node_mut(parent).children.push(id);
        debug!("Added command '{}' below '{}'", name, self.node(parent).name);
        id
    }

    /// First child of `parent` answering to `word` (name or alias).
    pub fn find_child(&self, parent: NodeId, word: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).answers_to(word))
    }

    /// Node ids from the root down to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.node(parent).parent;
        }
        path.reverse();
        path
    }

    /// Ancestor names, own name and `<parameter>` placeholders joined by spaces.
    pub fn long_name(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut parts = Vec::new();
        if let Some(parent) = node.parent {
            parts.push(self.long_name(parent));
        }
        parts.push(node.name.clone());
        parts.extend(node.parameters.iter().map(|p| format!("<{}>", p.name)));
        parts.join(" ")
    }

    /// The module that owns `id`, inherited from the nearest ancestor that
    /// has one. `None` for host-internal nodes such as the root.
    pub fn module_registration(&self, id: NodeId) -> Option<&str> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            if let Some(owner) = node.module_owner.as_deref() {
                return Some(owner);
            }
            current = node.parent;
        }
        None
    }

    /// Options defined on the ancestors of `id` with `global` set.
    pub fn inherited_options(&self, id: NodeId) -> Vec<&OptionSpec> {
        let path = self.path_to(id);
        path[..path.len() - 1]
            .iter()
            .flat_map(|ancestor| self.node(*ancestor).options.iter())
            .filter(|option| option.global)
            .collect()
    }
}

/// Chainable builder over one node of a `CommandTree`.
pub struct CommandMut<'a> {
    tree: &'a mut CommandTree,
    id: NodeId,
    base_dir: Option<PathBuf>,
}

impl<'a> CommandMut<'a> {
    pub(crate) fn with_base_dir(tree: &'a mut CommandTree, id: NodeId, base_dir: PathBuf) -> Self {
        CommandMut {
            tree,
            id,
            base_dir: Some(base_dir),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&mut self) -> &mut CommandNode {
        self.tree.node_mut(self.id)
    }

    pub fn set_description(mut self, description: &str) -> Self {
        self.node().description = Some(description.to_string());
        self
    }

    pub fn set_long_description(mut self, description: &str) -> Self {
        self.node().long_description = Some(description.to_string());
        self
    }

    pub fn add_alias(mut self, alias: &str) -> Self {
        let node = self.node();
        if !node.aliases.iter().any(|a| a == alias) {
            node.aliases.push(alias.to_string());
        }
        self
    }

    /// Adds a usage example, rendered as a definition under its caption.
    pub fn add_example(mut self, caption: &str, content: &str) -> Self {
        self.node().examples.push(Example {
            caption: caption.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn add_parameter(mut self, name: &str, description: Option<&str>, required: bool) -> Self {
        self.node().parameters.push(ParameterSpec {
            name: name.to_string(),
            description: description.map(str::to_string),
            required,
        });
        self
    }

    pub fn add_option(mut self, option: OptionSpec) -> Self {
        self.node().options.push(option);
        self
    }

    pub fn add_pre_controller<F>(mut self, pre_controller: F) -> Self
    where
        F: Fn(&mut AppHost, &Request, &Console) -> Result<Flow> + 'static,
    {
        self.node().pre_controllers.push(Rc::new(pre_controller));
        self
    }

    /// Binds a function as this command's controller.
    pub fn set_controller<F>(mut self, controller: F) -> Self
    where
        F: Fn(&mut AppHost, &Request, &Console) -> Result<()> + 'static,
    {
        self.node().controller = Controller::Direct(Rc::new(controller));
        self
    }

    /// Binds a controller descriptor file, loaded on first invocation.
    ///
    /// Relative paths resolve against the registering module's directory
    /// (or the current directory for builders created outside a module).
    /// Nothing is read here; a missing file only fails when the command runs.
    pub fn set_lazy_controller(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            match &self.base_dir {
                Some(base) => base.join(path),
                None => path.to_path_buf(),
            }
        };
        debug!("Binding lazy controller {:?}", resolved);
        self.node().controller = Controller::Lazy(LazyController::new(resolved));
        self
    }

    /// When set, running this command without a controller renders its help.
    pub fn set_as_help_command(mut self, enabled: bool) -> Self {
        self.node().is_help_command = enabled;
        self
    }

    pub(crate) fn set_module_owner(mut self, owner: &str) -> Self {
        self.node().module_owner = Some(owner.to_string());
        self
    }

    /// Adds a child command and returns a builder for it. The child inherits
    /// this builder's base directory.
    pub fn add_command(self, name: &str) -> CommandMut<'a> {
        let child = self.tree.add_command(self.id, name);
        CommandMut {
            tree: self.tree,
            id: child,
            base_dir: self.base_dir,
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_name_includes_ancestors_and_parameters() {
        let mut tree = CommandTree::new("root");
        let root = tree.root();
        let id = tree
            .command(root)
            .add_command("child")
            .add_command("grandchild")
            .add_parameter("p1", None, false)
            .add_parameter("p2", None, true)
            .id();
        assert_eq!(tree.long_name(id), "root child grandchild <p1> <p2>");
        assert_eq!(tree.long_name(root), "root");
    }

    #[test]
    fn test_examples_and_long_description_chain() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let id = tree
            .command(root)
            .add_command("build")
            .set_long_description("Builds things.")
            .add_example("app build", "Build everything.")
            .add_example("app build --fast", "Build quickly.")
            .id();
        let node = tree.node(id);
        assert_eq!(node.long_description(), Some("Builds things."));
        assert_eq!(node.examples().len(), 2);
        assert_eq!(node.examples()[1].caption, "app build --fast");
    }

    #[test]
    fn test_module_registration_is_inherited_from_nearest_owner() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let owned = tree.command(root).add_command("owned").set_module_owner("mod-a").id();
        let nested = tree.command(owned).add_command("nested").id();
        let orphan = tree.command(root).add_command("orphan").id();

        assert_eq!(tree.module_registration(nested), Some("mod-a"));
        assert_eq!(tree.module_registration(owned), Some("mod-a"));
        assert_eq!(tree.module_registration(orphan), None);
        assert_eq!(tree.module_registration(root), None);
    }

    #[test]
    fn test_find_child_matches_aliases() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let who = tree.command(root).add_command("who").add_alias("whoami").add_alias("whoami").id();
        assert_eq!(tree.find_child(root, "whoami"), Some(who));
        assert_eq!(tree.find_child(root, "who"), Some(who));
        assert_eq!(tree.find_child(root, "nobody"), None);
        assert_eq!(tree.node(who).aliases().len(), 1);
    }

    #[test]
    fn test_lazy_controller_resolves_against_base_dir_without_reading() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        let id = tree.add_command(root, "lazy");
        let base = PathBuf::from("/modules/mod-a");
        CommandMut::with_base_dir(&mut tree, id, base)
            .set_lazy_controller("src/does-not-exist.json")
            .add_command("sub")
            .set_lazy_controller("/abs/controller.json");

        match tree.node(id).controller() {
            Controller::Lazy(lazy) => {
                assert_eq!(lazy.path(), Path::new("/modules/mod-a/src/does-not-exist.json"));
                assert!(!lazy.is_resolved());
            }
            other => panic!("expected a lazy controller, got {:?}", other),
        }

        let sub = tree.find_child(id, "sub").unwrap();
        match tree.node(sub).controller() {
            Controller::Lazy(lazy) => assert_eq!(lazy.path(), Path::new("/abs/controller.json")),
            other => panic!("expected a lazy controller, got {:?}", other),
        }
    }

    #[test]
    fn test_lazy_controller_missing_file_fails_on_resolve() {
        let lazy = LazyController::new(PathBuf::from("/definitely/not/here.json"));
        let err = lazy.resolve(&EntryCatalog::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<HostError>(),
            Some(HostError::ControllerLoad { .. })
        ));
    }

    #[test]
    fn test_inherited_options_only_include_global_ancestors() {
        let mut tree = CommandTree::new("app");
        let root = tree.root();
        tree.command(root)
            .add_option(OptionSpec::flag("help").short('h').global())
            .add_option(OptionSpec::flag("local"));
        let child = tree.add_command(root, "child");
        let inherited: Vec<&str> = tree
            .inherited_options(child)
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(inherited, vec!["help"]);
        assert!(tree.inherited_options(root).is_empty());
    }
}
