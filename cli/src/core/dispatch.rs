//! # Modhost Command Dispatch
//!
//! File: cli/src/core/dispatch.rs
//!
//! ## Overview
//!
//! Turns a raw argument list into a `Request` against the `CommandTree`. The
//! tree is projected onto a `clap::Command` on every run (modules may have
//! changed it since the last one), clap does the tokenizing and matching,
//! and the resulting `ArgMatches` are folded back into a flat `Request`
//! that names the deepest matched node.
//!
//! ## Architecture
//!
//! - clap's own help, version and help-subcommand machinery is switched off;
//!   `--help` is an ordinary global flag owned by the core module.
//! - Positionals are never marked required in clap and required options are
//!   not either. Requirements are checked by `check_required` after the
//!   pre-controllers ran, so `--help` keeps working on a command whose
//!   required parameters are missing.
//! - Every clap failure becomes a `HostError::Input` whose message names the
//!   offending token.
//! - Arguments that would clash inside clap (a repeated id or short, counting
//!   global options inherited from ancestors) are left out of the projection
//!   with a warning, like sibling commands sharing a name. Their values are
//!   never read back.
//!
use crate::core::command::{CommandTree, NodeId, OptionKind, OptionSpec};
use crate::core::error::{HostError, Result};
use clap::error::{ContextKind, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Name of the flag the core module registers for help output.
pub const HELP_OPTION: &str = "help";

/// The value an option received on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag(bool),
    Value(Option<String>),
    Multi(Vec<String>),
}

/// A matched invocation: the target node plus its parsed input.
#[derive(Debug, Clone)]
pub struct Request {
    pub command: NodeId,
    parameters: BTreeMap<String, String>,
    options: BTreeMap<String, OptionValue>,
}

impl Request {
    pub fn new(command: NodeId) -> Self {
        Request {
            command,
            parameters: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_option(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name.to_string(), value);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// True only for a flag that was passed.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.options.get(name), Some(OptionValue::Flag(true)))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::Value(value)) => value.as_deref(),
            Some(OptionValue::Multi(values)) => values.last().map(String::as_str),
            _ => None,
        }
    }

    /// All values of a repeatable option; empty when it was not passed.
    pub fn values(&self, name: &str) -> &[String] {
        match self.options.get(name) {
            Some(OptionValue::Multi(values)) => values,
            Some(OptionValue::Value(Some(value))) => std::slice::from_ref(value),
            _ => &[],
        }
    }

    pub fn wants_help(&self) -> bool {
        self.flag(HELP_OPTION)
    }
}

/// Parses `args` (without the binary name) against `tree`.
///
/// # Arguments
///
/// * `tree` - The command tree, projected onto clap for this call.
/// * `args` - The command line after the binary name.
///
/// # Returns
///
/// * `Result<Request>` - The deepest matched command with its parameters and options.
///
/// # Errors
///
/// Returns `HostError::Input` when a token matches no command, option or
/// parameter, or when an option is missing its value.
pub fn interpret(tree: &CommandTree, args: &[String]) -> Result<Request> {
    debug!("Interpreting arguments: {:?}", args);
    let root = tree.root();
    let mut skipped = Skipped::default();
    let matches = to_clap(tree, root, &TakenArgs::default(), &mut skipped)
        .no_binary_name(true)
        .try_get_matches_from(args)
        .map_err(to_input_error)?;

    let mut path: Vec<(NodeId, &ArgMatches)> = vec![(root, &matches)];
    let mut current = (root, &matches);
    while let Some((word, sub_matches)) = current.1.subcommand() {
        let child = tree.find_child(current.0, word).ok_or_else(|| {
            HostError::input(
                format!("Could not find a match for input \"{}\"", word),
                "Use the \"--help\" flag to list the commands available here.",
            )
        })?;
        current = (child, sub_matches);
        path.push(current);
    }

    let (leaf, leaf_matches) = current;
    let mut request = Request::new(leaf);

    for (id, node_matches) in &path {
        for (position, option) in tree.node(*id).options().iter().enumerate() {
            if skipped.options.contains(&(*id, position)) {
                continue;
            }
            // Global options are propagated down; the leaf holds their final value.
            let source = if option.global { leaf_matches } else { *node_matches };
            request
                .options
                .insert(option.name.clone(), read_option(source, option));
        }
    }

    for (position, parameter) in tree.node(leaf).parameters().iter().enumerate() {
        if skipped.parameters.contains(&(leaf, position)) {
            continue;
        }
        if let Some(value) = leaf_matches.get_one::<String>(&parameter.name) {
            request.parameters.insert(parameter.name.clone(), value.clone());
        }
    }

    debug!("Matched command '{}'", tree.long_name(leaf));
    Ok(request)
}

/// Fails with an input error when a required parameter or option of the
/// matched command is absent.
pub fn check_required(tree: &CommandTree, request: &Request) -> Result<()> {
    let node = tree.node(request.command);
    let solution = "Use the \"--help\" flag for usage info.";

    if let Some(missing) = node
        .parameters()
        .iter()
        .find(|p| p.required && request.parameter(&p.name).is_none())
    {
        return Err(HostError::input(
            format!("Missing required parameter \"{}\"", missing.name),
            solution,
        )
        .into());
    }

    if let Some(missing) = node
        .options()
        .iter()
        .find(|o| o.required && !is_present(request.option(&o.name)))
    {
        return Err(HostError::input(
            format!("Missing required option \"--{}\"", missing.name),
            solution,
        )
        .into());
    }

    Ok(())
}

fn is_present(value: Option<&OptionValue>) -> bool {
    match value {
        Some(OptionValue::Flag(set)) => *set,
        Some(OptionValue::Value(value)) => value.is_some(),
        Some(OptionValue::Multi(values)) => !values.is_empty(),
        None => false,
    }
}

fn read_option(matches: &ArgMatches, option: &OptionSpec) -> OptionValue {
    let id = option.name.as_str();
    match option.kind {
        OptionKind::Flag => OptionValue::Flag(matches.get_flag(id)),
        OptionKind::Value => OptionValue::Value(matches.get_one::<String>(id).cloned()),
        OptionKind::Multi => OptionValue::Multi(
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        ),
    }
}

/// Argument ids and shorts already in use for one clap command.
#[derive(Debug, Default, Clone)]
struct TakenArgs {
    ids: HashSet<String>,
    shorts: HashSet<char>,
}

/// Arguments left out of the projection, by node and position.
#[derive(Debug, Default)]
struct Skipped {
    parameters: HashSet<(NodeId, usize)>,
    options: HashSet<(NodeId, usize)>,
}

/// Builds the clap command for `id`. `inherited` holds the global options
/// propagated from its ancestors.
fn to_clap(tree: &CommandTree, id: NodeId, inherited: &TakenArgs, skipped: &mut Skipped) -> Command {
    let node = tree.node(id);
    let mut command = Command::new(node.name().to_string())
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .disable_version_flag(true);

    if let Some(description) = node.description() {
        command = command.about(description.to_string());
    }
    for alias in node.aliases() {
        command = command.alias(alias.clone());
    }

    let mut taken = inherited.clone();
    let mut globals = inherited.clone();

    let mut index = 0;
    for (position, parameter) in node.parameters().iter().enumerate() {
        if !taken.ids.insert(parameter.name.clone()) {
            warn!(
                "Ignoring parameter '{}' of '{}', the name is already in use",
                parameter.name,
                node.name()
            );
            skipped.parameters.insert((id, position));
            continue;
        }
        index += 1;
        command = command.arg(
            Arg::new(parameter.name.clone())
                .index(index)
                .action(ArgAction::Set),
        );
    }

    for (position, option) in node.options().iter().enumerate() {
        let short_taken = option.short.is_some_and(|short| taken.shorts.contains(&short));
        if short_taken || taken.ids.contains(&option.name) {
            warn!(
                "Ignoring option '--{}' of '{}', its name or short flag is already in use",
                option.name,
                node.name()
            );
            skipped.options.insert((id, position));
            continue;
        }
        taken.ids.insert(option.name.clone());
        if let Some(short) = option.short {
            taken.shorts.insert(short);
        }
        if option.global {
            globals.ids.insert(option.name.clone());
            if let Some(short) = option.short {
                globals.shorts.insert(short);
            }
        }

        let action = match option.kind {
            OptionKind::Flag => ArgAction::SetTrue,
            OptionKind::Value => ArgAction::Set,
            OptionKind::Multi => ArgAction::Append,
        };
        let mut arg = Arg::new(option.name.clone())
            .long(option.name.clone())
            .action(action)
            .global(option.global);
        if let Some(short) = option.short {
            arg = arg.short(short);
        }
        command = command.arg(arg);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for child in node.children() {
        let child_node = tree.node(*child);
        let words = std::iter::once(child_node.name()).chain(child_node.aliases().iter().map(String::as_str));
        if words.clone().any(|word| seen.contains(word)) {
            warn!(
                "Ignoring command '{}', its name or alias is already taken below '{}'",
                child_node.name(),
                node.name()
            );
            continue;
        }
        seen.extend(words);
        command = command.subcommand(to_clap(tree, *child, &globals, skipped));
    }

    command
}

fn to_input_error(err: clap::Error) -> anyhow::Error {
    let token = err
        .get(ContextKind::InvalidSubcommand)
        .or_else(|| err.get(ContextKind::InvalidArg))
        .map(|value| value.to_string());

    let message = match token {
        Some(token) => format!("Could not find a match for input \"{}\"", token),
        None => match err.kind() {
            ErrorKind::InvalidValue | ErrorKind::NoEquals => "An option is missing its value".to_string(),
            kind => format!(
                "Could not parse input: {}",
                kind.as_str().unwrap_or("unrecognized arguments")
            ),
        },
    };

    let solution = match err.get(ContextKind::SuggestedSubcommand) {
        Some(suggestion) => format!("Did you mean \"{}\"? Use the \"--help\" flag for usage info.", suggestion),
        None => "Use the \"--help\" flag to list the commands and options available here.".to_string(),
    };

    debug!("Argument parsing failed: {:?}", err.kind());
    HostError::input(message, solution).into()
}
