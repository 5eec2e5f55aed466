//! # Help Output
//!
//! File: cli/src/commands/core/help.rs
//!
//! Adds the global `--help` / `-h` flag to the root command and a root
//! pre-controller that, when the flag is set, renders help for the matched
//! command and halts execution. `render_help` is also what the host calls
//! for help commands without a controller of their own.
//!
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::command::{Flow, NodeId, OptionSpec};
use crate::core::dispatch::HELP_OPTION;
use crate::core::module::ModuleApi;

const NO_DESCRIPTION: &str = "<no description>";

pub fn register(api: &mut ModuleApi<'_>) {
    api.root_command()
        .set_description(env!("CARGO_PKG_DESCRIPTION"))
        .add_option(
            OptionSpec::flag(HELP_OPTION)
                .short('h')
                .description("Show usage information, works for any command.")
                .global(),
        )
        .add_pre_controller(|host, request, console| {
            if !request.wants_help() {
                return Ok(Flow::Continue);
            }
            render_help(host, request.command, console);
            Ok(Flow::Halt)
        });
}

fn with_required(description: Option<&str>, required: bool) -> String {
    let mut text = description.unwrap_or(NO_DESCRIPTION).to_string();
    if required {
        text.push_str(" [required]");
    }
    text
}

/// Writes the help page of command `id`.
pub fn render_help(host: &AppHost, id: NodeId, console: &Console) {
    let tree = host.tree();
    let node = tree.node(id);

    if node.parent().is_none() {
        console.caption(format!("{} --help", host.get_info().name));
    } else {
        console.caption(format!("help for the {} command", node.name()));
    }

    let mut props = vec![("Command".to_string(), tree.long_name(id))];
    if !node.aliases().is_empty() {
        props.push(("Aliases".to_string(), node.aliases().join(", ")));
    }
    if let Some(description) = node.description() {
        props.push(("Summary".to_string(), description.to_string()));
    }
    console.properties(&props);

    if let Some(long_description) = node.long_description() {
        console.break_line();
        console.debug(long_description);
    }

    if !node.children().is_empty() {
        console.caption("Child commands");
        let mut children: Vec<_> = node.children().iter().map(|child| tree.node(*child)).collect();
        children.sort_by(|a, b| a.name().cmp(b.name()));
        for child in children {
            console.definition(child.name(), child.description().unwrap_or(""));
        }
    }

    if !node.parameters().is_empty() {
        console.caption("Parameters");
        let rows: Vec<(String, String)> = node
            .parameters()
            .iter()
            .map(|p| (format!("<{}>", p.name), with_required(p.description.as_deref(), p.required)))
            .collect();
        console.properties(&rows);
    }

    let mut options: Vec<_> = node.options().iter().collect();
    options.extend(tree.inherited_options(id));
    if !options.is_empty() {
        console.caption("Options");
        options.sort_by(|a, b| a.name.cmp(&b.name));
        let rows: Vec<(String, String)> = options
            .iter()
            .map(|o| {
                let short = o.short.map(|s| format!("-{}", s)).unwrap_or_else(|| "--".to_string());
                (
                    format!("{}  --{}", short, o.name),
                    with_required(o.description.as_deref(), o.required),
                )
            })
            .collect();
        console.properties(&rows);
    }

    if !node.examples().is_empty() {
        console.caption("Examples");
        for example in node.examples() {
            console.definition(&example.caption, &example.content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_required() {
        assert_eq!(with_required(None, false), "<no description>");
        assert_eq!(with_required(Some("Target"), true), "Target [required]");
    }
}
