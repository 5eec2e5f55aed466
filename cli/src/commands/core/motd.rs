//! # Root Command (message of the day)
//!
//! File: cli/src/commands/core/motd.rs
//!
//! Running the binary without a command prints a logo, the version and a
//! hint to use `--help`. Logos come from the `logo` config key:
//!
//! ```json
//! { "logo": { "logoIndex": 1, "logos": [["line one", "line two"]] } }
//! ```
//!
//! Without `logos`, the set compiled in from `assets/logos.txt` is used
//! (blocks separated by blank lines). The key is never written back.
//!
use crate::common::ui::Console;
use crate::core::app::AppHost;
use crate::core::dispatch::Request;
use crate::core::error::Result;
use crate::core::module::ModuleApi;
use serde_json::{json, Value};

/// Config key holding the logo settings.
pub const LOGO_CONFIG_KEY: &str = "logo";

const EMBEDDED_LOGOS: &str = include_str!("../../../assets/logos.txt");

pub fn register(api: &mut ModuleApi<'_>, silent: bool) {
    api.register_configuration(
        LOGO_CONFIG_KEY,
        json!({ "logoIndex": 0 }),
        Some(Box::new(|_: &Value| -> Option<Value> { None })),
    );

    api.root_command()
        .set_controller(move |host: &mut AppHost, _request: &Request, console: &Console| {
            show_motd(host, console, silent)
        });
}

/// Splits a logo file into blocks of non-empty lines.
pub fn parse_logos(contents: &str) -> Vec<Vec<String>> {
    let mut logos = vec![Vec::new()];
    for line in contents.lines() {
        if !line.trim().is_empty() {
            if let Some(current) = logos.last_mut() {
                current.push(line.trim_end().to_string());
            }
        } else if logos.last().is_some_and(|current| !current.is_empty()) {
            logos.push(Vec::new());
        }
    }
    logos.retain(|logo| !logo.is_empty());
    logos
}

fn configured_logos(config: Option<&Value>) -> Option<Vec<Vec<String>>> {
    let logos = config?.get("logos")?.as_array()?;
    Some(
        logos
            .iter()
            .map(|logo| match logo {
                Value::Array(lines) => lines
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                Value::String(text) => text.lines().map(str::to_string).collect(),
                _ => Vec::new(),
            })
            .collect(),
    )
}

/// Right-aligns `text` to `width` columns.
fn align_right(text: &str, width: usize) -> String {
    format!("{:>width$}", text, width = width)
}

fn show_motd(host: &AppHost, console: &Console, silent: bool) -> Result<()> {
    let app = host.get_info();
    let config = host.config().get(LOGO_CONFIG_KEY);
    let logos = configured_logos(config).unwrap_or_else(|| parse_logos(EMBEDDED_LOGOS));
    let index = config
        .and_then(|c| c.get("logoIndex"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    console.break_line();
    let mut width = 0;
    if !logos.is_empty() && !silent {
        for line in &logos[index % logos.len()] {
            width = width.max(line.chars().count());
            console.write_raw(&format!("  {}\n", line));
        }
    } else {
        console.caption(&app.name);
    }

    if let Some(version) = &app.version {
        console.break_line();
        console.debug(align_right(&format!("v{}", version), width));
    }

    console.break_line();
    console.notice(format!("Run \"{} --help\" to show usage information.", app.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_logos_splits_on_blank_lines() {
        let logos = parse_logos("\n  a\n  b\n\n\n c\n");
        assert_eq!(
            logos,
            vec![
                vec!["  a".to_string(), "  b".to_string()],
                vec![" c".to_string()]
            ]
        );
        assert!(!parse_logos(EMBEDDED_LOGOS).is_empty());
    }

    #[test]
    fn test_configured_logos_accepts_arrays_and_strings() {
        let config = json!({ "logos": [["x", "y"], "z\nw"] });
        assert_eq!(
            configured_logos(Some(&config)),
            Some(vec![
                vec!["x".to_string(), "y".to_string()],
                vec!["z".to_string(), "w".to_string()]
            ])
        );
        assert_eq!(configured_logos(Some(&json!({ "logoIndex": 0 }))), None);
        assert_eq!(configured_logos(None), None);
    }

    #[test]
    fn test_align_right() {
        assert_eq!(align_right("v1", 4), "  v1");
        assert_eq!(align_right("v1.0.0", 2), "v1.0.0");
    }
}
