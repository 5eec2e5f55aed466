//! # Modhost Console Output (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//!
//! ## Overview
//!
//! The host and its modules never print directly. They write through a
//! `Console`, a write-only sink with a handful of layout primitives: captions,
//! plain / debug / notice / success / error lines, key-value properties,
//! definitions, bullet lists, indentation and blank lines.
//!
//! ## Architecture
//!
//! `Console` is a cheap, clonable handle (`Rc<RefCell<..>>`) around any
//! `std::io::Write`. The host holds one and hands clones to controllers, so a
//! controller can keep writing while it also mutates the host. Three
//! constructors cover the use cases:
//! - `Console::stdout()` for the binary,
//! - `Console::silent()` for embedders that only want side effects,
//! - `Console::captured()` which also returns a `CapturedOutput` to inspect
//!   what was written (used by tests).
//!
//! Styling is intentionally absent: every primitive renders as plain text.
//!
use std::cell::RefCell;
use std::fmt::Display;
use std::io::{self, Write};
use std::rc::Rc;

const INDENTATION: &str = "  ";

struct ConsoleInner {
    out: Box<dyn Write>,
    depth: usize,
}

/// Write-only output sink shared by the host and its modules.
#[derive(Clone)]
pub struct Console {
    inner: Rc<RefCell<ConsoleInner>>,
}

/// Read side of a `Console::captured()` console.
#[derive(Clone, Default)]
pub struct CapturedOutput {
    buffer: Rc<RefCell<Vec<u8>>>,
}

struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedOutput {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    /// Forgets everything written so far.
    pub fn reset(&self) {
        self.buffer.borrow_mut().clear();
    }
}

impl Console {
    pub fn new(out: Box<dyn Write>) -> Self {
        Console {
            inner: Rc::new(RefCell::new(ConsoleInner { out, depth: 0 })),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()))
    }

    /// A console writing into memory, plus a handle to read it back.
    pub fn captured() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        let console = Self::new(Box::new(SharedBuffer(Rc::clone(&captured.buffer))));
        (console, captured)
    }

    fn line(&self, text: &str) {
        let mut inner = self.inner.borrow_mut();
        let prefix = INDENTATION.repeat(inner.depth);
        for row in text.lines() {
            // Output is best-effort; a closed pipe must not turn into a host error.
            let _ = writeln!(inner.out, "{}{}", prefix, row);
        }
        if text.is_empty() {
            let _ = writeln!(inner.out);
        }
    }

    pub fn log(&self, text: impl Display) {
        self.line(&text.to_string());
    }

    pub fn debug(&self, text: impl Display) {
        self.line(&text.to_string());
    }

    pub fn notice(&self, text: impl Display) {
        self.line(&text.to_string());
    }

    pub fn success(&self, text: impl Display) {
        self.line(&text.to_string());
    }

    pub fn error(&self, text: impl Display) {
        self.line(&text.to_string());
    }

    /// A section heading, preceded by a blank line.
    pub fn caption(&self, text: impl Display) {
        self.break_line();
        self.line(&text.to_string());
    }

    pub fn property(&self, key: impl Display, value: impl Display) {
        self.properties(&[(key.to_string(), value.to_string())]);
    }

    /// Key-value pairs with the keys padded to a common width. Multi-line
    /// values continue under the value column.
    pub fn properties<K: AsRef<str>, V: AsRef<str>>(&self, rows: &[(K, V)]) {
        let width = rows
            .iter()
            .map(|(key, _)| key.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        for (key, value) in rows {
            let mut lines = value.as_ref().lines();
            let first = lines.next().unwrap_or("");
            self.line(&format!("{:<width$}  {}", key.as_ref(), first, width = width));
            for rest in lines {
                self.line(&format!("{:<width$}  {}", "", rest, width = width));
            }
        }
    }

    /// A term with its definition indented below it.
    pub fn definition(&self, term: impl Display, definition: impl Display) {
        self.line(&term.to_string());
        self.indent();
        self.line(&definition.to_string());
        self.outdent();
    }

    pub fn list<S: AsRef<str>>(&self, items: &[S], bullet: &str) {
        for item in items {
            self.line(&format!("{} {}", bullet, item.as_ref()));
        }
    }

    pub fn indent(&self) {
        self.inner.borrow_mut().depth += 1;
    }

    pub fn outdent(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.depth = inner.depth.saturating_sub(1);
    }

    pub fn break_line(&self) {
        let mut inner = self.inner.borrow_mut();
        let _ = writeln!(inner.out);
    }

    /// Raw write, no indentation or trailing newline.
    pub fn write_raw(&self, text: &str) {
        let _ = self.inner.borrow_mut().out.write_all(text.as_bytes());
    }

    pub fn flush(&self) {
        let _ = self.inner.borrow_mut().out.flush();
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_are_aligned() {
        let (console, output) = Console::captured();
        console.properties(&[("Command", "modhost who"), ("Aliases", "whoami")]);
        assert_eq!(output.contents(), "Command  modhost who\nAliases  whoami\n");
    }

    #[test]
    fn test_indentation_applies_to_every_line() {
        let (console, output) = Console::captured();
        console.indent();
        console.log("first\nsecond");
        console.outdent();
        console.outdent();
        console.log("third");
        assert_eq!(output.contents(), "  first\n  second\nthird\n");
    }

    #[test]
    fn test_definition_and_list() {
        let (console, output) = Console::captured();
        console.definition("modhost module --list", "List modules.");
        console.list(&["core", "extra"], "-");
        assert!(output.contains("modhost module --list\n  List modules.\n"));
        assert!(output.contains("- core\n- extra\n"));
        output.reset();
        assert!(output.contents().is_empty());
    }
}
