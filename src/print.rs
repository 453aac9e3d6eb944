//! Render a resolved record for humans, masking credentials.
//!
//! A field is masked when annotated `secret`, or when its name looks like a
//! credential (contains SECRET, PASSWORD, TOKEN, or KEY). Long values keep
//! their first and last three characters; short ones become `***` outright.

use std::fmt::Write as _;
use std::io::{self, Write as _};

use crate::coerce::FromValue;
use crate::error::HotfigError;
use crate::keymap::screaming_snake;
use crate::record::{FieldMeta, FieldVisitor, Record};

const RULE_WIDTH: usize = 50;

/// Render `config` to a string.
pub fn render<T: Record + Clone>(config: &T) -> String {
    let mut printer = Printer {
        out: String::new(),
        indent: 0,
    };
    // The printer visitor never fails; visiting a clone leaves the caller's
    // record untouched.
    let _ = config.clone().visit(&mut printer);

    let rule = "─".repeat(RULE_WIDTH);
    format!("Configuration:\n{rule}\n{}{rule}\n", printer.out)
}

/// Write the rendered form to `w`.
pub fn print_to<T: Record + Clone>(w: &mut dyn io::Write, config: &T) -> io::Result<()> {
    w.write_all(render(config).as_bytes())
}

/// Write the rendered form to stdout.
pub fn print<T: Record + Clone>(config: &T) {
    let _ = print_to(&mut io::stdout().lock(), config);
}

struct Printer {
    out: String,
    indent: usize,
}

impl FieldVisitor for Printer {
    fn leaf<F: FromValue>(
        &mut self,
        name: &str,
        meta: FieldMeta,
        field: &mut F,
    ) -> Result<(), HotfigError> {
        let value = field.display();
        let shown = if looks_secret(name, meta) && !value.is_empty() {
            mask(&value)
        } else {
            value
        };
        let pad = "  ".repeat(self.indent);
        let key = screaming_snake(name);
        let _ = writeln!(self.out, "{pad}{key:<25} = {shown}");
        Ok(())
    }

    fn nested<R: Record>(&mut self, name: &str, record: &mut R) -> Result<(), HotfigError> {
        let pad = "  ".repeat(self.indent);
        let _ = writeln!(self.out, "{pad}{name}:");
        self.indent += 1;
        let result = record.visit(self);
        self.indent -= 1;
        result
    }
}

fn looks_secret(name: &str, meta: FieldMeta) -> bool {
    if meta.secret {
        return true;
    }
    let upper = name.to_ascii_uppercase();
    ["SECRET", "PASSWORD", "TOKEN", "KEY"]
        .iter()
        .any(|marker| upper.contains(marker))
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}
