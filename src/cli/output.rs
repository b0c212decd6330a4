//! Handles all user-facing output for the CLI.
//!
//! Errors go to stderr as `miette` reports; summaries and listings go to
//! stdout, colored when the terminal supports it.

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::ast::Template;
use crate::tags::TagRegistry;
use crate::TempletError;

/// Prints an error with its source snippet and labels.
pub fn print_error(error: TempletError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

pub fn print_ast(template: &Template) {
    if template.nodes.is_empty() {
        println!("(empty)");
        return;
    }
    for node in &template.nodes {
        println!("{node:#?}");
    }
}

pub fn print_tags(tags: &TagRegistry) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for tag in tags.iter() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
        let _ = write!(stdout, "  {:<8}", tag.name());
        let _ = stdout.reset();
        let mut flags = Vec::new();
        if tag.ends() {
            flags.push(format!("ends with end{}", tag.name()));
        }
        if tag.block() {
            flags.push("block".to_string());
        }
        let _ = writeln!(stdout, " {}", flags.join(", "));
    }
}

/// One line per checked file, then a summary.
pub fn print_check_result(name: &str, ok: bool) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let (mark, color) = if ok { ("✓", Color::Green) } else { ("✗", Color::Red) };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)));
    let _ = write!(stdout, "{mark}");
    let _ = stdout.reset();
    let _ = writeln!(stdout, " {name}");
}

pub fn print_check_summary(passed: usize, failed: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_bold(true));
    let _ = writeln!(stdout, "\nChecked {} templates", passed + failed);
    let _ = stdout.reset();
    if passed > 0 {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = writeln!(stdout, "✓ Passed: {passed}");
    }
    if failed > 0 {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(stdout, "✗ Failed: {failed}");
    }
    let _ = stdout.reset();
}
