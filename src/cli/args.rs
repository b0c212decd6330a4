//! Defines the command-line arguments and subcommands for the templet CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "templet",
    version,
    about = "Compile and render templates with macros, call blocks and macro imports."
)]
pub struct TempletArgs {
    /// Configuration file (defaults to ./templet.yaml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log compiler activity to stderr. `TEMPLET_LOG` overrides the filter.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the compiled script text of a template.
    Compile {
        /// Template name, relative to the configured root.
        #[arg(required = true)]
        file: String,
    },
    /// Render a template to stdout.
    Render {
        /// Template name, relative to the configured root.
        #[arg(required = true)]
        file: String,
        /// Render data as a JSON object.
        #[arg(long, conflicts_with = "data_file")]
        data: Option<String>,
        /// File holding the render data as a JSON object.
        #[arg(long)]
        data_file: Option<PathBuf>,
    },
    /// Show the syntax tree of a template.
    Ast {
        /// Template name, relative to the configured root.
        #[arg(required = true)]
        file: String,
    },
    /// Compile every template below a directory and report failures.
    Check {
        /// Directory to scan, relative to the configured root.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// List the registered tags.
    Tags,
}
