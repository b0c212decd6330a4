//! The templet command-line interface.

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};
use walkdir::WalkDir;

use crate::cli::args::{Command, TempletArgs};
use crate::config::Config;
use crate::engine::Engine;
use crate::resolver::FileResolver;
use crate::runtime::Context;
use crate::{err_msg, TempletError};

pub mod args;
pub mod output;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "TEMPLET_LOG";

/// The main entry point for the CLI.
pub fn run() {
    let args = TempletArgs::parse();
    init_tracing(args.verbose);

    let config = Config::discover(args.config.as_deref()).unwrap_or_else(|e| {
        output::print_error(e);
        process::exit(2);
    });
    let engine = Engine::from_config(config);

    let result = match args.command {
        Command::Compile { file } => engine.lower_file(&file).map(|text| print!("{text}")),
        Command::Render {
            file,
            data,
            data_file,
        } => load_context(data, data_file)
            .and_then(|context| engine.render_file(&file, context))
            .map(|text| print!("{text}")),
        Command::Ast { file } => engine.parse(&file).map(|t| output::print_ast(&t)),
        Command::Check { path } => {
            let failed = check(&engine, &path);
            if failed > 0 {
                process::exit(1);
            }
            Ok(())
        }
        Command::Tags => {
            output::print_tags(engine.tags());
            Ok(())
        }
    };

    if let Err(e) = result {
        output::print_error(e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "templet=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .try_init();
}

fn load_context(data: Option<String>, data_file: Option<PathBuf>) -> Result<Context, TempletError> {
    let text = match (data, data_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            err_msg!(Render, "Unable to read render data `{}`", path.display()).caused_by(e)
        })?,
        (None, None) => return Ok(Context::new()),
    };
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| err_msg!(Render, "Render data is not valid JSON: {}", e).caused_by(e))?;
    Context::from_json(json)
}

/// Compiles every template under `dir`, printing one line per file.
/// Returns the number of failures.
fn check(engine: &Engine<FileResolver>, dir: &Path) -> usize {
    let root = engine.resolver().root().to_path_buf();
    let mut passed = 0;
    let mut failed = 0;

    let files = WalkDir::new(root.join(dir))
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && engine.config().is_template(entry.path()));

    for entry in files {
        let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        match engine.compile_file(&name) {
            Ok(_) => {
                passed += 1;
                output::print_check_result(&name, true);
            }
            Err(e) => {
                failed += 1;
                output::print_check_result(&name, false);
                output::print_error(e);
            }
        }
    }

    output::print_check_summary(passed, failed);
    failed
}
