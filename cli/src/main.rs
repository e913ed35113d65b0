//! `foundation`: file utilities on top of the runtime foundation.
//!
//! Every invocation initializes the runtime exactly once, logging to
//! `{log_dir}/foundation-{command}.log`, then runs a single subcommand.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use foundation::Runtime;
use foundation::config::{FoundationConfig, load_config_file};
use foundation::identity::RunMarker;
use foundation::io::{CopyOptions, DeletePolicy};
use foundation::log_args;
use foundation_cli::{commands, exit_codes};

const TOOL_NAME: &str = "foundation";
const DEFAULT_CONFIG: &str = "foundation.json";

#[derive(Parser)]
#[command(
    name = "foundation",
    version,
    about = "File utilities with structured run logging"
)]
struct Cli {
    /// Verbose logging and full paths in output.
    #[arg(long, global = true)]
    debug: bool,

    /// Mirror log output to stderr.
    #[arg(long, global = true)]
    console: bool,

    /// Directory for log files (defaults to the executable's directory).
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// JSON configuration file; `foundation.json` is read if present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print runtime identity and file locations.
    Info,
    /// List files matching a pattern.
    Files {
        /// Shell-style file name pattern, e.g. `*.sol`.
        pattern: String,
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(short, long)]
        recurse: bool,
    },
    /// Delete files matching a pattern.
    Delete {
        pattern: String,
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(short, long)]
        recurse: bool,
        /// Log files that cannot be deleted and carry on.
        #[arg(long)]
        keep_going: bool,
    },
    /// Print the relative path from one location to another.
    Relpath { from: String, to: String },
    /// Copy a directory's files.
    Copy {
        source: PathBuf,
        dest: PathBuf,
        #[arg(short, long)]
        recursive: bool,
        /// Replace files that already exist at the destination.
        #[arg(long)]
        overwrite: bool,
    },
    /// Download a URL (http, https or file) to a local path.
    Download {
        name: String,
        url: String,
        dest: PathBuf,
    },
}

impl Command {
    /// Log name for this invocation.
    fn name(&self) -> &'static str {
        match self {
            Command::Info => "info",
            Command::Files { .. } => "files",
            Command::Delete { .. } => "delete",
            Command::Relpath { .. } => "relpath",
            Command::Copy { .. } => "copy",
            Command::Download { .. } => "download",
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::FAILED
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    let runtime = Arc::new(Runtime::new());
    runtime.install_panic_hook();
    let log_dir = config.log_dir.as_deref();
    let log_name = cli.command.name();
    if config.console {
        runtime.initialize_with_file_and_console_logging(
            TOOL_NAME,
            log_name,
            config.debug,
            log_dir,
        )?;
    } else {
        runtime.initialize_with_file_logging(TOOL_NAME, log_name, config.debug, log_dir)?;
    }
    runtime.apply_config(&config);
    if let Err(err) = cancel_on_ctrl_c(Arc::clone(&runtime)) {
        runtime.logger().warn(
            "Ctrl-C will not cancel this run: {0}",
            log_args![format!("{err:#}")],
        );
    }

    let _marker = acquire_marker(&runtime);
    dispatch(&runtime, &config, cli.command).inspect_err(|err| {
        let cause: &(dyn Error + 'static) = err.as_ref();
        runtime
            .logger()
            .error_with(cause, "Command {0} failed.", log_args![log_name]);
    })
}

/// Config file values, overridden by command-line flags.
fn effective_config(cli: &Cli) -> Result<FoundationConfig> {
    let (path, required) = match &cli.config {
        Some(path) => (path.as_path(), true),
        None => (Path::new(DEFAULT_CONFIG), false),
    };
    let mut config = load_config_file(path, required)?;
    config.debug |= cli.debug;
    config.console |= cli.console;
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

/// First Ctrl-C cancels the runtime scope so polling work can stop cleanly;
/// a second one exits immediately.
fn cancel_on_ctrl_c(runtime: Arc<Runtime>) -> Result<()> {
    let signals = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build signal runtime")?;
    thread::Builder::new()
        .name("ctrl-c".to_string())
        .spawn(move || {
            signals.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                runtime.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(exit_codes::FAILED);
                }
            });
        })
        .context("spawn ctrl-c watcher")?;
    Ok(())
}

/// A missing data directory or unwritable marker never blocks a command.
fn acquire_marker(runtime: &Runtime) -> Option<RunMarker> {
    let path = runtime.run_file()?;
    match RunMarker::acquire(&path, runtime.session_id()) {
        Ok(marker) => Some(marker),
        Err(err) => {
            runtime.logger().warn(
                "Could not write run marker {0}: {1}",
                log_args![&path, format!("{err:#}")],
            );
            None
        }
    }
}

fn dispatch(runtime: &Runtime, config: &FoundationConfig, command: Command) -> Result<i32> {
    match command {
        Command::Info => commands::info(runtime, config.log_dir.as_deref()),
        Command::Files {
            pattern,
            path,
            recurse,
        } => commands::files(runtime, &pattern, &path, recurse),
        Command::Delete {
            pattern,
            path,
            recurse,
            keep_going,
        } => {
            let policy = if keep_going {
                DeletePolicy::ContinueOnError
            } else {
                config.delete_policy
            };
            commands::delete(runtime, &pattern, &path, recurse, policy)
        }
        Command::Relpath { from, to } => commands::relpath(&from, &to),
        Command::Copy {
            source,
            dest,
            recursive,
            overwrite,
        } => {
            let options = CopyOptions {
                recursive,
                overwrite: overwrite || config.copy_overwrite,
            };
            commands::copy(runtime, &source, &dest, options)
        }
        Command::Download { name, url, dest } => {
            commands::download(runtime, config, &name, &url, &dest)
        }
    }
}
