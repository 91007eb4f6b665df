mod commands;

use clap::{Parser, Subcommand};
use commands::{compile::CompileOptions, EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use gostage_core::install_signal_handler;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gostage",
    version,
    about = "Staging engine for Go application buildpacks"
)]
struct Cli {
    /// Path to the dependency manifest.
    #[arg(long, default_value = "manifest.toml", global = true)]
    manifest: PathBuf,

    /// Cache root directory; persists across staging runs.
    #[arg(long, default_value = "~/.cache/gostage", global = true)]
    cache: String,

    /// Forbid network access; all dependencies must already be cached.
    #[arg(long, default_value_t = false, global = true)]
    offline: bool,

    /// Toolchain backend used for the compile phase.
    #[arg(long, default_value = "process", global = true)]
    toolchain: String,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify an application tree; prints the family name token if buildable.
    Detect {
        /// Application source root.
        app_dir: PathBuf,
    },
    /// Stage an application: resolve, acquire, and compile into a build dir.
    Compile {
        /// Application source root.
        app_dir: PathBuf,
        /// Destination for the built droplet and staging info.
        build_dir: PathBuf,
    },
    /// Print the process-start specification for a staged build dir.
    Release {
        /// Build dir previously populated by compile.
        build_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("GOSTAGE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let cache_root = expand_tilde(&cli.cache);

    let result = match cli.command {
        Commands::Detect { app_dir } => commands::detect::run(&app_dir, &cli.manifest),
        Commands::Compile { app_dir, build_dir } => commands::compile::run(
            &app_dir,
            &build_dir,
            &CompileOptions {
                manifest_path: &cli.manifest,
                cache_root: &cache_root,
                offline: cli.offline,
                toolchain: &cli.toolchain,
            },
        ),
        Commands::Release { build_dir } => commands::release::run(&build_dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
