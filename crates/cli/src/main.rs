mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use buildgen_lib::session::SessionError;

use cmd::{CacheAction, ConfigureOptions, cmd_cache, cmd_configure, cmd_generate, cmd_info};
use output::{OutputFormat, Status, status};

/// bgen - generate build scripts from project declarations
#[derive(Parser)]
#[command(name = "bgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Configure a build directory and generate its build scripts
  Configure {
    /// Generator to use (make, ninja, fastbuild)
    generator: String,

    /// Directory holding the project declarations
    source_dir: PathBuf,

    /// Directory receiving the cache and generated files
    build_dir: PathBuf,

    /// Declarations file (default: <SOURCE_DIR>/projects.json)
    #[arg(short, long)]
    projects: Option<PathBuf>,

    /// Set a cache entry before generating
    #[arg(short = 'D', value_name = "KEY[:KIND]=VALUE")]
    define: Vec<String>,

    /// Directory of engine resources (default: $BGEN_RESOURCE_ROOT)
    #[arg(long)]
    resource_root: Option<PathBuf>,

    /// Generator platform name
    #[arg(long)]
    platform: Option<String>,

    /// Give up when a phase starts after this long, e.g. "30s"
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
  },

  /// Regenerate a configured build directory from its cache
  Generate {
    build_dir: PathBuf,

    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,
  },

  /// Inspect or edit the cache of a build directory
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },

  /// Show version and available generators
  Info {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
  let filter = EnvFilter::builder()
    .with_default_directive(default_level.into())
    .from_env_lossy();
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Configure {
      generator,
      source_dir,
      build_dir,
      projects,
      define,
      resource_root,
      platform,
      timeout,
    } => cmd_configure(ConfigureOptions {
      generator,
      source_dir,
      build_dir,
      projects,
      definitions: define,
      resource_root,
      platform,
      timeout,
    }),
    Commands::Generate { build_dir, timeout } => cmd_generate(&build_dir, timeout),
    Commands::Cache { action } => cmd_cache(action),
    Commands::Info { output } => cmd_info(output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      status(Status::Failure, &format!("{:#}", err));
      ExitCode::from(exit_code(&err))
    }
  }
}

/// Session failures carry their own code; everything else is a generic failure.
fn exit_code(err: &anyhow::Error) -> u8 {
  err
    .chain()
    .find_map(|cause| cause.downcast_ref::<SessionError>())
    .map(|session| session.class().exit_code())
    .and_then(|code| u8::try_from(code).ok())
    .unwrap_or(1)
}
