use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stepcache_lib::consts::DEFAULT_SEARCH_DEPTH;

mod cmd;
mod output;

use cmd::{CacheArgs, cmd_cache, cmd_discover};
use output::{OutputFormat, print_error};

/// stepcache - cache pipeline step results for the next workflow step
#[derive(Parser)]
#[command(name = "stepcache")]
#[command(author, version, about, long_about = None)]
#[command(
  after_help = "Mappings match whole leading folders: \"/home/tom:/home/sue\" maps \"/home/tom/x\" but not \"/home/tomorrow\"."
)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Copy the files named in results manifests into a cache folder
  Cache(CacheArgs),

  /// List the results manifests that would be read
  Discover {
    /// A results.json file or a folder to search
    root: PathBuf,

    /// Folder depth to search (1 = this folder only)
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
    search_depth: usize,
  },
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Cache(args) => cmd_cache(args, cli.output),
    Commands::Discover { root, search_depth } => cmd_discover(&root, search_depth, cli.output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
