mod cache;
mod commands;
mod config;
mod error;
mod moco;
mod shell;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use moco::CachedMocoClient;
use shell::Query;

#[derive(Parser, Debug)]
#[command(name = "moco")]
#[command(about = "A caching command-line client for the MOCO time-tracking API")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./moco.yaml, then $XDG_CONFIG_HOME/moco/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  #[command(flatten)]
  Query(Query),
  /// Interactive session that keeps the cache between queries
  Shell,
}

/// Log to stderr so stdout stays clean for results.
///
/// Level comes from `MOCO_LOG` (e.g. `moco=debug`), defaulting to info.
fn init_tracing() -> WorkerGuard {
  let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
  let filter = EnvFilter::try_from_env("MOCO_LOG").unwrap_or_else(|_| EnvFilter::new("moco=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_target(false)
    .init();

  guard
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing();

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?.resolve()?;
  debug!(
    base_url = %config.base_url,
    cache_ttl_seconds = config.cache_ttl_seconds,
    "configuration loaded"
  );

  let client = CachedMocoClient::new(&config)?;

  match args.command {
    Command::Query(query) => {
      let value = shell::execute(&client, &query).await?;
      println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Command::Shell => shell::run(&client).await?,
  }

  Ok(())
}
