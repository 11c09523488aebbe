mod app;
mod cache;
mod config;
mod event;
mod logging;
mod market;
mod pending;
mod refresh;
mod reveal;
mod session;
#[cfg(test)]
mod testing;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use crate::config::{CacheMode, Config};
use crate::market::MarketClient;
use crate::session::SessionHandle;

#[derive(Parser, Debug)]
#[command(name = "shopsync")]
#[command(about = "A terminal storefront manager with an owner-aware offline cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/shopsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// User id to sign in as, overriding session.user_id
  #[arg(short, long)]
  user: Option<String>,

  /// Skip the persistent cache and always read from the network
  #[arg(long)]
  no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let _log_guard = logging::init(&Config::data_dir()?)?;

  let mode = if args.no_cache {
    CacheMode::Off
  } else {
    config.cache.mode
  };
  let session = SessionHandle::new(args.user.or_else(|| config.session.user_id.clone()));
  tracing::info!(?mode, "starting");

  // Initialize and run the app
  let client = MarketClient::new(&config, session, mode)?;
  let mut app = app::App::new(&config, client);
  app.run().await?;

  Ok(())
}
