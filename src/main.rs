use animal_sdk::models::UrlParams;
use animal_sdk::{AnimalSdk, Config};
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "animal-sdk")]
#[command(about = "Exercise the Animal API through the SDK")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/animal-sdk/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(short, long)]
  log_file: Option<PathBuf>,
}

/// Install the subscriber. The guard must live until exit or buffered lines are lost.
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  match log_file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
      Ok(Some(guard))
    }
    None => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
      Ok(None)
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_logging(args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;
  let sdk = AnimalSdk::new(config)?;

  // Everything below is queued behind the login and the animal fetch.
  let connected = sdk.connect();

  let published = sdk.pages.get_all_published(UrlParams::default()).await?;
  info!(count = published.items.len(), "Published pages");
  let pages = join_all(published.items.iter().map(|page| sdk.pages.get(page.id))).await;
  for page in pages {
    match page {
      Ok(page) => info!(id = page.basic.id, title = %page.basic.title, "Page"),
      Err(e) => warn!(error = %e, "Failed to fetch page"),
    }
  }

  let menu = sdk.menu_items.get_all(UrlParams::default()).await?;
  for item in &menu.items {
    info!(position = item.position, name = %item.name, "Menu item");
  }

  let answered = sdk.questions.get_all_answered(UrlParams::default()).await?;
  info!(count = answered.items.len(), "Answered questions");

  let animal = connected.await?;
  let number = sdk.months.current().await?;
  info!(animal = %animal.name, month = number, "Current month");
  let month = sdk.months.get(u64::from(number)).await?;
  info!(id = month.basic.id, name = %month.name, "Month");

  Ok(())
}
