use std::sync::Arc;

use clap::Parser;
use feeder::cli::{Cli, execute};
use feeder_logging::{FeederSubscriberBuilder, UserContextGuard};
use tracing::info;

// Single-threaded so the user context guard stays on the thread it was set on
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let _log_guard = FeederSubscriberBuilder::new()
        .with_config(config.log_config())
        .init()?;
    let _user_guard = cli.command.user().map(UserContextGuard::new);

    let store = config.store.open()?;
    let feed = Arc::new(config.feed.build(store));
    info!(feed = feed.name(), engine = ?config.store.engine, "Feed ready");

    let output = execute(feed, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
