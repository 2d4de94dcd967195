use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use chute::conf::Config;
use chute::core::{CliArgs, setup_logging};
use chute::ingest::Ingestor;
use chute::warehouse::SnowSql;
use chute::watch::DirWatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();
    let args = CliArgs::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    if let Some(root) = args.root {
        config.watch.root = root;
    }

    let warehouse = Arc::new(SnowSql::new(config.warehouse.clone()));
    let mut ingestor = Ingestor::new(warehouse, &config.warehouse);
    let mut watcher = DirWatcher::start(&config.watch.root, config.watch.recursive)
        .with_context(|| format!("watching {}", config.watch.root.display()))?;

    info!("Chute started, watching {}", config.watch.root.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Chute stopped.");
                break;
            }
            event = watcher.next() => match event {
                Some(path) => {
                    info!("New CSV file detected: {}", path.display());
                    ingestor.ingest(&path).await;
                }
                None => {
                    error!("Watcher channel closed.");
                    break;
                }
            },
        }
    }

    Ok(())
}
