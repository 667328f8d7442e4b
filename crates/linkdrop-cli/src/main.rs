//! linkdrop demo binary: wires the engine against the real Dropbox backend.
//!
//! Usage:
//!   linkdrop-cli <config.json> <items.json>
//!
//! `config.json` carries the store path, Dropbox credentials, and optional
//! engine overrides:
//!   {"store_path": "linkdrop.json",
//!    "auth": {"app_key": "...", "app_secret": "...", "refresh_token": "..."},
//!    "engine": {"folder": "/linkdrop-uploads"}}
//!
//! `items.json` is an array of collected images:
//!   [{"src_url": "https://...", "filename": "a.jpg",
//!     "data_url": "data:image/jpeg;base64,...", "thumb_data_url": null}]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use linkdrop_core::app::{Dispatcher, Gateway, Scheduler};
use linkdrop_core::config::EngineConfig;
use linkdrop_core::domain::NewItem;
use linkdrop_core::impls::{DropboxAuth, DropboxClient, DropboxTokenProvider, JsonStore};
use linkdrop_core::ports::{HttpFetcher, SystemClock, UlidGenerator};

#[derive(Debug, Deserialize)]
struct CliConfig {
    store_path: String,
    auth: DropboxAuth,
    #[serde(default)]
    engine: EngineConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(items_path)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: linkdrop-cli <config.json> <items.json>");
    };

    let config: CliConfig = serde_json::from_str(
        &tokio::fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("reading {config_path}"))?,
    )
    .context("parsing config")?;

    let items: Vec<NewItem> = serde_json::from_str(
        &tokio::fs::read_to_string(&items_path)
            .await
            .with_context(|| format!("reading {items_path}"))?,
    )
    .context("parsing items")?;

    // (A) Durable store + ports.
    let store = Arc::new(JsonStore::open(&config.store_path).await?);
    let gateway = Arc::new(Gateway::new(
        store.clone(),
        Arc::new(UlidGenerator::new(SystemClock)),
        Arc::new(SystemClock),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        Arc::new(DropboxClient::default()),
        Arc::new(DropboxTokenProvider::new(config.auth)),
        Arc::new(HttpFetcher::new()),
        gateway.clone(),
        config.engine.clone(),
    ));

    // (B) Periodic trigger.
    let scheduler = Scheduler::spawn(dispatcher, config.engine.drain_interval());

    // (C) Enqueue the collected images and ask for an immediate drain.
    info!(count = items.len(), "enqueueing items");
    gateway.enqueue(items).await?;
    scheduler.drain_soon();

    // (D) Wait until the queue drains, reporting progress.
    loop {
        let (queue, completed) = gateway.snapshot().await?;
        info!(queued = queue.len(), completed = completed.len(), "progress");
        if queue.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    // (E) Print the outcome per item.
    let (_, completed) = gateway.snapshot().await?;
    for record in &completed {
        match (&record.dropbox_url, &record.error) {
            (Some(url), _) => println!("{}  {}", record.id, url),
            (None, Some(err)) => println!("{}  FAILED: {}", record.id, err),
            (None, None) => println!("{}  FAILED", record.id),
        }
    }

    scheduler.shutdown_and_join().await;
    Ok(())
}
