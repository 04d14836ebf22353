//! Headless replay shell for the Palaver chat store.
//!
//! Restores the store from the snapshot directory, then reads JSON-encoded
//! `StoreEvent`s from stdin (one per line) and feeds them through the
//! dispatch loop. Useful for smoke-testing snapshot dirs and replaying
//! captured event streams.

mod config;
mod logging;
mod snapshot_dir;

use std::io::{self, BufRead};

use store_core::{ChatStore, Dispatcher, StoreChannels, StoreEvent, restore};
use tracing::{info, warn};

use crate::{config::ShellConfig, snapshot_dir::SnapshotDir};

#[tokio::main]
async fn main() {
    logging::init();

    let config = match ShellConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    let snapshots = match SnapshotDir::new(&config.data_dir) {
        Ok(snapshots) => snapshots,
        Err(err) => {
            eprintln!(
                "failed to open snapshot dir {}: {err}",
                config.data_dir.display()
            );
            std::process::exit(1);
        }
    };

    let mut store = ChatStore::new();
    let report = restore(&mut store, &snapshots);
    info!(
        chats = report.chats,
        histories = report.chats_with_history,
        unread = report.unread,
        active_chat = report.active_chat,
        user = config.user_id.as_deref().unwrap_or("<unset>"),
        "store restored from snapshots"
    );

    let (channels, events) = StoreChannels::new(config.event_buffer, config.notice_buffer);
    let notice_tx = channels.notice_sender();
    let mut notices = channels.subscribe_notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            info!(?notice, "store notice");
        }
    });

    let sender = channels.event_sender();
    let reader = tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "stdin read failed");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<StoreEvent>(trimmed) {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(err) => warn!(%err, "skipping malformed event line"),
            }
        }
    });
    drop(channels);

    let store = Dispatcher::new(store, snapshots, notice_tx).run(events).await;
    let _ = reader.await;

    info!(
        chats = store.chats().len(),
        total_unread = store.unread().len(),
        "event replay finished"
    );
}
