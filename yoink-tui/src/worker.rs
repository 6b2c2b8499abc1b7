// Background work for the REPL. Everything that touches the network runs on
// the tokio runtime and reports back over an unbounded channel that the UI
// drains once per tick.

use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use yoink_core::{
    DownloadOptions, DownloadOutcomeCallback, LoadedPage, PageSource, execute_downloads,
    load_page,
};
use yoink_scanner::{DirectorySaver, HttpFetcher, MediaReference, SaveOutcome};

/// Message types for communication between workers and the TUI
#[derive(Debug)]
pub enum UiMessage {
    /// A page finished loading and is ready for discovery
    PageLoaded(LoadedPage),
    ScanFailed { source: String, reason: String },
    /// One download finished, successfully or not
    Downloaded(SaveOutcome),
    DownloadsFinished { saved: usize, failed: usize },
}

pub fn spawn_scan(
    handle: &Handle,
    client: Client,
    source: PageSource,
    tx: UnboundedSender<UiMessage>,
) {
    handle.spawn(async move {
        debug!("Loading {} for the overlay", source);
        let message = match load_page(&client, &source).await {
            Ok(page) => UiMessage::PageLoaded(page),
            Err(e) => UiMessage::ScanFailed {
                source: source.to_string(),
                reason: e.to_string(),
            },
        };
        // The receiver is gone once the UI has quit
        let _ = tx.send(message);
    });
}

pub fn spawn_downloads(
    handle: &Handle,
    fetcher: Arc<HttpFetcher>,
    dir: PathBuf,
    items: Vec<MediaReference>,
    threads: usize,
    tx: UnboundedSender<UiMessage>,
) {
    handle.spawn(async move {
        let saver = DirectorySaver::new(dir);
        let options = DownloadOptions {
            threads,
            show_progress_bars: false,
        };

        let per_item = tx.clone();
        let on_outcome: DownloadOutcomeCallback = Arc::new(move |outcome: &SaveOutcome| {
            let _ = per_item.send(UiMessage::Downloaded(outcome.clone()));
        });

        let outcomes =
            execute_downloads(fetcher.as_ref(), &saver, &items, options, Some(on_outcome)).await;

        let saved = outcomes.iter().filter(|o| o.is_saved()).count();
        let failed = outcomes.len() - saved;
        let _ = tx.send(UiMessage::DownloadsFinished { saved, failed });
    });
}
