use crate::source::{LoadedPage, PageSource, load_page};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use yoink_scanner::{MediaCollection, MediaKind, PageDocument, discover};

/// Options for configuring an extraction run
pub struct ExtractOptions {
    pub sources: Vec<PageSource>,
    /// Kinds to keep; empty keeps everything
    pub kinds: Vec<MediaKind>,
    pub show_progress_bars: bool,
}

/// The media found on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMedia {
    pub page_url: String,
    pub collection: MediaCollection,
}

/// Callback for reporting extraction progress
pub type ExtractProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Run discovery over a loaded page
pub fn discover_page(page: &LoadedPage) -> MediaCollection {
    let document = PageDocument::parse(&page.html, &page.page_url);
    discover(&document)
}

/// Keep only the requested kinds, preserving order
pub fn filter_kinds(collection: &MediaCollection, kinds: &[MediaKind]) -> MediaCollection {
    if kinds.is_empty() {
        return collection.clone();
    }

    collection
        .iter()
        .filter(|item| kinds.contains(&item.kind))
        .cloned()
        .collect()
}

/// Load every source in turn and discover its media.
///
/// A page that fails to load is reported and skipped; the others still run.
pub async fn execute_extract(
    client: &Client,
    options: ExtractOptions,
    progress_callback: Option<ExtractProgressCallback>,
) -> Vec<PageMedia> {
    let ExtractOptions {
        sources,
        kinds,
        show_progress_bars,
    } = options;

    let spinner = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting scan...");
        Some(pb)
    } else {
        None
    };

    let mut pages = Vec::new();
    for (idx, source) in sources.iter().enumerate() {
        if let Some(ref pb) = spinner {
            pb.set_message(format!("Scanning {}/{}: {}", idx + 1, sources.len(), source));
        }
        if let Some(ref callback) = progress_callback
            && sources.len() > 1
        {
            callback(format!("Scanning page {}/{}: {}", idx + 1, sources.len(), source));
        }

        let page = match load_page(client, source).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to load {}: {}", source, e);
                if let Some(ref callback) = progress_callback {
                    callback(format!("[!]  Failed to load {}: {}", source, e));
                }
                continue;
            }
        };

        let collection = filter_kinds(&discover_page(&page), &kinds);
        info!("{} media items on {}", collection.len(), page.page_url);

        pages.push(PageMedia {
            page_url: page.page_url.to_string(),
            collection,
        });
    }

    if let Some(ref pb) = spinner {
        let total: usize = pages.iter().map(|p| p.collection.len()).sum();
        pb.finish_with_message(format!(
            "Scan complete! {} items on {} page(s)",
            total,
            pages.len()
        ));
    }

    pages
}
