//! The single result view.
//!
//! Whatever surface shows discovered media (the TUI popup, a one-shot
//! report) goes through an [`OverlayHost`], which keeps at most one view
//! alive at a time.

use crate::extract::discover_page;
use crate::source::LoadedPage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;
use yoink_scanner::MediaCollection;

/// Identifies the result view; there is never more than one carrying it
pub const OVERLAY_MARKER: &str = "media-extractor-overlay";

/// A presented discovery result
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub id: Uuid,
    pub marker: &'static str,
    pub page_url: String,
    pub opened_at: DateTime<Utc>,
    pub collection: MediaCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Opened,
    Closed,
}

#[derive(Debug, Default)]
pub struct OverlayHost {
    view: Option<ResultView>,
}

impl OverlayHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the view if one is showing, otherwise discover media on `page`
    /// and show it. Closing never runs discovery.
    pub fn toggle(&mut self, page: &LoadedPage) -> ToggleOutcome {
        if self.dismiss() {
            return ToggleOutcome::Closed;
        }

        let collection = discover_page(page);
        self.present(page.page_url.as_str(), collection);
        ToggleOutcome::Opened
    }

    /// Show a result, replacing any view already present
    pub fn present(&mut self, page_url: &str, collection: MediaCollection) -> &ResultView {
        if let Some(old) = self.view.take() {
            debug!("Replacing result view {}", old.id);
        }

        let view = ResultView {
            id: Uuid::new_v4(),
            marker: OVERLAY_MARKER,
            page_url: page_url.to_string(),
            opened_at: Utc::now(),
            collection,
        };
        info!(
            "Opened {} for {} ({} items)",
            OVERLAY_MARKER,
            view.page_url,
            view.collection.len()
        );

        self.view.insert(view)
    }

    /// Remove the view; returns whether there was one
    pub fn dismiss(&mut self) -> bool {
        match self.view.take() {
            Some(view) => {
                info!("Closed {} {}", OVERLAY_MARKER, view.id);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&ResultView> {
        self.view.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }

    /// Number of live views carrying [`OVERLAY_MARKER`]
    pub fn view_count(&self) -> usize {
        self.view
            .iter()
            .filter(|view| view.marker == OVERLAY_MARKER)
            .count()
    }
}
