// Concurrent fetch & save of discovered media

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, info};
use yoink_scanner::{MediaReference, ResourceFetcher, SaveOutcome, SaveTarget, fetch_and_save};

/// Options for configuring a download run
pub struct DownloadOptions {
    /// How many downloads may be in flight at once
    pub threads: usize,
    pub show_progress_bars: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            threads: 4,
            show_progress_bars: false,
        }
    }
}

/// Callback invoked as each download finishes
pub type DownloadOutcomeCallback = Arc<dyn Fn(&SaveOutcome) + Send + Sync>;

/// Download every downloadable item, at most `threads` at a time.
///
/// Outcomes come back in completion order, and `outcome_callback` sees each
/// one as soon as it is known. Embedded content is skipped. One failure never
/// stops the rest.
pub async fn execute_downloads<F, S>(
    fetcher: &F,
    target: &S,
    items: &[MediaReference],
    options: DownloadOptions,
    outcome_callback: Option<DownloadOutcomeCallback>,
) -> Vec<SaveOutcome>
where
    F: ResourceFetcher + ?Sized,
    S: SaveTarget + ?Sized,
{
    let downloadable: Vec<&MediaReference> = items
        .iter()
        .filter(|item| {
            if item.kind.is_downloadable() {
                true
            } else {
                debug!("Not downloading {} {}", item.kind, item.source_url);
                false
            }
        })
        .collect();

    let threads = options.threads.max(1);
    info!(
        "Downloading {} items with {} workers",
        downloadable.len(),
        threads
    );

    let pb = if options.show_progress_bars {
        let progress_bar = ProgressBar::new(downloadable.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Some(progress_bar)
    } else {
        None
    };

    let downloads: Vec<_> = downloadable
        .into_iter()
        .map(|item| {
            let pb = pb.clone();
            let callback = outcome_callback.clone();
            async move {
                let outcome = fetch_and_save(
                    fetcher,
                    target,
                    &item.source_url,
                    item.kind.fallback_extension(),
                )
                .await;
                if let Some(ref pb) = pb {
                    pb.inc(1);
                }
                if let Some(ref callback) = callback {
                    callback(&outcome);
                }
                outcome
            }
        })
        .collect();

    let outcomes: Vec<SaveOutcome> = stream::iter(downloads)
        .buffer_unordered(threads)
        .collect()
        .await;

    if let Some(ref pb) = pb {
        let saved = outcomes.iter().filter(|o| o.is_saved()).count();
        pb.finish_with_message(format!("{} saved", saved));
    }

    outcomes
}

/// Summarise a download run for the terminal
pub fn generate_download_report(outcomes: &[SaveOutcome]) -> String {
    let mut report = String::new();

    let saved: Vec<&SaveOutcome> = outcomes.iter().filter(|o| o.is_saved()).collect();
    let failed: Vec<&SaveOutcome> = outcomes.iter().filter(|o| !o.is_saved()).collect();

    report.push_str("\n═══════════════════════════════════════════════════════════════════════════════\n");
    report.push_str("                            DOWNLOAD RESULTS\n");
    report.push_str("═══════════════════════════════════════════════════════════════════════════════\n\n");

    report.push_str(&format!(
        "Saved: {}  Failed: {}\n\n",
        saved.len(),
        failed.len()
    ));

    if !saved.is_empty() {
        report.push_str(&format!("[+] Saved ({})\n", saved.len()));
        report.push_str("───────────────────────────────────────────────────────────────────────────────\n");
        for outcome in &saved {
            if let SaveOutcome::Saved { path, bytes, url, .. } = outcome {
                report.push_str(&format!("  {} ({} bytes)\n", path.display(), bytes));
                report.push_str(&format!("      from {}\n", url));
            }
        }
        report.push('\n');
    }

    if !failed.is_empty() {
        report.push_str(&format!("[!] Failed ({})\n", failed.len()));
        report.push_str("───────────────────────────────────────────────────────────────────────────────\n");
        for outcome in &failed {
            if let SaveOutcome::Failed { url, reason } = outcome {
                report.push_str(&format!("  {}\n      {}\n", url, reason));
            }
        }
        report.push('\n');
    }

    report.push_str("═══════════════════════════════════════════════════════════════════════════════\n");
    report.push_str("                            End of Report\n");
    report.push_str("═══════════════════════════════════════════════════════════════════════════════\n");

    report
}
