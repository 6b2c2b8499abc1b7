use clap::ArgMatches;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;
use yoink_core::report::{ReportFormat, generate_report, numbered_items, save_report};
use yoink_core::{
    DownloadOptions, ExtractOptions, ExtractProgressCallback, PageMedia, PageSource,
    execute_downloads, execute_extract, generate_download_report, load_sources_from_file,
};
use yoink_scanner::{DirectorySaver, HttpFetcher, MediaKind, MediaReference, SaveOutcome};

/// Default filter directive for a given number of `-v` flags
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print an error and exit with status 1
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red().bold(), message);
    std::process::exit(1);
}

/// Work out which pages to look at from the source flags
pub fn load_sources(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
    input: Option<&PathBuf>,
    base_url: Option<&Url>,
) -> Result<Vec<PageSource>, String> {
    if base_url.is_some() && input.is_none() {
        return Err("--base-url only applies to --input".to_string());
    }

    if let Some(hosts_file_path) = hosts_file {
        load_sources_from_file(hosts_file_path).map_err(|e| e.to_string())
    } else if let Some(path) = input {
        if !path.is_file() {
            return Err(format!("{} is not a readable file", path.display()));
        }
        let source = PageSource::local(path);
        Ok(vec![match base_url {
            Some(base) => source.with_base_url(base.clone()),
            None => source,
        }])
    } else if let Some(url) = url {
        match url.scheme() {
            "http" | "https" => Ok(vec![PageSource::Remote(url.clone())]),
            other => Err(format!("Unsupported URL scheme '{}'", other)),
        }
    } else {
        Err("One of --url, --hosts-file or --input must be provided".to_string())
    }
}

/// Parse `-k` values; nothing given means every kind
pub fn parse_kinds(values: &[String]) -> Result<Vec<MediaKind>, String> {
    values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| MediaKind::from_str(s).ok_or_else(|| format!("Unknown media kind '{}'", s)))
        .collect()
}

/// Pick items by their 1-based report number. No indexes picks everything.
pub fn select_items(pages: &[PageMedia], indexes: &[usize]) -> Result<Vec<MediaReference>, String> {
    let numbered = numbered_items(pages);
    if indexes.is_empty() {
        return Ok(numbered.into_iter().map(|(_, item)| item.clone()).collect());
    }

    indexes
        .iter()
        .map(|&index| {
            numbered
                .iter()
                .find(|(number, _)| *number == index)
                .map(|(_, item)| (*item).clone())
                .ok_or_else(|| {
                    format!("No item {} (found {} items)", index, numbered.len())
                })
        })
        .collect()
}

fn sources_from_matches(sub_matches: &ArgMatches) -> Vec<PageSource> {
    let sources = load_sources(
        sub_matches.get_one::<Url>("url"),
        sub_matches.get_one::<PathBuf>("hosts-file"),
        sub_matches.get_one::<PathBuf>("input"),
        sub_matches.get_one::<Url>("base-url"),
    );
    sources.unwrap_or_else(|e| fail(e))
}

fn kinds_from_matches(sub_matches: &ArgMatches) -> Vec<MediaKind> {
    let raw: Vec<String> = sub_matches
        .get_many::<String>("kinds")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    parse_kinds(&raw).unwrap_or_else(|e| fail(e))
}

/// Load and scan every source. Errors only when no page could be loaded.
pub async fn scan_pages(
    fetcher: &HttpFetcher,
    sources: Vec<PageSource>,
    kinds: Vec<MediaKind>,
    show_progress: bool,
) -> Result<Vec<PageMedia>, String> {
    let requested = sources.len();
    let options = ExtractOptions {
        sources,
        kinds,
        show_progress_bars: show_progress,
    };

    let progress_callback: ExtractProgressCallback = Arc::new(move |msg: String| {
        if show_progress {
            eprintln!("{}", msg);
        }
    });

    let pages = execute_extract(fetcher.client(), options, Some(progress_callback)).await;
    if pages.is_empty() {
        return Err(format!("None of the {} page(s) could be loaded", requested));
    }
    Ok(pages)
}

/// Download the chosen items into `dir`
pub async fn download_items(
    fetcher: &HttpFetcher,
    dir: &Path,
    items: &[MediaReference],
    threads: usize,
    show_progress: bool,
) -> Vec<SaveOutcome> {
    let saver = DirectorySaver::new(dir);
    let options = DownloadOptions {
        threads,
        show_progress_bars: show_progress,
    };
    execute_downloads(fetcher, &saver, items, options, None).await
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

pub async fn handle_scan(sub_matches: &ArgMatches) {
    let quiet = sub_matches.get_flag("quiet");
    let sources = sources_from_matches(sub_matches);
    let kinds = kinds_from_matches(sub_matches);

    let format_str = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_str)
        .unwrap_or_else(|| fail(format!("Unknown report format '{}'", format_str)));

    let fetcher = HttpFetcher::new().unwrap_or_else(|e| fail(e));
    if !quiet {
        eprintln!("{} Scanning {} page(s)\n", "→".blue(), sources.len());
    }

    let pages = scan_pages(&fetcher, sources, kinds, !quiet)
        .await
        .unwrap_or_else(|e| fail(e));

    let report = generate_report(&pages, format)
        .unwrap_or_else(|e| fail(format!("Could not build report: {}", e)));

    match sub_matches.get_one::<String>("output") {
        Some(raw) => {
            let path = expand_path(raw);
            if let Err(e) = save_report(&report, &path) {
                fail(format!("Failed to save report to {}: {}", path.display(), e));
            }
            if !quiet {
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => print!("{}", report),
    }
}

pub async fn handle_download(sub_matches: &ArgMatches) {
    let quiet = sub_matches.get_flag("quiet");
    let sources = sources_from_matches(sub_matches);
    let kinds = kinds_from_matches(sub_matches);
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&4);
    let timeout = sub_matches.get_one::<u64>("timeout").copied();
    let indexes: Vec<usize> = sub_matches
        .get_many::<usize>("index")
        .map(|values| values.copied().collect())
        .unwrap_or_default();
    let dir = expand_path(
        sub_matches
            .get_one::<String>("dir")
            .map(String::as_str)
            .unwrap_or("."),
    );

    let fetcher = HttpFetcher::with_timeout(timeout).unwrap_or_else(|e| fail(e));

    let pages = scan_pages(&fetcher, sources, kinds, !quiet)
        .await
        .unwrap_or_else(|e| fail(e));
    let items = select_items(&pages, &indexes).unwrap_or_else(|e| fail(e));
    debug!("Selected {} of the discovered items", items.len());

    let embeds = items.iter().filter(|i| !i.kind.is_downloadable()).count();
    if !quiet {
        eprintln!(
            "\n{} Downloading {} item(s) to {} with {} workers",
            "→".blue(),
            items.len() - embeds,
            dir.display().to_string().bright_white(),
            threads
        );
        if embeds > 0 {
            eprintln!(
                "{} Skipping {} embedded item(s)",
                "ℹ".blue(),
                embeds
            );
        }
    }

    let outcomes = download_items(&fetcher, &dir, &items, threads, !quiet).await;
    print!("{}", generate_download_report(&outcomes));

    if !outcomes.is_empty() && outcomes.iter().all(|o| !o.is_saved()) {
        fail("Every download failed");
    }
}

pub async fn handle_ui() {
    let runtime = tokio::runtime::Handle::current();
    match tokio::task::spawn_blocking(move || yoink_tui::run(runtime)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => fail(format!("Error running TUI: {}", e)),
        Err(e) => fail(format!("TUI task failed: {}", e)),
    }
}
