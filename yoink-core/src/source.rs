// Where pages come from: the network or a saved HTML file

use reqwest::Client;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;
use yoink_scanner::{Result, ScanError};

/// A page to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Remote(Url),
    LocalFile {
        path: PathBuf,
        /// Resolve relative sources against this instead of the file's own URL
        base_url: Option<Url>,
    },
}

impl PageSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        PageSource::LocalFile {
            path: path.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(self, base: Url) -> Self {
        match self {
            PageSource::LocalFile { path, .. } => PageSource::LocalFile {
                path,
                base_url: Some(base),
            },
            remote => remote,
        }
    }
}

impl fmt::Display for PageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSource::Remote(url) => write!(f, "{}", url),
            PageSource::LocalFile { path, .. } => write!(f, "{}", path.display()),
        }
    }
}

/// A fetched page, ready for discovery
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The URL the document lives at, after redirects
    pub page_url: Url,
    pub html: String,
}

/// Parse a single line as a page source.
///
/// Existing files win, then absolute URLs, then bare hosts with `http://`
/// prepended.
pub fn parse_source(line: &str) -> Option<PageSource> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if Path::new(line).is_file() {
        return Some(PageSource::local(line));
    }

    if let Ok(url) = Url::parse(line) {
        match url.scheme() {
            "http" | "https" => return Some(PageSource::Remote(url)),
            "file" => {
                return url.to_file_path().ok().map(PageSource::local);
            }
            _ => {}
        }
    }

    let with_scheme = format!("http://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some_and(|host| !host.contains(' '))
    {
        return Some(PageSource::Remote(url));
    }

    warn!("Skipping invalid source '{}'", line);
    None
}

/// Load a newline-delimited list of sources. Blank lines and `#` comments
/// are ignored.
pub fn load_sources_from_file(path: &Path) -> Result<Vec<PageSource>> {
    let content = fs::read_to_string(path)?;

    let sources: Vec<PageSource> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_source)
        .collect();

    if sources.is_empty() {
        return Err(ScanError::ParseError(format!(
            "No valid sources found in {}",
            path.display()
        )));
    }

    Ok(sources)
}

/// Fetch or read the page behind a source
pub async fn load_page(client: &Client, source: &PageSource) -> Result<LoadedPage> {
    match source {
        PageSource::Remote(url) => {
            debug!("Fetching page {}", url);
            let response = client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScanError::FetchFailure {
                    url: url.to_string(),
                    reason: format!("server responded with {}", status),
                });
            }

            let page_url = response.url().clone();
            let html = response.text().await?;
            Ok(LoadedPage { page_url, html })
        }
        PageSource::LocalFile { path, base_url } => {
            debug!("Reading page {}", path.display());
            let html = tokio::fs::read_to_string(path).await?;

            let page_url = match base_url {
                Some(base) => base.clone(),
                None => {
                    let absolute = tokio::fs::canonicalize(path).await?;
                    Url::from_file_path(&absolute).map_err(|_| {
                        ScanError::InvalidUrl(format!(
                            "Cannot express {} as a file URL",
                            absolute.display()
                        ))
                    })?
                }
            };

            Ok(LoadedPage { page_url, html })
        }
    }
}
