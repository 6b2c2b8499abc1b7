use crate::error::{Result, ScanError};
use crate::filename::{content_type_essence, derive_filename};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

pub const USER_AGENT: &str = concat!("YoinkIt/", env!("CARGO_PKG_VERSION"));

/// Give up looking for a free `name (n).ext` after this many tries
const MAX_NAME_ATTEMPTS: usize = 1000;

/// A fully buffered response body
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: String,
    /// Lowercase essence of the `Content-Type` header, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Retrieves the bytes behind a URL
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedResource>;
}

/// Somewhere a fetched payload can be written under a filename
#[async_trait]
pub trait SaveTarget: Send + Sync {
    /// Returns the path the payload ended up at
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// A fetcher without any request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout_secs: Option<u64>) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedResource> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::FetchFailure {
                url: url.to_string(),
                reason: format!("server responded with {}", status),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(content_type_essence);

        let bytes = response.bytes().await?.to_vec();
        debug!("Fetched {} bytes from {} ({:?})", bytes.len(), url, content_type);

        Ok(FetchedResource {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

/// Saves into a directory, never overwriting an existing file.
///
/// The payload is staged in a hidden temp file next to its destination and
/// then linked into place. A staged file that is not persisted is removed
/// when dropped.
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SaveTarget for DirectorySaver {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let dir = self.dir.clone();
        let filename = safe_file_name(filename);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || persist_staged(&dir, &filename, &bytes)).await?
    }
}

fn persist_staged(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut staged = tempfile::Builder::new()
        .prefix(".yoink-")
        .suffix(".part")
        .tempfile_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = dir.join(numbered_file_name(filename, attempt));
        match staged.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("  -> {} exists, trying next name", candidate.display());
                staged = e.file;
            }
            Err(e) => {
                return Err(ScanError::SaveError(format!(
                    "cannot write {}: {}",
                    candidate.display(),
                    e.error
                )));
            }
        }
    }

    Err(ScanError::SaveError(format!(
        "no free name for {} in {}",
        filename,
        dir.display()
    )))
}

/// `photo.png`, `photo (1).png`, `photo (2).png`, ...
fn numbered_file_name(filename: &str, attempt: usize) -> String {
    if attempt == 0 {
        return filename.to_string();
    }

    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, attempt, ext),
        _ => format!("{} ({})", filename, attempt),
    }
}

/// Keep the name inside the target directory
fn safe_file_name(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "media".to_string(),
        name => name.to_string(),
    }
}

/// What became of one download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SaveOutcome {
    Saved {
        url: String,
        filename: String,
        path: PathBuf,
        bytes: usize,
    },
    Failed {
        url: String,
        reason: String,
    },
}

impl SaveOutcome {
    pub fn url(&self) -> &str {
        match self {
            SaveOutcome::Saved { url, .. } | SaveOutcome::Failed { url, .. } => url,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Fetch one resource and save it under a derived filename.
///
/// Failures are logged and reported as [`SaveOutcome::Failed`]; this never
/// returns an error to the caller. Each call is independent of any other.
pub async fn fetch_and_save<F, S>(
    fetcher: &F,
    target: &S,
    source_url: &str,
    fallback_extension: Option<&str>,
) -> SaveOutcome
where
    F: ResourceFetcher + ?Sized,
    S: SaveTarget + ?Sized,
{
    let attempt = async {
        let resource = fetcher.fetch(source_url).await?;
        let filename = derive_filename(
            source_url,
            resource.content_type.as_deref(),
            fallback_extension,
        );
        let path = target.save(&filename, &resource.bytes).await?;
        // The target may have renamed it
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or(filename);
        Ok::<_, ScanError>((filename, path, resource.bytes.len()))
    };

    match attempt.await {
        Ok((filename, path, bytes)) => {
            info!("Saved {} as {} ({} bytes)", source_url, path.display(), bytes);
            SaveOutcome::Saved {
                url: source_url.to_string(),
                filename,
                path,
                bytes,
            }
        }
        Err(e) => {
            error!("Failed to download {}: {}", source_url, e);
            SaveOutcome::Failed {
                url: source_url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
