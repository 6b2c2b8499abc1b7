use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Could not read <{tag}> element: {reason}")]
    DiscoveryRead { tag: &'static str, reason: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Save failed: {0}")]
    SaveError(String),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;
