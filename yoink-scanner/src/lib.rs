pub mod discovery;
pub mod error;
pub mod fetch;
pub mod filename;
pub mod media;

pub use discovery::{PageDocument, discover, discover_html};
pub use error::{Result, ScanError};
pub use fetch::{
    DirectorySaver, FetchedResource, HttpFetcher, ResourceFetcher, SaveOutcome, SaveTarget,
    fetch_and_save,
};
pub use filename::{derive_filename, extension_for_content_type, resolve_extension};
pub use media::{MediaCollection, MediaCounts, MediaKind, MediaReference};
