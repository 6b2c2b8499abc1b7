//! Download filename and extension derivation.

use url::Url;

/// Content type to extension, consulted before the per-kind fallback
pub const EXTENSION_MAP: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/jpg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/ogg", "ogv"),
    ("audio/mpeg", "mp3"),
    ("audio/ogg", "ogg"),
    ("audio/wav", "wav"),
    ("audio/webm", "webm"),
];

pub const DEFAULT_BASE_NAME: &str = "media";
pub const DEFAULT_EXTENSION: &str = "bin";
pub const MAX_FILENAME_CHARS: usize = 50;
pub const TRUNCATED_CHARS: usize = 46;

/// Exact, case-sensitive lookup in [`EXTENSION_MAP`]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    EXTENSION_MAP
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
}

/// Content type mapping first, then the caller's fallback, then `bin`
pub fn resolve_extension<'a>(content_type: Option<&str>, fallback: Option<&'a str>) -> &'a str {
    match content_type.and_then(extension_for_content_type) {
        Some(extension) => extension,
        None => fallback.unwrap_or(DEFAULT_EXTENSION),
    }
}

/// Reduce a `Content-Type` header to its lowercase essence, e.g.
/// `Image/PNG; charset=binary` becomes `image/png`.
pub fn content_type_essence(header: &str) -> Option<String> {
    let essence = header.split(';').next().unwrap_or_default().trim();
    if essence.is_empty() {
        None
    } else {
        Some(essence.to_ascii_lowercase())
    }
}

/// Last path segment of the URL without query or fragment, or `media` when
/// that segment is empty.
pub fn base_name(requested_url: &str) -> String {
    let segment = match Url::parse(requested_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => {
            let without_fragment = requested_url.split('#').next().unwrap_or_default();
            let without_query = without_fragment.split('?').next().unwrap_or_default();
            without_query.rsplit('/').next().unwrap_or_default().to_string()
        }
    };

    if segment.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        segment
    }
}

/// Build the filename a downloaded resource is saved under.
///
/// The resolved extension is appended unless the base name already ends with
/// it (ignoring case). Names longer than [`MAX_FILENAME_CHARS`] keep their
/// first [`TRUNCATED_CHARS`] characters and get the extension re-appended.
pub fn derive_filename(
    requested_url: &str,
    content_type: Option<&str>,
    fallback_extension: Option<&str>,
) -> String {
    let extension = resolve_extension(content_type, fallback_extension);
    let mut filename = base_name(requested_url);

    let suffix = format!(".{}", extension.to_lowercase());
    if !filename.to_lowercase().ends_with(&suffix) {
        filename = format!("{}.{}", filename, extension);
    }

    if filename.chars().count() > MAX_FILENAME_CHARS {
        let head: String = filename.chars().take(TRUNCATED_CHARS).collect();
        filename = format!("{}.{}", head, extension);
    }

    filename
}
