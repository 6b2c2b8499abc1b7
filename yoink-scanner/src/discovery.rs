use crate::error::{Result, ScanError};
use crate::media::{MediaCollection, MediaKind, MediaReference};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

/// A parsed page, read-only from discovery's point of view.
///
/// Relative sources resolve against the first `<base href>` when the page
/// declares one, otherwise against the page URL itself.
pub struct PageDocument {
    html: Html,
    base_url: Url,
}

impl PageDocument {
    pub fn parse(html: &str, page_url: &Url) -> Self {
        let html = Html::parse_document(html);

        let base_url = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "base")
            .find_map(|el| el.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .unwrap_or_else(|| page_url.clone());

        debug!("Parsed document, resolving sources against {}", base_url);

        Self { html, base_url }
    }

    /// All elements with the given local name, in document order
    fn elements_named(&self, tag: &'static str) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(move |el| el.value().name() == tag)
    }

    /// Turn a raw source attribute into an absolute URL.
    ///
    /// `Ok(None)` means the element is not eligible (absent, empty or inline
    /// data). `Err` means the attribute could not be resolved at all.
    fn read_source(&self, tag: &'static str, raw: Option<&str>) -> Result<Option<String>> {
        let Some(raw) = raw.map(str::trim) else {
            return Ok(None);
        };

        if raw.is_empty() || is_data_uri(raw) {
            return Ok(None);
        }

        let resolved = self.base_url.join(raw).map_err(|e| ScanError::DiscoveryRead {
            tag,
            reason: format!("cannot resolve '{}': {}", raw, e),
        })?;

        Ok(Some(resolved.to_string()))
    }

    /// Effective URL of a `<video>` or `<source>` element.
    ///
    /// A video plays its own `src` when it has one, otherwise the first child
    /// `<source>` with a `src`. That active source wins over the declared
    /// attribute; a standalone `<source>` only has the declared one.
    fn playback_source(&self, tag: &'static str, element: ElementRef<'_>) -> Result<Option<String>> {
        let declared = element.value().attr("src");

        let active = if tag == "video" {
            declared
                .filter(|src| !src.trim().is_empty())
                .or_else(|| first_child_source(element))
        } else {
            None
        };

        self.read_source(tag, active.or(declared))
    }
}

fn first_child_source<'a>(video: ElementRef<'a>) -> Option<&'a str> {
    video
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "source")
        .filter_map(|child| child.value().attr("src"))
        .find(|src| !src.trim().is_empty())
}

fn dimension(element: ElementRef<'_>, attr: &str) -> Option<u32> {
    element
        .value()
        .attr(attr)
        .and_then(|v| v.trim().parse::<u32>().ok())
}

/// True when the value uses the `data:` scheme. Only the scheme token is
/// compared case-insensitively.
pub fn is_data_uri(value: &str) -> bool {
    value
        .trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Scan a document for media.
///
/// Images come first, then the video and source elements merged and
/// deduplicated by effective URL, then audio, then iframes. Elements whose
/// source cannot be read are skipped.
pub fn discover(document: &PageDocument) -> MediaCollection {
    let mut collection = MediaCollection::new();

    for img in document.elements_named("img") {
        match document.read_source("img", img.value().attr("src")) {
            Ok(Some(url)) => {
                debug!("Found image: {}", url);
                collection.push(
                    MediaReference::new(MediaKind::Image, url)
                        .with_dimensions(dimension(img, "width"), dimension(img, "height")),
                );
            }
            Ok(None) => {}
            Err(e) => debug!("Skipping element: {}", e),
        }
    }

    // The seen-set only lives for this pass
    let mut seen: HashSet<String> = HashSet::new();
    let playable = document
        .elements_named("video")
        .map(|el| ("video", el))
        .chain(document.elements_named("source").map(|el| ("source", el)));

    for (tag, element) in playable {
        match document.playback_source(tag, element) {
            Ok(Some(url)) => {
                if !seen.insert(url.clone()) {
                    debug!("  -> Already listed, skipping {}", url);
                    continue;
                }
                debug!("Found video: {}", url);
                let mut item = MediaReference::new(MediaKind::Video, url);
                if tag == "video" {
                    item = item.with_dimensions(
                        dimension(element, "width"),
                        dimension(element, "height"),
                    );
                }
                collection.push(item);
            }
            Ok(None) => {}
            Err(e) => debug!("Skipping element: {}", e),
        }
    }

    collect_plain(document, "audio", MediaKind::Audio, &mut collection);
    collect_plain(document, "iframe", MediaKind::Embed, &mut collection);

    let counts = collection.counts();
    info!(
        "Discovery complete: {} images, {} videos, {} audio, {} embeds",
        counts.images, counts.videos, counts.audio, counts.embeds
    );

    collection
}

fn collect_plain(
    document: &PageDocument,
    tag: &'static str,
    kind: MediaKind,
    collection: &mut MediaCollection,
) {
    for element in document.elements_named(tag) {
        match document.read_source(tag, element.value().attr("src")) {
            Ok(Some(url)) => {
                debug!("Found {}: {}", kind, url);
                collection.push(MediaReference::new(kind, url));
            }
            Ok(None) => {}
            Err(e) => debug!("Skipping element: {}", e),
        }
    }
}

/// Parse `html` as the page at `page_url` and discover its media
pub fn discover_html(html: &str, page_url: &str) -> Result<MediaCollection> {
    let page_url = Url::parse(page_url)
        .map_err(|e| ScanError::InvalidUrl(format!("Invalid page URL '{}': {}", page_url, e)))?;
    let document = PageDocument::parse(html, &page_url);
    Ok(discover(&document))
}
