use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of element a media reference was discovered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    /// An `<iframe>`; listed but never downloaded
    Embed,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::Embed,
    ];

    /// Extension used when the fetched content type is not recognized
    pub fn fallback_extension(&self) -> Option<&'static str> {
        match self {
            MediaKind::Image => Some("jpg"),
            MediaKind::Video => Some("mp4"),
            MediaKind::Audio => Some("mp3"),
            MediaKind::Embed => None,
        }
    }

    pub fn is_downloadable(&self) -> bool {
        !matches!(self, MediaKind::Embed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
            MediaKind::Audio => "Audio",
            MediaKind::Embed => "Embedded Content",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MediaKind::Image => "📷",
            MediaKind::Video => "🎬",
            MediaKind::Audio => "🎵",
            MediaKind::Embed => "🔗",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "image" | "images" | "img" => Some(MediaKind::Image),
            "video" | "videos" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            "embed" | "embeds" | "iframe" | "iframes" => Some(MediaKind::Embed),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Embed => "embed",
        };
        f.write_str(name)
    }
}

/// A single media resource found on a page.
///
/// Identity is `source_url`. References are built once during discovery and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReference {
    pub kind: MediaKind,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intrinsic_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intrinsic_height: Option<u32>,
}

impl MediaReference {
    pub fn new(kind: MediaKind, source_url: impl Into<String>) -> Self {
        Self {
            kind,
            source_url: source_url.into(),
            intrinsic_width: None,
            intrinsic_height: None,
        }
    }

    pub fn with_dimensions(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.intrinsic_width = width;
        self.intrinsic_height = height;
        self
    }

    /// `640×480`, with `?` standing in for a missing side
    pub fn dimensions_label(&self) -> String {
        let side = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
        format!("{}×{}", side(self.intrinsic_width), side(self.intrinsic_height))
    }
}

/// Per-kind tally of a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCounts {
    pub images: usize,
    pub videos: usize,
    pub audio: usize,
    pub embeds: usize,
}

impl MediaCounts {
    pub fn total(&self) -> usize {
        self.images + self.videos + self.audio + self.embeds
    }

    pub fn get(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Image => self.images,
            MediaKind::Video => self.videos,
            MediaKind::Audio => self.audio,
            MediaKind::Embed => self.embeds,
        }
    }
}

/// Media references in document traversal order: images, then the
/// deduplicated video/source group, then audio, then embeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaCollection {
    items: Vec<MediaReference>,
}

impl MediaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, item: MediaReference) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaReference> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaReference> {
        self.items.iter()
    }

    pub fn of_kind(&self, kind: MediaKind) -> impl Iterator<Item = &MediaReference> {
        self.items.iter().filter(move |item| item.kind == kind)
    }

    pub fn counts(&self) -> MediaCounts {
        let mut counts = MediaCounts::default();
        for item in &self.items {
            match item.kind {
                MediaKind::Image => counts.images += 1,
                MediaKind::Video => counts.videos += 1,
                MediaKind::Audio => counts.audio += 1,
                MediaKind::Embed => counts.embeds += 1,
            }
        }
        counts
    }
}

impl FromIterator<MediaReference> for MediaCollection {
    fn from_iter<I: IntoIterator<Item = MediaReference>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MediaCollection {
    type Item = &'a MediaReference;
    type IntoIter = std::slice::Iter<'a, MediaReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for MediaCollection {
    type Item = MediaReference;
    type IntoIter = std::vec::IntoIter<MediaReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
