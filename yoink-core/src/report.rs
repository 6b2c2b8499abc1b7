// Report generation for extraction results

use crate::extract::PageMedia;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use yoink_scanner::{MediaCounts, MediaKind, MediaReference};

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
    Csv,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

/// Sum of the per-kind counts over every page
pub fn total_counts(pages: &[PageMedia]) -> MediaCounts {
    pages.iter().fold(MediaCounts::default(), |mut acc, page| {
        let counts = page.collection.counts();
        acc.images += counts.images;
        acc.videos += counts.videos;
        acc.audio += counts.audio;
        acc.embeds += counts.embeds;
        acc
    })
}

/// `📷 3 images  🎬 1 videos  🎵 0 audio  🔗 2 embeds  (6 total)`
pub fn stats_line(counts: &MediaCounts) -> String {
    format!(
        "{} {} images  {} {} videos  {} {} audio  {} {} embeds  ({} total)",
        MediaKind::Image.icon(),
        counts.images,
        MediaKind::Video.icon(),
        counts.videos,
        MediaKind::Audio.icon(),
        counts.audio,
        MediaKind::Embed.icon(),
        counts.embeds,
        counts.total()
    )
}

/// One display line for an item, without its number
pub fn describe_item(item: &MediaReference) -> String {
    match item.kind {
        MediaKind::Image => format!(
            "{} {} {} {}",
            item.kind.icon(),
            item.kind.label(),
            item.dimensions_label(),
            item.source_url
        ),
        _ => format!("{} {} {}", item.kind.icon(), item.kind.label(), item.source_url),
    }
}

/// Every item across all pages, numbered from 1 in report order
pub fn numbered_items(pages: &[PageMedia]) -> Vec<(usize, &MediaReference)> {
    pages
        .iter()
        .flat_map(|page| page.collection.iter())
        .enumerate()
        .map(|(idx, item)| (idx + 1, item))
        .collect()
}

pub fn generate_report(pages: &[PageMedia], format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(pages)),
        ReportFormat::Json => generate_json_report(pages),
        ReportFormat::Markdown => Ok(generate_markdown_report(pages)),
        ReportFormat::Csv => Ok(generate_csv_report(pages)),
    }
}

pub fn generate_text_report(pages: &[PageMedia]) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push_str("                            YOINKIT MEDIA REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');

    report.push_str(&format!("Pages:  {}\n", pages.len()));
    report.push_str(&format!("Found:  {}\n\n", stats_line(&total_counts(pages))));

    let mut number = 0;
    for page in pages {
        report.push_str(HEAVY_RULE);
        report.push_str(&format!("{}\n", page.page_url));
        report.push_str(&format!("{}\n", stats_line(&page.collection.counts())));
        report.push_str(LIGHT_RULE);

        if page.collection.is_empty() {
            report.push_str("  (no media found)\n");
        }

        for item in &page.collection {
            number += 1;
            report.push_str(&format!("[{}] {}\n", number, describe_item(item)));
        }
        report.push('\n');
    }

    report.push_str(HEAVY_RULE);
    report.push_str("                              End of Report\n");
    report.push_str(HEAVY_RULE);

    report
}

pub fn generate_json_report(pages: &[PageMedia]) -> Result<String, serde_json::Error> {
    let counts = total_counts(pages);
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "YoinkIt",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "total_pages": pages.len(),
                "total_media": counts.total(),
                "by_kind": counts
            },
            "pages": pages
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(pages: &[PageMedia]) -> String {
    let mut report = String::new();
    let counts = total_counts(pages);

    report.push_str("# YoinkIt Media Report\n\n");
    report.push_str("| Kind | Count |\n|------|-------|\n");
    for kind in MediaKind::ALL {
        report.push_str(&format!("| {} {} | {} |\n", kind.icon(), kind.label(), counts.get(kind)));
    }
    report.push_str(&format!("| **Total** | **{}** |\n\n", counts.total()));

    let mut number = 0;
    for page in pages {
        report.push_str(&format!("## {}\n\n", page.page_url));

        if page.collection.is_empty() {
            report.push_str("_No media found._\n\n");
            continue;
        }

        for item in &page.collection {
            number += 1;
            let dims = match item.kind {
                MediaKind::Image => format!(" ({})", item.dimensions_label()),
                _ => String::new(),
            };
            report.push_str(&format!(
                "{}. {} **{}**{} <{}>\n",
                number,
                item.kind.icon(),
                item.kind.label(),
                dims,
                item.source_url
            ));
        }
        report.push('\n');
    }

    report
}

/// `index,kind,url,width,height`, one row per item
pub fn generate_csv_report(pages: &[PageMedia]) -> String {
    let mut report = String::from("index,kind,url,width,height\n");

    for (number, item) in numbered_items(pages) {
        let side = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        report.push_str(&format!(
            "{},{},{},{},{}\n",
            number,
            item.kind,
            csv_field(&item.source_url),
            side(item.intrinsic_width),
            side(item.intrinsic_height)
        ));
    }

    report
}

/// Quote a field when it holds a comma, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
