// Tests for report generation functionality

use tempfile::TempDir;
use yoink_core::PageMedia;
use yoink_core::report::{
    ReportFormat, describe_item, generate_csv_report, generate_json_report,
    generate_markdown_report, generate_report, generate_text_report, numbered_items, save_report,
    total_counts,
};
use yoink_scanner::{MediaCollection, MediaKind, MediaReference};

fn sample_pages() -> Vec<PageMedia> {
    let first: MediaCollection = vec![
        MediaReference::new(MediaKind::Image, "https://example.com/cat.png")
            .with_dimensions(Some(640), Some(480)),
        MediaReference::new(MediaKind::Image, "https://example.com/dog.jpg"),
        MediaReference::new(MediaKind::Video, "https://example.com/clip.mp4"),
        MediaReference::new(MediaKind::Embed, "https://player.example.net/embed/1"),
    ]
    .into_iter()
    .collect();

    let second: MediaCollection = vec![MediaReference::new(
        MediaKind::Audio,
        "https://example.org/song,live.mp3",
    )]
    .into_iter()
    .collect();

    vec![
        PageMedia {
            page_url: "https://example.com/".to_string(),
            collection: first,
        },
        PageMedia {
            page_url: "https://example.org/music".to_string(),
            collection: second,
        },
    ]
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv));
    assert_eq!(ReportFormat::from_str("markdown"), Some(ReportFormat::Markdown));
}

#[test]
fn test_report_format_from_str_md() {
    assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert_eq!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("Json"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("CSV"), Some(ReportFormat::Csv));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("invalid").is_none());
    assert!(ReportFormat::from_str("html").is_none());
}

// ============================================================================
// Summary Tests
// ============================================================================

#[test]
fn test_total_counts_across_pages() {
    let counts = total_counts(&sample_pages());
    assert_eq!(counts.images, 2);
    assert_eq!(counts.videos, 1);
    assert_eq!(counts.audio, 1);
    assert_eq!(counts.embeds, 1);
    assert_eq!(counts.total(), 5);
}

#[test]
fn test_numbering_runs_across_pages() {
    let pages = sample_pages();
    let numbered = numbered_items(&pages);
    assert_eq!(numbered.len(), 5);
    assert_eq!(numbered[0].0, 1);
    assert_eq!(numbered[4].0, 5);
    assert_eq!(numbered[4].1.kind, MediaKind::Audio);
}

#[test]
fn test_describe_item_shows_image_dimensions() {
    let image = MediaReference::new(MediaKind::Image, "https://example.com/a.png")
        .with_dimensions(Some(100), None);
    assert_eq!(describe_item(&image), "📷 Image 100×? https://example.com/a.png");

    let embed = MediaReference::new(MediaKind::Embed, "https://example.com/frame");
    assert_eq!(
        describe_item(&embed),
        "🔗 Embedded Content https://example.com/frame"
    );
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contents() {
    let report = generate_text_report(&sample_pages());

    assert!(report.contains("YOINKIT MEDIA REPORT"));
    assert!(report.contains("Pages:  2"));
    assert!(report.contains("📷 2 images  🎬 1 videos  🎵 1 audio  🔗 1 embeds  (5 total)"));
    assert!(report.contains("[1] 📷 Image 640×480 https://example.com/cat.png"));
    assert!(report.contains("[2] 📷 Image ?×? https://example.com/dog.jpg"));
    assert!(report.contains("[5] 🎵 Audio https://example.org/song,live.mp3"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_text_report_empty_page() {
    let pages = vec![PageMedia {
        page_url: "https://empty.example/".to_string(),
        collection: MediaCollection::new(),
    }];
    let report = generate_text_report(&pages);
    assert!(report.contains("(no media found)"));
    assert!(report.contains("(0 total)"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let report = generate_json_report(&sample_pages()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    let root = &value["report"];
    assert_eq!(root["metadata"]["generator"], "YoinkIt");
    assert_eq!(root["summary"]["total_pages"], 2);
    assert_eq!(root["summary"]["total_media"], 5);
    assert_eq!(root["summary"]["by_kind"]["images"], 2);

    let first = &root["pages"][0]["collection"][0];
    assert_eq!(first["kind"], "image");
    assert_eq!(first["source_url"], "https://example.com/cat.png");
    assert_eq!(first["intrinsic_width"], 640);

    // Unknown dimensions are left out
    let second = &root["pages"][0]["collection"][1];
    assert!(second.get("intrinsic_width").is_none());
}

// ============================================================================
// Markdown / CSV Report Tests
// ============================================================================

#[test]
fn test_markdown_report() {
    let report = generate_markdown_report(&sample_pages());
    assert!(report.starts_with("# YoinkIt Media Report"));
    assert!(report.contains("| 📷 Image | 2 |"));
    assert!(report.contains("| **Total** | **5** |"));
    assert!(report.contains("## https://example.com/"));
    assert!(report.contains("1. 📷 **Image** (640×480) <https://example.com/cat.png>"));
}

#[test]
fn test_csv_report() {
    let report = generate_csv_report(&sample_pages());
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines[0], "index,kind,url,width,height");
    assert_eq!(lines[1], "1,image,https://example.com/cat.png,640,480");
    assert_eq!(lines[2], "2,image,https://example.com/dog.jpg,,");
    assert_eq!(lines[5], "5,audio,\"https://example.org/song,live.mp3\",,");
    assert_eq!(lines.len(), 6);
}

#[test]
fn test_generate_report_dispatch() {
    let pages = sample_pages();
    let csv = generate_report(&pages, ReportFormat::Csv).unwrap();
    assert!(csv.starts_with("index,kind"));
    let text = generate_report(&pages, ReportFormat::Text).unwrap();
    assert!(text.contains("YOINKIT MEDIA REPORT"));
}

#[test]
fn test_save_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.md");
    save_report("# hello\n", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hello\n");
}
