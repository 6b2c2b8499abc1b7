use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};
use yoink::commands::command_argument_builder;
use yoink::handlers::*;
use yoink_core::{PageMedia, PageSource};
use yoink_scanner::{HttpFetcher, MediaKind, MediaReference};

// ============================================================================
// Source Loading Tests
// ============================================================================

#[test]
fn test_load_sources_single_url() {
    let url = Url::parse("https://example.com/gallery").unwrap();
    let sources = load_sources(Some(&url), None, None, None).unwrap();
    assert_eq!(sources, vec![PageSource::Remote(url)]);
}

#[test]
fn test_load_sources_rejects_other_schemes() {
    let url = Url::parse("ftp://example.com/").unwrap();
    let err = load_sources(Some(&url), None, None, None).unwrap_err();
    assert!(err.contains("ftp"));
}

#[test]
fn test_load_sources_from_hosts_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "example.org")?;
    writeln!(temp_file)?;
    writeln!(temp_file, "# skipped")?;

    let path = PathBuf::from(temp_file.path());
    let sources = load_sources(None, Some(&path), None, None)?;

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].to_string(), "https://example.com/");
    assert_eq!(sources[1].to_string(), "http://example.org/");
    Ok(())
}

#[test]
fn test_load_sources_empty_hosts_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    assert!(load_sources(None, Some(&path), None, None).is_err());
}

#[test]
fn test_load_sources_input_with_base_url() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("page.html");
    std::fs::write(&file, "<img src=a.png>").unwrap();
    let base = Url::parse("https://example.com/").unwrap();

    let sources = load_sources(None, None, Some(&file), Some(&base)).unwrap();
    assert_eq!(
        sources,
        vec![PageSource::LocalFile {
            path: file,
            base_url: Some(base)
        }]
    );
}

#[test]
fn test_load_sources_base_url_without_input() {
    let url = Url::parse("https://example.com/").unwrap();
    let err = load_sources(Some(&url), None, None, Some(&url)).unwrap_err();
    assert!(err.contains("--base-url"));
}

#[test]
fn test_load_sources_missing_input() {
    let missing = PathBuf::from("/definitely/not/here.html");
    assert!(load_sources(None, None, Some(&missing), None).is_err());
}

#[test]
fn test_load_sources_nothing_given() {
    assert!(load_sources(None, None, None, None).is_err());
}

// ============================================================================
// Flag Parsing Tests
// ============================================================================

#[test]
fn test_parse_kinds() {
    let raw = vec!["images".to_string(), " video".to_string(), "iframe".to_string()];
    assert_eq!(
        parse_kinds(&raw).unwrap(),
        vec![MediaKind::Image, MediaKind::Video, MediaKind::Embed]
    );
    assert!(parse_kinds(&[]).unwrap().is_empty());
    assert!(parse_kinds(&["pdf".to_string()]).is_err());
}

#[test]
fn test_verbosity_filter() {
    assert_eq!(verbosity_filter(0), "warn");
    assert_eq!(verbosity_filter(1), "info");
    assert_eq!(verbosity_filter(2), "debug");
    assert_eq!(verbosity_filter(9), "trace");
}

#[test]
fn test_scan_requires_exactly_one_source() {
    let cmd = command_argument_builder();
    assert!(cmd.clone().try_get_matches_from(["yoink", "scan"]).is_err());
    assert!(
        cmd.clone()
            .try_get_matches_from([
                "yoink",
                "scan",
                "-u",
                "https://example.com",
                "-i",
                "page.html"
            ])
            .is_err()
    );
    assert!(
        cmd.try_get_matches_from(["yoink", "scan", "-u", "https://example.com"])
            .is_ok()
    );
}

#[test]
fn test_base_url_requires_input() {
    let result = command_argument_builder().try_get_matches_from([
        "yoink",
        "scan",
        "-u",
        "https://example.com",
        "--base-url",
        "https://example.com",
    ]);
    assert!(result.is_err());

    let with_hosts = command_argument_builder().try_get_matches_from([
        "yoink",
        "download",
        "-H",
        "pages.txt",
        "--base-url",
        "https://example.com",
    ]);
    assert!(with_hosts.is_err());

    let with_input = command_argument_builder().try_get_matches_from([
        "yoink",
        "scan",
        "-i",
        "page.html",
        "--base-url",
        "https://example.com",
    ]);
    assert!(with_input.is_ok());
}

#[test]
fn test_download_flags() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "yoink",
            "-vv",
            "download",
            "-u",
            "https://example.com",
            "-k",
            "image,audio",
            "-n",
            "2",
            "-n",
            "5",
            "--timeout",
            "30",
        ])
        .unwrap();
    assert_eq!(matches.get_count("verbose"), 2);

    let (name, sub) = matches.subcommand().unwrap();
    assert_eq!(name, "download");
    let kinds: Vec<&String> = sub.get_many::<String>("kinds").unwrap().collect();
    assert_eq!(kinds, vec!["image", "audio"]);
    let indexes: Vec<usize> = sub.get_many::<usize>("index").unwrap().copied().collect();
    assert_eq!(indexes, vec![2, 5]);
    assert_eq!(sub.get_one::<u64>("timeout"), Some(&30));
    assert_eq!(sub.get_one::<usize>("threads"), Some(&4));
    assert_eq!(sub.get_one::<String>("dir").map(String::as_str), Some("."));
}

// ============================================================================
// Selection Tests
// ============================================================================

fn two_pages() -> Vec<PageMedia> {
    let first = vec![
        MediaReference::new(MediaKind::Image, "https://a.example/1.png"),
        MediaReference::new(MediaKind::Video, "https://a.example/2.mp4"),
    ];
    let second = vec![MediaReference::new(MediaKind::Audio, "https://b.example/3.mp3")];
    vec![
        PageMedia {
            page_url: "https://a.example/".to_string(),
            collection: first.into_iter().collect(),
        },
        PageMedia {
            page_url: "https://b.example/".to_string(),
            collection: second.into_iter().collect(),
        },
    ]
}

#[test]
fn test_select_items_all() {
    let items = select_items(&two_pages(), &[]).unwrap();
    assert_eq!(items.len(), 3);
}

#[test]
fn test_select_items_by_number() {
    let items = select_items(&two_pages(), &[3, 1]).unwrap();
    assert_eq!(items[0].source_url, "https://b.example/3.mp3");
    assert_eq!(items[1].source_url, "https://a.example/1.png");
}

#[test]
fn test_select_items_out_of_range() {
    let err = select_items(&two_pages(), &[4]).unwrap_err();
    assert!(err.contains("No item 4"));
    assert!(select_items(&two_pages(), &[0]).is_err());
}

// ============================================================================
// End To End
// ============================================================================

#[tokio::test]
async fn test_scan_then_download() {
    let mock_server = MockServer::start().await;
    let page = r#"<html><body>
        <img src="/media/photo">
        <iframe src="/embed/player"></iframe>
        <audio src="/media/theme.mp3"></audio>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/photo"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/gif")
                .set_body_bytes(b"GIF89a".to_vec()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/theme.mp3"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"ID3".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let url = Url::parse(&format!("{}/post", mock_server.uri())).unwrap();
    let sources = load_sources(Some(&url), None, None, None).unwrap();

    let pages = scan_pages(&fetcher, sources, Vec::new(), false).await.unwrap();
    assert_eq!(pages[0].collection.len(), 3);

    let items = select_items(&pages, &[]).unwrap();
    let dir = TempDir::new().unwrap();
    let outcomes = download_items(&fetcher, dir.path(), &items, 2, false).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_saved()));
    assert_eq!(std::fs::read(dir.path().join("photo.gif")).unwrap(), b"GIF89a");
    assert!(dir.path().join("theme.mp3").exists());
}

#[tokio::test]
async fn test_scan_pages_fails_when_nothing_loads() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new().unwrap();
    let url = Url::parse(&format!("{}/down", mock_server.uri())).unwrap();
    let err = scan_pages(&fetcher, vec![PageSource::Remote(url)], Vec::new(), false)
        .await
        .unwrap_err();
    assert!(err.contains("could be loaded"));
}
