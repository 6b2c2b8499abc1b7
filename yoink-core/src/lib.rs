pub mod download;
pub mod extract;
pub mod overlay;
pub mod report;
pub mod source;

use colored::Colorize;

pub use download::{
    DownloadOptions, DownloadOutcomeCallback, execute_downloads, generate_download_report,
};
pub use extract::{ExtractOptions, ExtractProgressCallback, PageMedia, execute_extract};
pub use overlay::{OVERLAY_MARKER, OverlayHost, ResultView, ToggleOutcome};
pub use report::{ReportFormat, generate_report, save_report};
pub use source::{LoadedPage, PageSource, load_page, load_sources_from_file, parse_source};

const BANNER: &str = r#"
 ██╗   ██╗ ██████╗ ██╗███╗   ██╗██╗  ██╗██╗████████╗
 ╚██╗ ██╔╝██╔═══██╗██║████╗  ██║██║ ██╔╝██║╚══██╔══╝
  ╚████╔╝ ██║   ██║██║██╔██╗ ██║█████╔╝ ██║   ██║
   ╚██╔╝  ██║   ██║██║██║╚██╗██║██╔═██╗ ██║   ██║
    ██║   ╚██████╔╝██║██║ ╚████║██║  ██╗██║   ██║
    ╚═╝    ╚═════╝ ╚═╝╚═╝  ╚═══╝╚═╝  ╚═╝╚═╝   ╚═╝"#;

pub fn banner_lines() -> Vec<&'static str> {
    BANNER.lines().filter(|line| !line.is_empty()).collect()
}

pub fn print_banner() {
    for line in banner_lines() {
        eprintln!("{}", line.bright_magenta());
    }
    eprintln!(
        "  {} {}\n",
        "find it, grab it".dimmed(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
