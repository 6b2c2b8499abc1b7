use crate::CLAP_STYLING;
use clap::{ArgAction, ArgGroup, arg, command};
use std::path::PathBuf;
use url::Url;

/// The page source flags shared by `scan` and `download`
fn with_source_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(
        arg!(-u --"url" <URL>)
            .required(false)
            .help("The page to look at")
            .value_parser(clap::value_parser!(Url)),
    )
    .arg(
        arg!(-H --"hosts-file" <PATH>)
            .required(false)
            .help("Path to a newline-delimited file of pages (URLs or saved HTML files)")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(-i --"input" <HTML_FILE>)
            .required(false)
            .help("A saved HTML page to read instead of fetching one")
            .value_parser(clap::value_parser!(PathBuf)),
    )
    .arg(
        arg!(--"base-url" <URL>)
            .required(false)
            .help("Resolve relative media URLs in --input against this URL")
            .value_parser(clap::value_parser!(Url))
            .requires("input")
            .conflicts_with_all(["url", "hosts-file"]),
    )
    .group(
        ArgGroup::new("source")
            .args(["url", "hosts-file", "input"])
            .required(true),
    )
    .arg(
        arg!(-k --"kinds" <KINDS>)
            .required(false)
            .help("Only these kinds, comma separated: image, video, audio, embed")
            .value_delimiter(',')
            .action(ArgAction::Append),
    )
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("yoink")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("yoink")
        .about("Find the images, video, audio and embeds on a page, and grab them")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "More log output (repeat for more)")
                .required(false)
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            with_source_args(
                command!("scan").about("List the media on one or more pages"),
            )
            .arg(
                arg!(-f --"format" <FORMAT>)
                    .required(false)
                    .help("Report format: text, json, markdown, csv")
                    .value_parser(["text", "json", "markdown", "md", "csv"])
                    .default_value("text"),
            )
            .arg(
                arg!(-o --"output" <PATH>)
                    .required(false)
                    .help("Save report to file (default: print to stdout)"),
            ),
        )
        .subcommand(
            with_source_args(
                command!("download").about("Download the media on one or more pages"),
            )
            .arg(
                arg!(-d --"dir" <DIR>)
                    .required(false)
                    .help("Directory to save into; existing files are never overwritten")
                    .default_value("."),
            )
            .arg(
                arg!(-t --"threads" <NUM_WORKERS>)
                    .required(false)
                    .help("How many downloads may run at once")
                    .value_parser(clap::value_parser!(usize))
                    .default_value("4"),
            )
            .arg(
                arg!(--"timeout" <SECONDS>)
                    .required(false)
                    .help("Per-request timeout in seconds (default: none)")
                    .value_parser(clap::value_parser!(u64)),
            )
            .arg(
                arg!(-n --"index" <INDEX>)
                    .required(false)
                    .help("Only download item INDEX as numbered by `scan` (repeatable)")
                    .value_parser(clap::value_parser!(usize))
                    .action(ArgAction::Append),
            ),
        )
        .subcommand(command!("ui").about("Interactive terminal REPL with a media overlay"))
}
