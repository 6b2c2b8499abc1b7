use yoink::commands::command_argument_builder;
use yoink::handlers::{handle_download, handle_scan, handle_ui, init_tracing};
use yoink_core::print_banner;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    let quiet = chosen_command.get_flag("quiet");
    let verbosity = chosen_command.get_count("verbose");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("ui", _)) => handle_ui().await,
        Some(("scan", primary_command)) => {
            init_tracing(verbosity);
            handle_scan(primary_command).await;
        }
        Some(("download", primary_command)) => {
            init_tracing(verbosity);
            handle_download(primary_command).await;
        }
        // No subcommand, just the banner
        None => {}
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
