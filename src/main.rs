use gridpath::ISSUES_URL;
use gridpath::cli::run_cli;
use gridpath::log::is_logger_initialised;
use human_panic::{metadata, setup_panic};
use log::error;

fn main() {
    setup_panic!(metadata!().support(format!("Report the problem at: {ISSUES_URL}")));

    if let Err(err) = run_cli() {
        if is_logger_initialised() {
            error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        std::process::exit(1);
    }
}
