use clap::Parser;
use dirsweep::cli::{Args, run_cli};
use dirsweep::logging::init_logging;
use dirsweep::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run_cli(&args) {
        Ok(_) => {
            OutputFormatter::success("SUCCESS");
            ExitCode::SUCCESS
        }
        Err(e) => {
            OutputFormatter::error(&format!("ERROR: {}", e));
            ExitCode::FAILURE
        }
    }
}
