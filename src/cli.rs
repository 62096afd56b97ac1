//! Command-line interface module for dirsweep.
//!
//! This module handles argument parsing, loading the run configuration and
//! driving the relocator with progress output.

use crate::config::{LoadOptions, Settings};
use crate::file_organizer::{RunReport, Relocator};
use crate::output::OutputFormatter;
use clap::Parser;
use std::path::PathBuf;

/// Sweep a directory into category folders by file extension.
///
/// Destinations are read from SOURCE_DIR, IMAGE_DIR, VIDEO_DIR, MUSIC_DIR,
/// DOCUMENTS_DIR, PRESENTATIONS_DIR, TABLES_DIR, TEXT_DIR, ARCHIVE_DIR,
/// EXE_DIR, OTHER_DIR and SCRIPT_NAME, from the environment or a `.env` file.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "dirsweep", version, about)]
pub struct Args {
    /// Env file to read instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// TOML file with extension and exclusion overrides (default: ./.dirsweep.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to sweep, overriding SOURCE_DIR
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Print debug logs, including every classification attempt
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the per-destination summary table
    #[arg(long)]
    pub no_summary: bool,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            env_file: self.env_file.clone(),
            config_file: self.config.clone(),
            source_override: self.source.clone(),
        }
    }
}

/// Loads settings from every configured source and runs a sweep.
///
/// ```no_run
/// use dirsweep::cli::{Args, run_cli};
///
/// match run_cli(&Args::default()) {
///     Ok(report) => println!("{} entries moved", report.moved.len()),
///     Err(e) => eprintln!("ERROR: {}", e),
/// }
/// ```
pub fn run_cli(args: &Args) -> Result<RunReport, String> {
    let settings = Settings::load(&args.load_options())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    run_with_settings(&settings, !args.no_summary)
}

/// Runs a sweep with already-resolved settings, printing one line per move.
pub fn run_with_settings(settings: &Settings, show_summary: bool) -> Result<RunReport, String> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        settings.source_dir.display()
    ));

    let spinner = OutputFormatter::create_spinner();
    let result = Relocator::new(settings).run(|operation| {
        spinner.suspend(|| OutputFormatter::moved(operation));
        if let Some(name) = operation.source.file_name() {
            spinner.set_message(name.to_string_lossy().into_owned());
        }
    });
    spinner.finish_and_clear();

    let report = result.map_err(|e| e.to_string())?;

    for path in &report.vanished {
        OutputFormatter::warning(&format!("Not exist: {}", path.display()));
    }

    if show_summary {
        OutputFormatter::summary_table(&report.counts_by_target(), report.moved.len());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = Args::try_parse_from([
            "dirsweep",
            "--env-file",
            "sweep.env",
            "--config",
            "rules.toml",
            "--source",
            "/tmp/in",
            "-v",
            "--no-summary",
        ])
        .unwrap();

        assert_eq!(args.env_file, Some(PathBuf::from("sweep.env")));
        assert_eq!(args.config, Some(PathBuf::from("rules.toml")));
        assert_eq!(args.source, Some(PathBuf::from("/tmp/in")));
        assert!(args.verbose);
        assert!(args.no_summary);
    }

    #[test]
    fn test_parse_defaults() {
        let args = Args::try_parse_from(["dirsweep"]).unwrap();
        assert!(args.env_file.is_none());
        assert!(args.source.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_load_options_carry_overrides() {
        let args = Args {
            source: Some(PathBuf::from("/tmp/in")),
            ..Default::default()
        };
        let options = args.load_options();
        assert_eq!(options.source_override, Some(PathBuf::from("/tmp/in")));
        assert!(options.config_file.is_none());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["dirsweep", "--dry-run"]).is_err());
    }
}
