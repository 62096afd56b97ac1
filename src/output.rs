//! Output formatting and styling module.
//!
//! Every human-readable line the CLI prints goes through [`OutputFormatter`],
//! so colors and symbols are decided in one place.

use crate::file_organizer::{EntryKind, Operation};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints the line describing a finished relocation.
    ///
    /// ```no_run
    /// use dirsweep::file_organizer::{EntryKind, Operation, Target};
    /// use dirsweep::output::OutputFormatter;
    /// use std::path::PathBuf;
    ///
    /// OutputFormatter::moved(&Operation {
    ///     source: PathBuf::from("/in/clip.mp4"),
    ///     destination: PathBuf::from("/out/Video/clip.mp4"),
    ///     target: Target::Other,
    ///     kind: EntryKind::File,
    /// });
    /// ```
    pub fn moved(operation: &Operation) {
        let what = match operation.kind {
            EntryKind::File => "File",
            EntryKind::Directory => "Dir",
        };
        let name = operation
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dest_dir = operation
            .destination
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            " {} {} moved to {}: {}",
            "→".cyan(),
            what,
            dest_dir.bold(),
            name
        );
    }

    /// Creates a spinner shown while the walk runs.
    ///
    /// The spinner draws to stderr and stays hidden when that is not a terminal.
    pub fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Prints a summary table of relocated entries per destination.
    pub fn summary_table(counts: &BTreeMap<String, usize>, total: usize) {
        Self::header("SUMMARY");

        let max_name_len = counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(11); // "Destination"

        println!(
            "{:<width$} | {}",
            "Destination".bold(),
            "Entries".bold(),
            width = max_name_len
        );
        println!("{}", "-".repeat(max_name_len + 12));

        for (name, count) in counts {
            println!(
                "{:<width$} | {} {}",
                name,
                count.to_string().green(),
                Self::entry_word(*count),
                width = max_name_len
            );
        }

        println!("{}", "-".repeat(max_name_len + 12));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            Self::entry_word(total),
            width = max_name_len
        );
    }

    fn entry_word(count: usize) -> &'static str {
        if count == 1 { "entry" } else { "entries" }
    }
}
