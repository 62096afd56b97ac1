//! dirsweep - sweep a cluttered directory into category folders
//!
//! This library classifies entries of a source directory by filename suffix,
//! moves matching files into per-category destination directories and parks
//! everything else, subdirectories included, in a catch-all directory.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod logging;
pub mod output;

pub use config::{ConfigError, FileConfig, LoadOptions, Settings};
pub use file_category::{Category, CategoryRule, RuleMatch, classify};
pub use file_organizer::{
    EntryKind, Operation, OrganizeError, OrganizeResult, Relocator, RunReport, Target,
};

pub use cli::{Args, run_cli};
