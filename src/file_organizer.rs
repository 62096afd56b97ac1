/// Relocation of source entries into their destination directories.
///
/// This module walks the source directory once, top-down, and decides for
/// every entry whether it stays, is skipped together with its subtree, goes
/// to a category directory or goes to the catch-all directory. Directories
/// are relocated wholesale by recursive copy followed by removal of the
/// original, so the catch-all may live on another volume.
use crate::config::Settings;
use crate::file_category::{Category, RuleMatch, classify};
use std::collections::{BTreeMap, HashSet};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Marker inserted into a name that is already taken at the destination.
pub const COPY_MARKER: &str = " - copy";

/// Errors that abort a relocation run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory is missing or is not a directory.
    #[error("invalid source directory {}: {}", .path.display(), .source)]
    InvalidBasePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Enumerating a directory failed.
    #[error("failed to read {}: {}", .path.display(), .source)]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    /// Failed to create a destination directory.
    #[error("failed to create directory {}: {}", .path.display(), .source)]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to rename an entry into place.
    #[error("failed to move {} to {}: {}", .from.display(), .to.display(), .source)]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to copy a file while relocating a directory.
    #[error("failed to copy {} to {}: {}", .from.display(), .to.display(), .source)]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to remove a directory after copying it.
    #[error("failed to remove {}: {}", .path.display(), .source)]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Both the original name and its " - copy" variant are taken.
    #[error("cannot move {}: {} already exists", .from.display(), .to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
    /// The entry path has no final name component.
    #[error("entry has no file name: {}", .path.display())]
    InvalidEntry { path: PathBuf },
}

/// Result type for relocation operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Where an entry was relocated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// A category's destination directory.
    Category(Category),
    /// The catch-all directory.
    Other,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Category(category) => write!(f, "{}", category),
            Target::Other => f.write_str("other"),
        }
    }
}

/// Whether a relocated entry was a file or a whole directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Moved with a single rename.
    File,
    /// Copied recursively, then removed from the source.
    Directory,
}

/// A single completed relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub target: Target,
    pub kind: EntryKind,
}

/// Everything a finished walk did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Relocations in the order they happened.
    pub moved: Vec<Operation>,
    /// Entries matching the script name.
    pub left_in_place: Vec<PathBuf>,
    /// Entries whose name is in the exclusion set.
    pub skipped: Vec<PathBuf>,
    /// Entries that disappeared before they could be relocated.
    pub vanished: Vec<PathBuf>,
}

impl RunReport {
    /// Number of relocated entries per destination name.
    pub fn counts_by_target(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.moved {
            *counts.entry(op.target.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// What the walk should do after an entry has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Continue,
    SkipSubtree,
}

/// Walks a source directory and relocates its entries.
pub struct Relocator<'a> {
    settings: &'a Settings,
    excluded: HashSet<OsString>,
}

impl<'a> Relocator<'a> {
    /// Prepares a relocator, deriving the exclusion set from `settings`.
    ///
    /// The set holds the configured literal names plus the last path segment
    /// of every category destination and of the catch-all destination.
    pub fn new(settings: &'a Settings) -> Self {
        let destination_names = settings
            .rules
            .iter()
            .map(|rule| rule.destination.as_path())
            .chain(std::iter::once(settings.other_dir.as_path()))
            .filter_map(Path::file_name)
            .map(OsStr::to_os_string);

        let excluded = settings
            .excluded_names
            .iter()
            .map(OsString::from)
            .chain(destination_names)
            .collect();

        Self { settings, excluded }
    }

    /// Returns true if an entry with this name is skipped along with its subtree.
    pub fn is_excluded(&self, name: &OsStr) -> bool {
        self.excluded.contains(name)
    }

    /// Runs the walk, calling `on_move` after each relocation.
    ///
    /// The first error aborts the walk. Entries already relocated stay where
    /// they were moved to.
    pub fn run<F>(&self, mut on_move: F) -> OrganizeResult<RunReport>
    where
        F: FnMut(&Operation),
    {
        let root = &self.settings.source_dir;
        let metadata = fs::metadata(root).map_err(|source| OrganizeError::InvalidBasePath {
            path: root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::InvalidBasePath {
                path: root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "source path is not a directory",
                ),
            });
        }

        tracing::info!(source = %root.display(), "starting walk");

        // Sorted listings are read in full before any entry is yielded, so
        // relocating entries never disturbs the enumeration.
        let mut walker = WalkDir::new(root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();
        let mut report = RunReport::default();

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| traversal_error(root, e))?;
            if self.visit(&entry, &mut report, &mut on_move)? == Visit::SkipSubtree
                && entry.file_type().is_dir()
            {
                walker.skip_current_dir();
            }
        }

        tracing::info!(
            moved = report.moved.len(),
            skipped = report.skipped.len(),
            vanished = report.vanished.len(),
            "walk complete"
        );
        Ok(report)
    }

    fn visit<F>(
        &self,
        entry: &DirEntry,
        report: &mut RunReport,
        on_move: &mut F,
    ) -> OrganizeResult<Visit>
    where
        F: FnMut(&Operation),
    {
        let name = entry.file_name();
        let path = entry.path();
        let is_dir = entry.file_type().is_dir();

        if name == OsStr::new(&self.settings.script_name) {
            tracing::debug!(path = %path.display(), "leaving script in place");
            report.left_in_place.push(path.to_path_buf());
            return Ok(if is_dir { Visit::SkipSubtree } else { Visit::Continue });
        }

        if self.is_excluded(name) {
            tracing::debug!(path = %path.display(), "skipping excluded entry");
            report.skipped.push(path.to_path_buf());
            return Ok(Visit::SkipSubtree);
        }

        let moved = if is_dir {
            self.move_to_other(path, EntryKind::Directory)?
        } else {
            match classify(&name.to_string_lossy(), &self.settings.rules) {
                Some(found) => Some(self.move_to_category(path, found)?),
                None => self.move_to_other(path, EntryKind::File)?,
            }
        };

        match moved {
            Some(operation) => {
                on_move(&operation);
                report.moved.push(operation);
            }
            None => report.vanished.push(path.to_path_buf()),
        }

        Ok(if is_dir { Visit::SkipSubtree } else { Visit::Continue })
    }

    /// Renames a classified file into its category directory.
    ///
    /// A name clash gets the copy marker inserted before the matched extension.
    pub fn move_to_category(&self, path: &Path, found: RuleMatch<'_>) -> OrganizeResult<Operation> {
        let category_dir = &found.rule.destination;
        ensure_dir(category_dir)?;

        let file_name = file_name_of(path)?;
        let mut destination = category_dir.join(file_name);
        if path_taken(&destination) {
            let renamed = copy_name_for_extension(&file_name.to_string_lossy(), found.extension);
            destination = category_dir.join(renamed);
            if path_taken(&destination) {
                return Err(OrganizeError::DestinationExists {
                    from: path.to_path_buf(),
                    to: destination,
                });
            }
        }

        rename(path, &destination)?;
        tracing::info!(
            category = %found.rule.category,
            from = %path.display(),
            to = %destination.display(),
            "file moved"
        );

        Ok(Operation {
            source: path.to_path_buf(),
            destination,
            target: Target::Category(found.rule.category),
            kind: EntryKind::File,
        })
    }

    /// Relocates an entry into the catch-all directory.
    ///
    /// Returns `Ok(None)` if the entry no longer exists. A clashing file name
    /// gets the copy marker before its literal extension, a clashing directory
    /// name gets it appended.
    pub fn move_to_other(&self, path: &Path, kind: EntryKind) -> OrganizeResult<Option<Operation>> {
        if !path_taken(path) {
            tracing::warn!(path = %path.display(), "entry no longer exists");
            return Ok(None);
        }

        let other_dir = &self.settings.other_dir;
        ensure_dir(other_dir)?;

        let file_name = file_name_of(path)?;
        let mut destination = other_dir.join(file_name);
        if path_taken(&destination) {
            let name = file_name.to_string_lossy();
            let renamed = match kind {
                EntryKind::Directory => copy_dir_name(&name),
                EntryKind::File => copy_name_for_extension(&name, literal_extension(&name)),
            };
            destination = other_dir.join(renamed);
            if path_taken(&destination) {
                return Err(OrganizeError::DestinationExists {
                    from: path.to_path_buf(),
                    to: destination,
                });
            }
        }

        match kind {
            EntryKind::Directory => {
                copy_dir(path, &destination)?;
                fs::remove_dir_all(path).map_err(|source| OrganizeError::RemoveFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::info!(from = %path.display(), to = %destination.display(), "directory moved");
            }
            EntryKind::File => {
                rename(path, &destination)?;
                tracing::info!(from = %path.display(), to = %destination.display(), "file moved");
            }
        }

        Ok(Some(Operation {
            source: path.to_path_buf(),
            destination,
            target: Target::Other,
            kind,
        }))
    }
}

/// Inserts the copy marker before `extension`, which must be a suffix of `name`.
///
/// ```
/// use dirsweep::file_organizer::copy_name_for_extension;
///
/// assert_eq!(copy_name_for_extension("a.txt", ".txt"), "a - copy.txt");
/// assert_eq!(copy_name_for_extension("backup.tar.gz", ".gz"), "backup.tar - copy.gz");
/// ```
pub fn copy_name_for_extension(name: &str, extension: &str) -> String {
    let base = name.strip_suffix(extension).unwrap_or(name);
    format!("{}{}{}", base, COPY_MARKER, extension)
}

/// Everything from the last `.` of `name` onward, or `""` when there is none.
///
/// A leading dot counts, so `".bashrc"` is all extension.
pub fn literal_extension(name: &str) -> &str {
    name.rfind('.').map_or("", |idx| &name[idx..])
}

/// Appends the copy marker to a directory name.
pub fn copy_dir_name(name: &str) -> String {
    format!("{}{}", name, COPY_MARKER)
}

/// Recursively copies the tree at `src` into `dst`, creating `dst` if absent.
fn copy_dir(src: &Path, dst: &Path) -> OrganizeResult<()> {
    ensure_dir(dst)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| traversal_error(src, e))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|_| OrganizeError::InvalidEntry {
                path: entry.path().to_path_buf(),
            })?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|source| OrganizeError::CopyFailed {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> OrganizeResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|source| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn rename(from: &Path, to: &Path) -> OrganizeResult<()> {
    fs::rename(from, to).map_err(|source| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// True if anything, including a dangling symlink, occupies `path`.
fn path_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn file_name_of(path: &Path) -> OrganizeResult<&OsStr> {
    path.file_name().ok_or_else(|| OrganizeError::InvalidEntry {
        path: path.to_path_buf(),
    })
}

fn traversal_error(root: &Path, source: walkdir::Error) -> OrganizeError {
    OrganizeError::Traversal {
        path: source.path().unwrap_or(root).to_path_buf(),
        source,
    }
}
