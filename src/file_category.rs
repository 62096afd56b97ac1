/// File categorization by filename suffix.
///
/// This module maps a filename to at most one category by testing it against
/// each category's extension table in a fixed order. Matching is a plain
/// case-sensitive suffix test on the whole name, so `"notxml"` matches `"xml"`
/// just as `"report.xml"` would.
///
/// # Examples
///
/// ```
/// use dirsweep::file_category::{Category, CategoryRule, classify};
///
/// let rules = vec![
///     CategoryRule::with_defaults(Category::Image, "/srv/images"),
///     CategoryRule::with_defaults(Category::Text, "/srv/text"),
/// ];
/// let found = classify("notes.txt", &rules).unwrap();
/// assert_eq!(found.rule.category, Category::Text);
/// assert_eq!(found.extension, ".txt");
/// assert!(classify("weird.xyz", &rules).is_none());
/// ```
use std::fmt;
use std::path::PathBuf;

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".png", ".svg", ".jpeg", ".gif", ".tiff", ".tif", ".ico", ".cur", ".bmp", ".raw",
    ".jfif", ".pjpeg", ".pjp",
];
const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".webm", ".flv", ".vob", ".ogg", ".ogv", ".drc", ".avi", ".mng", ".mov", ".qt",
    ".wmv", ".m4p", ".m4v", ".mpg", ".mpeg", ".mp2", ".m2v",
];
const MUSIC_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".mid", ".midi"];
const DOCUMENTS_EXTENSIONS: &[&str] = &[".docx", ".doc", ".pdf"];
const PRESENTATIONS_EXTENSIONS: &[&str] = &[".ppt", ".pptx"];
const TABLES_EXTENSIONS: &[&str] = &[".xls", ".xlsx", ".csv"];
const TEXT_EXTENSIONS: &[&str] = &[".txt", ".TXT"];
const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".rar", ".7z", ".gz"];
const EXECUTABLE_EXTENSIONS: &[&str] = &[".exe", ".msi"];

/// A classification bucket with its own destination directory.
///
/// The declaration order is the classification order: when two tables share
/// an extension, the category listed first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Image,
    Video,
    Music,
    Documents,
    Presentations,
    Tables,
    Text,
    Archive,
    Executable,
}

impl Category {
    /// Every category, in classification order.
    pub const ALL: [Category; 9] = [
        Category::Image,
        Category::Video,
        Category::Music,
        Category::Documents,
        Category::Presentations,
        Category::Tables,
        Category::Text,
        Category::Archive,
        Category::Executable,
    ];

    /// Environment variable naming this category's destination directory.
    ///
    /// ```
    /// use dirsweep::file_category::Category;
    ///
    /// assert_eq!(Category::Music.env_key(), "MUSIC_DIR");
    /// assert_eq!(Category::Executable.env_key(), "EXE_DIR");
    /// ```
    pub fn env_key(&self) -> &'static str {
        match self {
            Category::Image => "IMAGE_DIR",
            Category::Video => "VIDEO_DIR",
            Category::Music => "MUSIC_DIR",
            Category::Documents => "DOCUMENTS_DIR",
            Category::Presentations => "PRESENTATIONS_DIR",
            Category::Tables => "TABLES_DIR",
            Category::Text => "TEXT_DIR",
            Category::Archive => "ARCHIVE_DIR",
            Category::Executable => "EXE_DIR",
        }
    }

    /// Key used for this category in the `[extensions]` table of the config file.
    pub fn config_key(&self) -> &'static str {
        match self {
            Category::Image => "image",
            Category::Video => "video",
            Category::Music => "music",
            Category::Documents => "documents",
            Category::Presentations => "presentations",
            Category::Tables => "tables",
            Category::Text => "text",
            Category::Archive => "archive",
            Category::Executable => "executable",
        }
    }

    /// Looks a category up by its config-file key.
    pub fn from_config_key(key: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.config_key() == key)
    }

    /// Built-in extension table for this category.
    pub fn default_extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Image => IMAGE_EXTENSIONS,
            Category::Video => VIDEO_EXTENSIONS,
            Category::Music => MUSIC_EXTENSIONS,
            Category::Documents => DOCUMENTS_EXTENSIONS,
            Category::Presentations => PRESENTATIONS_EXTENSIONS,
            Category::Tables => TABLES_EXTENSIONS,
            Category::Text => TEXT_EXTENSIONS,
            Category::Archive => ARCHIVE_EXTENSIONS,
            Category::Executable => EXECUTABLE_EXTENSIONS,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// One category's destination and the suffixes that route files to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,
    pub destination: PathBuf,
    pub extensions: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: Category, destination: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            category,
            destination: destination.into(),
            extensions,
        }
    }

    /// Creates a rule using the category's built-in extension table.
    pub fn with_defaults(category: Category, destination: impl Into<PathBuf>) -> Self {
        let extensions = category
            .default_extensions()
            .iter()
            .map(|ext| ext.to_string())
            .collect();
        Self::new(category, destination, extensions)
    }

    /// Returns the first extension of this rule that `file_name` ends with.
    pub fn matching_extension(&self, file_name: &str) -> Option<&str> {
        self.extensions
            .iter()
            .map(String::as_str)
            .find(|ext| !ext.is_empty() && file_name.ends_with(ext))
    }
}

/// The rule a filename was routed to, plus the suffix that selected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch<'r> {
    pub rule: &'r CategoryRule,
    pub extension: &'r str,
}

/// Finds the first rule, in slice order, with an extension `file_name` ends with.
pub fn classify<'r>(file_name: &str, rules: &'r [CategoryRule]) -> Option<RuleMatch<'r>> {
    rules.iter().find_map(|rule| {
        tracing::debug!(
            category = %rule.category,
            "searching files with {:?}",
            rule.extensions
        );
        rule.matching_extension(file_name)
            .map(|extension| RuleMatch { rule, extension })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> Vec<CategoryRule> {
        Category::ALL
            .into_iter()
            .map(|c| CategoryRule::with_defaults(c, format!("/dest/{}", c.config_key())))
            .collect()
    }

    #[test]
    fn test_classify_each_category() {
        let rules = default_rules();
        let cases = [
            ("photo.jpg", Category::Image),
            ("clip.mp4", Category::Video),
            ("song.mp3", Category::Music),
            ("paper.pdf", Category::Documents),
            ("deck.pptx", Category::Presentations),
            ("sheet.csv", Category::Tables),
            ("notes.txt", Category::Text),
            ("NOTES.TXT", Category::Text),
            ("backup.7z", Category::Archive),
            ("setup.msi", Category::Executable),
        ];
        for (name, expected) in cases {
            let found = classify(name, &rules).unwrap_or_else(|| panic!("{name} unmatched"));
            assert_eq!(found.rule.category, expected, "{name}");
        }
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        let rules = default_rules();
        assert!(classify("PHOTO.JPG", &rules).is_none());
        assert!(classify("notes.Txt", &rules).is_none());
    }

    #[test]
    fn test_classify_unmatched_and_extensionless() {
        let rules = default_rules();
        assert!(classify("weird.xyz", &rules).is_none());
        assert!(classify("Makefile", &rules).is_none());
    }

    #[test]
    fn test_classify_is_plain_suffix_match() {
        let rules = vec![CategoryRule::new(
            Category::Text,
            "/dest/text",
            vec![".xml".to_string(), "txt".to_string()],
        )];
        // No dot boundary is required before the suffix.
        assert!(classify("notatxt", &rules).is_some());
        assert!(classify("tar.gz.xml", &rules).is_some());
    }

    #[test]
    fn test_classify_returns_matched_extension() {
        let rules = default_rules();
        // ".tiff" precedes ".tif" in the table, but only ".tif" is a suffix here.
        let found = classify("scan.tif", &rules).unwrap();
        assert_eq!(found.extension, ".tif");
        let found = classify("page.pjpeg", &rules).unwrap();
        assert_eq!(found.extension, ".pjpeg");
    }

    #[test]
    fn test_first_rule_wins_on_overlap() {
        let rules = vec![
            CategoryRule::new(Category::Video, "/v", vec![".ogg".to_string()]),
            CategoryRule::new(Category::Music, "/m", vec![".ogg".to_string()]),
        ];
        assert_eq!(classify("a.ogg", &rules).unwrap().rule.category, Category::Video);

        let reversed: Vec<_> = rules.into_iter().rev().collect();
        assert_eq!(classify("a.ogg", &reversed).unwrap().rule.category, Category::Music);
    }

    #[test]
    fn test_empty_extension_list_never_matches() {
        let rules = vec![CategoryRule::new(Category::Text, "/t", Vec::new())];
        assert!(classify("notes.txt", &rules).is_none());
    }

    #[test]
    fn test_empty_extension_never_matches() {
        let rules = vec![CategoryRule::new(Category::Text, "/t", vec![String::new()])];
        assert!(classify("anything", &rules).is_none());
    }

    #[test]
    fn test_config_key_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_config_key(category.config_key()), Some(category));
        }
        assert_eq!(Category::from_config_key("fonts"), None);
    }
}
