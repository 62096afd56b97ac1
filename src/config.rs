//! Run configuration.
//!
//! Destination paths, the source directory and the script name come from
//! environment variables, optionally seeded from a `.env` file. A TOML file
//! may additionally replace extension tables and the literal exclusion list.
//!
//! Precedence, highest first: process environment, `.env` file, TOML file.
//!
//! # Configuration File Format
//!
//! ```toml
//! exclude = ["Telegram Desktop"]
//!
//! [extensions]
//! text = [".txt", ".TXT", ".md"]
//! ```

use crate::file_category::{Category, CategoryRule};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SOURCE_DIR_KEY: &str = "SOURCE_DIR";
pub const OTHER_DIR_KEY: &str = "OTHER_DIR";
pub const SCRIPT_NAME_KEY: &str = "SCRIPT_NAME";

/// Env file read when none is given explicitly. Its absence is not an error.
pub const DEFAULT_ENV_FILE: &str = ".env";
/// Config file read when none is given explicitly. Its absence is not an error.
pub const DEFAULT_CONFIG_FILE: &str = ".dirsweep.toml";
/// Directory name skipped by default in addition to the destination names.
pub const DEFAULT_EXCLUDED_NAME: &str = "Telegram Desktop";

/// Errors that can occur while assembling a [`Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required values are absent or blank.
    #[error("missing required configuration values: {}", .0.join(", "))]
    MissingValues(Vec<&'static str>),
    /// The env file exists but could not be parsed, or was requested and is absent.
    #[error("failed to load env file {}: {}", .path.display(), .source)]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    /// An extension override does not start with the `.` delimiter.
    #[error("invalid extension {extension:?} for category {category}: extensions must start with '.'")]
    InvalidExtension {
        category: Category,
        extension: String,
    },
    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Optional settings read from the TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Literal names skipped as whole subtrees. Replaces the default list when present.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Per-category extension tables, keyed by category name (e.g. `text`).
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<String>>,
}

impl FileConfig {
    /// Loads the config file, falling back to defaults.
    ///
    /// An explicit `config_path` must exist. Without one, `.dirsweep.toml` in
    /// the current directory is used if present.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parses TOML text into a `FileConfig`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

/// Where to look for configuration sources.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Env file to read. Must exist when given.
    pub env_file: Option<PathBuf>,
    /// TOML file to read. Must exist when given.
    pub config_file: Option<PathBuf>,
    /// Replaces `SOURCE_DIR` from every other source.
    pub source_override: Option<PathBuf>,
}

/// Immutable snapshot of everything a run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_dir: PathBuf,
    pub other_dir: PathBuf,
    /// Entry name left untouched wherever it appears.
    pub script_name: String,
    /// Category rules in classification order.
    pub rules: Vec<CategoryRule>,
    /// Literal names skipped as subtrees, besides the destination names.
    pub excluded_names: Vec<String>,
}

impl Settings {
    /// Builds settings from explicit values with the default exclusion list.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        other_dir: impl Into<PathBuf>,
        script_name: impl Into<String>,
        rules: Vec<CategoryRule>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            other_dir: other_dir.into(),
            script_name: script_name.into(),
            rules,
            excluded_names: vec![DEFAULT_EXCLUDED_NAME.to_string()],
        }
    }

    /// Reads every configuration source and resolves them into settings.
    pub fn load(options: &LoadOptions) -> Result<Self, ConfigError> {
        let file_config = FileConfig::load(options.config_file.as_deref())?;

        let mut vars = read_env_file(options.env_file.as_deref())?;
        vars.extend(
            std::env::vars_os()
                .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?))),
        );
        if let Some(source) = &options.source_override {
            vars.insert(
                SOURCE_DIR_KEY.to_string(),
                source.to_string_lossy().into_owned(),
            );
        }

        Self::from_vars(&vars, file_config)
    }

    /// Resolves settings from a variable map and parsed config file.
    ///
    /// Every missing key is reported at once.
    pub fn from_vars(
        vars: &HashMap<String, String>,
        file_config: FileConfig,
    ) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |key: &'static str| -> Option<String> {
            let value = vars.get(key).filter(|v| !v.trim().is_empty()).cloned();
            if value.is_none() {
                missing.push(key);
            }
            value
        };

        let source_dir = require(SOURCE_DIR_KEY);
        let destinations: Vec<_> = Category::ALL
            .into_iter()
            .map(|category| (category, require(category.env_key())))
            .collect();
        let other_dir = require(OTHER_DIR_KEY);
        let script_name = require(SCRIPT_NAME_KEY);

        let (Some(source_dir), Some(other_dir), Some(script_name)) =
            (source_dir, other_dir, script_name)
        else {
            return Err(ConfigError::MissingValues(missing));
        };
        if !missing.is_empty() {
            return Err(ConfigError::MissingValues(missing));
        }

        let mut overrides = extension_overrides(file_config.extensions)?;
        let rules = destinations
            .into_iter()
            .filter_map(|(category, destination)| {
                let destination = destination?;
                Some(match overrides.remove(&category) {
                    Some(extensions) => CategoryRule::new(category, destination, extensions),
                    None => CategoryRule::with_defaults(category, destination),
                })
            })
            .collect();

        Ok(Self {
            source_dir: PathBuf::from(source_dir),
            other_dir: PathBuf::from(other_dir),
            script_name,
            rules,
            excluded_names: file_config
                .exclude
                .unwrap_or_else(|| vec![DEFAULT_EXCLUDED_NAME.to_string()]),
        })
    }
}

/// Reads `KEY=value` pairs from the env file without touching the process environment.
fn read_env_file(path: Option<&Path>) -> Result<HashMap<String, String>, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_ENV_FILE);
            if !default.exists() {
                tracing::debug!("no {} file found, using process environment only", DEFAULT_ENV_FILE);
                return Ok(HashMap::new());
            }
            default
        }
    };

    let env_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.clone(),
        source,
    };
    let iter = dotenvy::from_path_iter(&path).map_err(env_error)?;
    let vars = iter
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_error)?;
    tracing::debug!(path = %path.display(), count = vars.len(), "loaded env file");
    Ok(vars)
}

fn extension_overrides(
    tables: BTreeMap<String, Vec<String>>,
) -> Result<HashMap<Category, Vec<String>>, ConfigError> {
    tables
        .into_iter()
        .map(|(key, extensions)| {
            let category = Category::from_config_key(&key).ok_or_else(|| {
                ConfigError::ConfigInvalid(format!("unknown category '{}' in [extensions]", key))
            })?;
            if let Some(bad) = extensions.iter().find(|ext| !is_valid_extension(ext)) {
                return Err(ConfigError::InvalidExtension {
                    category,
                    extension: bad.clone(),
                });
            }
            Ok((category, extensions))
        })
        .collect()
}

fn is_valid_extension(ext: &str) -> bool {
    ext.len() > 1 && ext.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert(SOURCE_DIR_KEY.to_string(), "/home/me/Downloads".to_string());
        for category in Category::ALL {
            vars.insert(
                category.env_key().to_string(),
                format!("/home/me/Sorted/{}", category.config_key()),
            );
        }
        vars.insert(OTHER_DIR_KEY.to_string(), "/home/me/Sorted/other".to_string());
        vars.insert(SCRIPT_NAME_KEY.to_string(), "run.sh".to_string());
        vars
    }

    #[test]
    fn test_from_vars_builds_rules_in_category_order() {
        let settings = Settings::from_vars(&full_vars(), FileConfig::default()).unwrap();

        let order: Vec<_> = settings.rules.iter().map(|r| r.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(settings.source_dir, PathBuf::from("/home/me/Downloads"));
        assert_eq!(settings.other_dir, PathBuf::from("/home/me/Sorted/other"));
        assert_eq!(settings.script_name, "run.sh");
        assert_eq!(settings.excluded_names, vec![DEFAULT_EXCLUDED_NAME.to_string()]);
        assert_eq!(
            settings.rules[0].destination,
            PathBuf::from("/home/me/Sorted/image")
        );
    }

    #[test]
    fn test_missing_values_are_all_reported() {
        let mut vars = full_vars();
        vars.remove("VIDEO_DIR");
        vars.remove(SCRIPT_NAME_KEY);
        vars.insert(OTHER_DIR_KEY.to_string(), "   ".to_string());

        let err = Settings::from_vars(&vars, FileConfig::default()).unwrap_err();
        match err {
            ConfigError::MissingValues(keys) => {
                assert_eq!(keys, vec!["VIDEO_DIR", OTHER_DIR_KEY, SCRIPT_NAME_KEY]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_values_keep_surrounding_whitespace() {
        let mut vars = full_vars();
        vars.insert(SCRIPT_NAME_KEY.to_string(), " run.sh".to_string());

        let settings = Settings::from_vars(&vars, FileConfig::default()).unwrap();
        assert_eq!(settings.script_name, " run.sh");
    }

    #[test]
    fn test_missing_category_alone_is_fatal() {
        let mut vars = full_vars();
        vars.remove("EXE_DIR");

        let err = Settings::from_vars(&vars, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("EXE_DIR"));
    }

    #[test]
    fn test_extension_override_replaces_table() {
        let file_config = FileConfig::parse(
            r#"
            exclude = ["Keep Me"]

            [extensions]
            text = [".txt", ".md"]
            "#,
        )
        .unwrap();

        let settings = Settings::from_vars(&full_vars(), file_config).unwrap();
        let text = settings
            .rules
            .iter()
            .find(|r| r.category == Category::Text)
            .unwrap();
        assert_eq!(text.extensions, vec![".txt".to_string(), ".md".to_string()]);
        assert_eq!(settings.excluded_names, vec!["Keep Me".to_string()]);

        let image = &settings.rules[0];
        assert_eq!(image.extensions.len(), Category::Image.default_extensions().len());
    }

    #[test]
    fn test_extension_without_dot_is_rejected() {
        let file_config = FileConfig::parse("[extensions]\nmusic = [\"flac\"]\n").unwrap();
        let err = Settings::from_vars(&full_vars(), file_config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidExtension { category: Category::Music, .. }
        ));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let file_config = FileConfig::parse("[extensions]\nfonts = [\".ttf\"]\n").unwrap();
        let err = Settings::from_vars(&full_vars(), file_config).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigInvalid(_)));
    }

    #[test]
    fn test_unknown_top_level_key_is_rejected() {
        assert!(FileConfig::parse("dry_run = true\n").is_err());
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        let err = FileConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
    }

    #[test]
    fn test_env_file_values_are_parsed() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let env_path = temp_dir.path().join("sweep.env");
        fs::write(&env_path, "SOURCE_DIR=/tmp/in\nSCRIPT_NAME=\"run me.sh\"\n").unwrap();

        let vars = read_env_file(Some(&env_path)).unwrap();
        assert_eq!(vars.get("SOURCE_DIR").map(String::as_str), Some("/tmp/in"));
        assert_eq!(vars.get("SCRIPT_NAME").map(String::as_str), Some("run me.sh"));
    }

    #[test]
    fn test_explicit_env_file_must_exist() {
        let err = read_env_file(Some(Path::new("/definitely/not/here.env"))).unwrap_err();
        assert!(matches!(err, ConfigError::EnvFile { .. }));
    }
}
