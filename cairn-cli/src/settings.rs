//! `.cairnrc` discovery and merging with command-line flags

use std::fmt;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cairn_core::formatter::{FormatConfig, Indent, InvalidValue, ListExpansion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file searched for next to the sources
pub const CONFIG_FILE_NAME: &str = ".cairnrc";

/// Errors that can occur while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid YAML or holds unexpected values
    #[error("Invalid configuration in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Number of threads used to format files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "WorkersValue", into = "WorkersValue")]
pub enum Workers {
    /// One per available CPU
    #[default]
    Max,
    Count(NonZeroUsize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WorkersValue {
    Count(usize),
    Keyword(String),
}

impl TryFrom<WorkersValue> for Workers {
    type Error = InvalidValue;

    fn try_from(value: WorkersValue) -> Result<Self, Self::Error> {
        match value {
            WorkersValue::Count(n) => {
                NonZeroUsize::new(n)
                    .map(Workers::Count)
                    .ok_or_else(|| InvalidValue {
                        what: "workers",
                        value: n.to_string(),
                    })
            }
            WorkersValue::Keyword(word) => word.parse(),
        }
    }
}

impl From<Workers> for WorkersValue {
    fn from(workers: Workers) -> Self {
        match workers {
            Workers::Max => WorkersValue::Keyword("max".to_string()),
            Workers::Count(n) => WorkersValue::Count(n.get()),
        }
    }
}

impl FromStr for Workers {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "max" {
            return Ok(Workers::Max);
        }
        s.parse::<NonZeroUsize>()
            .map(Workers::Count)
            .map_err(|_| InvalidValue {
                what: "workers",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workers::Max => f.write_str("max"),
            Workers::Count(n) => write!(f, "{}", n),
        }
    }
}

impl Workers {
    pub fn threads(self) -> usize {
        match self {
            Workers::Max => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            Workers::Count(n) => n.get(),
        }
    }
}

/// Everything a run needs to know besides the sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub format: FormatConfig,

    /// Only print errors
    pub quiet: bool,

    /// Colorize diffs
    pub color: bool,

    pub workers: Workers,

    /// Warn about commands that are kept as written
    pub warn_about_unknown_commands: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: FormatConfig::default(),
            quiet: false,
            color: false,
            workers: Workers::Max,
            warn_about_unknown_commands: true,
        }
    }
}

/// Values given on the command line; `None` keeps the file's value
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub line_length: Option<usize>,
    pub indent: Option<Indent>,
    pub list_expansion: Option<ListExpansion>,
    pub unsafe_mode: bool,
    pub quiet: bool,
    pub color: bool,
    pub definitions: Option<Vec<PathBuf>>,
    pub workers: Option<Workers>,
    pub warn_about_unknown_commands: Option<bool>,
}

impl Settings {
    /// Contents of a default configuration file
    pub fn default_file() -> String {
        let yaml = serde_yaml::to_string(&Settings::default()).unwrap_or_default();
        format!(
            "# Configuration for cairn, looked up from the formatted files' directory upwards\n{}",
            yaml
        )
    }

    /// Load a configuration file; relative definition paths are taken
    /// relative to the file's directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = if text.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str::<Settings>(&text).map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?
        };

        if let Some(dir) = path.parent() {
            for definition in &mut settings.format.definitions {
                if definition.is_relative() {
                    *definition = dir.join(&*definition);
                }
            }
        }
        log::debug!("loaded configuration from {}", path.display());
        Ok(settings)
    }

    /// Settings for `sources`: the nearest `.cairnrc` above their common
    /// directory, or the defaults
    pub fn discover(sources: &[PathBuf]) -> Result<Self, ConfigError> {
        let start = common_parent(sources)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        match find_config_file(&start) {
            Some(path) => Settings::load(&path),
            None => Ok(Settings::default()),
        }
    }

    /// Apply command-line values on top of these settings
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(line_length) = overrides.line_length {
            self.format.line_length = line_length;
        }
        if let Some(indent) = overrides.indent {
            self.format.indent = indent;
        }
        if let Some(list_expansion) = overrides.list_expansion {
            self.format.list_expansion = list_expansion;
        }
        if let Some(definitions) = overrides.definitions {
            self.format.definitions = definitions;
        }
        if let Some(workers) = overrides.workers {
            self.workers = workers;
        }
        if let Some(warn) = overrides.warn_about_unknown_commands {
            self.warn_about_unknown_commands = warn;
        }
        self.format.unsafe_mode |= overrides.unsafe_mode;
        self.quiet |= overrides.quiet;
        self.color |= overrides.color;
        self
    }
}

/// Nearest `.cairnrc` in `start` or one of its ancestors
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Deepest directory containing every source; standard input counts as
/// the working directory
fn common_parent(sources: &[PathBuf]) -> Option<PathBuf> {
    let mut dirs = sources.iter().map(|source| {
        let source = if source.as_os_str() == "-" {
            Path::new(".")
        } else {
            source.as_path()
        };
        let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        if absolute.is_dir() {
            absolute
        } else {
            absolute
                .parent()
                .map_or_else(|| absolute.clone(), Path::to_path_buf)
        }
    });

    let first = dirs.next()?;
    Some(dirs.fold(first, |common, dir| {
        common
            .ancestors()
            .find(|ancestor| dir.starts_with(ancestor))
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.format, FormatConfig::default());
        assert!(settings.warn_about_unknown_commands);
        assert_eq!(settings.workers, Workers::Max);
        assert!(!settings.quiet);
    }

    #[test]
    fn test_parse_workers() {
        assert_eq!("max".parse::<Workers>(), Ok(Workers::Max));
        assert_eq!(
            "3".parse::<Workers>(),
            Ok(Workers::Count(NonZeroUsize::new(3).unwrap()))
        );
        assert!("0".parse::<Workers>().is_err());
        assert!("many".parse::<Workers>().is_err());
        assert!(Workers::Max.threads() >= 1);
    }

    #[test]
    fn test_default_file_round_trips() {
        let text = Settings::default_file();
        assert!(text.starts_with("# Configuration for cairn"));
        assert!(text.contains("line_length: 80"));
        assert!(text.contains("list_expansion: favour-inlining"));
        assert_eq!(serde_yaml::from_str::<Settings>(&text).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "line_length: 100\nindent: tabs\nworkers: 2\nwarn_about_unknown_commands: false\ndefinitions: [cmake/helpers.cmake]\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.format.line_length, 100);
        assert_eq!(settings.format.indent, Indent::Tabs);
        assert_eq!(settings.workers.threads(), 2);
        assert!(!settings.warn_about_unknown_commands);
        assert_eq!(
            settings.format.definitions,
            [dir.path().join("cmake/helpers.cmake")]
        );
    }

    #[test]
    fn test_load_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "").unwrap();
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "list_expansion: sideways\n").unwrap();

        let error = Settings::load(&path).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { .. }));
        assert!(error.to_string().contains(".cairnrc"));
    }

    #[test]
    fn test_discover_from_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "line_length: 60\n").unwrap();
        let nested = dir.path().join("src").join("lib");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("CMakeLists.txt");
        fs::write(&file, "").unwrap();

        let settings = Settings::discover(&[file, dir.path().join("src")]).unwrap();
        assert_eq!(settings.format.line_length, 60);
    }

    #[test]
    fn test_common_parent() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        let root = std::path::absolute(dir.path()).unwrap();

        assert_eq!(common_parent(&[a.clone(), b]), Some(root));
        assert_eq!(common_parent(&[a.join("x.cmake")]), std::path::absolute(&a).ok());
        assert_eq!(common_parent(&[]), None);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let settings = Settings::default().with_overrides(Overrides {
            line_length: Some(120),
            list_expansion: Some(ListExpansion::FavourExpansion),
            unsafe_mode: true,
            warn_about_unknown_commands: Some(false),
            ..Default::default()
        });
        assert_eq!(settings.format.line_length, 120);
        assert_eq!(settings.format.list_expansion, ListExpansion::FavourExpansion);
        assert!(settings.format.unsafe_mode);
        assert!(!settings.warn_about_unknown_commands);
        assert_eq!(settings.format.indent, Indent::Spaces(4));
    }
}
