//! Formatting configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A configuration value that could not be understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {what}: `{value}`")]
pub struct InvalidValue {
    pub what: &'static str,
    pub value: String,
}

/// One level of indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IndentValue", into = "IndentValue")]
pub enum Indent {
    Spaces(usize),
    Tabs,
}

/// Written form of [`Indent`]: a number of spaces or the word `tabs`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IndentValue {
    Spaces(usize),
    Keyword(String),
}

impl TryFrom<IndentValue> for Indent {
    type Error = InvalidValue;

    fn try_from(value: IndentValue) -> Result<Self, Self::Error> {
        match value {
            IndentValue::Spaces(0) => Err(InvalidValue {
                what: "indent",
                value: "0".to_string(),
            }),
            IndentValue::Spaces(n) => Ok(Indent::Spaces(n)),
            IndentValue::Keyword(word) => word.parse(),
        }
    }
}

impl From<Indent> for IndentValue {
    fn from(indent: Indent) -> Self {
        match indent {
            Indent::Spaces(n) => IndentValue::Spaces(n),
            Indent::Tabs => IndentValue::Keyword("tabs".to_string()),
        }
    }
}

impl FromStr for Indent {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("tabs") {
            return Ok(Indent::Tabs);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Indent::Spaces(n)),
            _ => Err(InvalidValue {
                what: "indent",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indent::Spaces(n) => write!(f, "{}", n),
            Indent::Tabs => f.write_str("tabs"),
        }
    }
}

/// How arguments are laid out when a command does not fit on one line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListExpansion {
    /// Pack as many arguments as fit on each continuation line
    #[default]
    FavourInlining,
    /// One argument per line
    FavourExpansion,
}

impl FromStr for ListExpansion {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favour-inlining" => Ok(ListExpansion::FavourInlining),
            "favour-expansion" => Ok(ListExpansion::FavourExpansion),
            _ => Err(InvalidValue {
                what: "list expansion",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ListExpansion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ListExpansion::FavourInlining => "favour-inlining",
            ListExpansion::FavourExpansion => "favour-expansion",
        })
    }
}

/// Formatting options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Maximum line length (default: 80)
    pub line_length: usize,

    /// Indentation per block level (default: 4 spaces)
    pub indent: Indent,

    pub list_expansion: ListExpansion,

    /// Skip the round-trip check of the formatted code
    #[serde(rename = "unsafe")]
    pub unsafe_mode: bool,

    /// Files whose `function`/`macro` definitions are formatted like builtins
    pub definitions: Vec<PathBuf>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            line_length: 80,
            indent: Indent::Spaces(4),
            list_expansion: ListExpansion::FavourInlining,
            unsafe_mode: false,
            definitions: Vec::new(),
        }
    }
}

impl FormatConfig {
    /// Get the string to use for a single level of indentation
    pub fn indent_string(&self) -> String {
        match self.indent {
            Indent::Spaces(n) => " ".repeat(n),
            Indent::Tabs => "\t".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatConfig::default();
        assert_eq!(config.line_length, 80);
        assert_eq!(config.indent, Indent::Spaces(4));
        assert_eq!(config.list_expansion, ListExpansion::FavourInlining);
        assert!(!config.unsafe_mode);
        assert!(config.definitions.is_empty());
    }

    #[test]
    fn test_indent_string_spaces() {
        let config = FormatConfig {
            indent: Indent::Spaces(2),
            ..Default::default()
        };
        assert_eq!(config.indent_string(), "  ");
    }

    #[test]
    fn test_indent_string_tabs() {
        let config = FormatConfig {
            indent: Indent::Tabs,
            ..Default::default()
        };
        assert_eq!(config.indent_string(), "\t");
    }

    #[test]
    fn test_parse_indent() {
        assert_eq!("tabs".parse::<Indent>(), Ok(Indent::Tabs));
        assert_eq!("2".parse::<Indent>(), Ok(Indent::Spaces(2)));
        assert!("0".parse::<Indent>().is_err());
        assert!("wide".parse::<Indent>().is_err());
    }

    #[test]
    fn test_parse_list_expansion() {
        assert_eq!(
            "favour-expansion".parse::<ListExpansion>(),
            Ok(ListExpansion::FavourExpansion)
        );
        assert!("favor-inlining".parse::<ListExpansion>().is_err());
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let config: FormatConfig =
            serde_yaml::from_str("line_length: 100\nindent: tabs\nunsafe: true\n").unwrap();
        assert_eq!(config.line_length, 100);
        assert_eq!(config.indent, Indent::Tabs);
        assert!(config.unsafe_mode);
        assert_eq!(config.list_expansion, ListExpansion::FavourInlining);
    }

    #[test]
    fn test_deserialize_full_yaml() {
        let yaml = "line_length: 120\nindent: 2\nlist_expansion: favour-expansion\ndefinitions:\n  - cmake/helpers.cmake\n";
        let config: FormatConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.indent, Indent::Spaces(2));
        assert_eq!(config.list_expansion, ListExpansion::FavourExpansion);
        assert_eq!(config.definitions, [PathBuf::from("cmake/helpers.cmake")]);
    }

    #[test]
    fn test_deserialize_rejects_bad_indent() {
        assert!(serde_yaml::from_str::<FormatConfig>("indent: wide\n").is_err());
        assert!(serde_yaml::from_str::<FormatConfig>("indent: 0\n").is_err());
    }

    #[test]
    fn test_serialize_round_trips_through_yaml() {
        let config = FormatConfig {
            indent: Indent::Tabs,
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("indent: tabs"));
        assert!(yaml.contains("unsafe: false"));
        assert_eq!(serde_yaml::from_str::<FormatConfig>(&yaml).unwrap(), config);
    }
}
