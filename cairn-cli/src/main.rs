mod runner;
mod settings;
mod sources;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;

use cairn_core::formatter::{Indent, ListExpansion};

use crate::runner::{Mode, RunError};
use crate::settings::{ConfigError, Overrides, Settings, Workers};

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "A formatter for CMake code", long_about = None, version)]
struct Cli {
    /// File or directory to format; `-` alone reads from stdin
    #[arg(value_name = "SRC")]
    sources: Vec<PathBuf>,

    /// Check if files require reformatting (don't modify)
    #[arg(long, short)]
    check: bool,

    /// Format files in place
    #[arg(long, short = 'i')]
    in_place: bool,

    /// Show diff of formatting changes
    #[arg(long)]
    diff: bool,

    /// Print a default .cairnrc and exit
    #[arg(long)]
    default_config: bool,

    /// Maximum line length [default: 80]
    #[arg(long, short = 'l', value_name = "INTEGER")]
    line_length: Option<usize>,

    /// Spaces per indentation level, or `tabs` [default: 4]
    #[arg(long, value_name = "INTEGER|tabs")]
    indent: Option<Indent>,

    /// Layout of argument lists that don't fit on one line [default: favour-inlining]
    #[arg(long, value_name = "favour-inlining|favour-expansion")]
    list_expansion: Option<ListExpansion>,

    /// Skip the check that formatted code means the same as the input
    #[arg(long = "unsafe")]
    unsafe_mode: bool,

    /// Only print errors
    #[arg(long, short)]
    quiet: bool,

    /// Colorize diffs
    #[arg(long)]
    color: bool,

    /// Files or directories whose functions and macros are formatted like builtins
    #[arg(long, value_name = "SRC", num_args = 1..)]
    definitions: Option<Vec<PathBuf>>,

    /// Number of worker threads [default: max]
    #[arg(long, short, value_name = "INTEGER|max")]
    workers: Option<Workers>,

    /// Warn about commands whose formatting is kept as written
    #[arg(long, overrides_with = "no_warn_about_unknown_commands")]
    warn_about_unknown_commands: bool,

    /// Don't warn about commands whose formatting is kept as written
    #[arg(long, overrides_with = "warn_about_unknown_commands")]
    no_warn_about_unknown_commands: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("Don't mix stdin with file input")]
    MixedStdin,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let warn_about_unknown_commands = if self.warn_about_unknown_commands {
            Some(true)
        } else if self.no_warn_about_unknown_commands {
            Some(false)
        } else {
            None
        };

        Overrides {
            line_length: self.line_length,
            indent: self.indent,
            list_expansion: self.list_expansion,
            unsafe_mode: self.unsafe_mode,
            quiet: self.quiet,
            color: self.color,
            definitions: self.definitions.clone(),
            workers: self.workers,
            warn_about_unknown_commands,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run_cli(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run_cli(cli: &Cli) -> Result<bool, CliError> {
    if cli.default_config {
        print!("{}", Settings::default_file());
        return Ok(true);
    }

    let definitions = cli.definitions.as_deref().unwrap_or_default();
    if sources::mixes_stdin(&cli.sources) || sources::mixes_stdin(definitions) {
        return Err(CliError::MixedStdin);
    }
    if cli.sources.is_empty() {
        return Ok(true);
    }

    let settings = Settings::discover(&cli.sources)?.with_overrides(cli.overrides());
    log::debug!("settings: {:?}", settings);
    if settings.color {
        colored::control::set_override(true);
    }

    let mode = Mode::from_flags(cli.check, cli.in_place, cli.diff);
    Ok(runner::run(mode, &settings, &cli.sources)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "cairn",
            "--check",
            "-l",
            "100",
            "--indent",
            "tabs",
            "--list-expansion",
            "favour-expansion",
            "--workers",
            "2",
            "--no-warn-about-unknown-commands",
            "CMakeLists.txt",
        ])
        .unwrap();

        assert!(cli.check);
        assert_eq!(cli.sources, [PathBuf::from("CMakeLists.txt")]);
        let overrides = cli.overrides();
        assert_eq!(overrides.line_length, Some(100));
        assert_eq!(overrides.indent, Some(Indent::Tabs));
        assert_eq!(overrides.list_expansion, Some(ListExpansion::FavourExpansion));
        assert_eq!(overrides.warn_about_unknown_commands, Some(false));
        assert_eq!(overrides.workers.map(Workers::threads), Some(2));
    }

    #[test]
    fn test_last_warning_toggle_wins() {
        let cli = Cli::try_parse_from([
            "cairn",
            "--no-warn-about-unknown-commands",
            "--warn-about-unknown-commands",
            "-",
        ])
        .unwrap();
        assert_eq!(cli.overrides().warn_about_unknown_commands, Some(true));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Cli::try_parse_from(["cairn", "--indent", "wide", "x"]).is_err());
        assert!(Cli::try_parse_from(["cairn", "--workers", "0", "x"]).is_err());
        assert!(Cli::try_parse_from(["cairn", "--list-expansion", "auto", "x"]).is_err());
    }

    #[test]
    fn test_mixed_stdin_is_rejected() {
        let cli = Cli::try_parse_from(["cairn", "-", "CMakeLists.txt"]).unwrap();
        assert!(matches!(run_cli(&cli), Err(CliError::MixedStdin)));
    }

    #[test]
    fn test_no_sources_is_a_no_op() {
        let cli = Cli::try_parse_from(["cairn"]).unwrap();
        assert!(run_cli(&cli).unwrap());
    }
}
