//! Formatting sources in parallel and reporting the results

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use rayon::prelude::*;
use similar::{ChangeTag, TextDiff};
use thiserror::Error;

use cairn_core::definitions::collect_definitions;
use cairn_core::formatter::{FormatError, format_tree};
use cairn_core::{Analyzer, NormalizedTree};

use crate::settings::Settings;
use crate::sources::{Source, SourceError, resolve_sources};

/// Errors that stop a run before any file is formatted
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Sources(#[from] SourceError),

    #[error("Failed to read definitions from {}: {source}", path.display())]
    DefinitionsRead { path: PathBuf, source: io::Error },

    #[error("Invalid definitions in {}:\n{message}", path.display())]
    DefinitionsParse { path: PathBuf, message: String },

    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// What to do with formatted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print formatted code to stdout
    ForwardToStdout,
    /// Overwrite changed files
    RewriteInPlace,
    /// Report files that would change, optionally with their diff
    CheckFormatting { show_diff: bool },
    /// Print the diff of every changed file
    ShowDiff,
}

impl Mode {
    pub fn from_flags(check: bool, in_place: bool, diff: bool) -> Self {
        if check {
            Mode::CheckFormatting { show_diff: diff }
        } else if diff {
            Mode::ShowDiff
        } else if in_place {
            Mode::RewriteInPlace
        } else {
            Mode::ForwardToStdout
        }
    }
}

/// Result of formatting one source
#[derive(Debug)]
struct Report {
    source: Source,
    outcome: Result<Formatted, String>,
    warnings: Vec<String>,
}

#[derive(Debug)]
struct Formatted {
    original: String,
    formatted: String,
}

impl Formatted {
    fn changed(&self) -> bool {
        self.original != self.formatted
    }
}

/// Format every source; returns whether the run succeeded
pub fn run(mode: Mode, settings: &Settings, paths: &[PathBuf]) -> Result<bool, RunError> {
    let sources = resolve_sources(paths)?;
    let analyzer = build_analyzer(settings)?;
    log::debug!(
        "formatting {} source(s) with {} extra command(s)",
        sources.len(),
        analyzer.commands().extra_len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers.threads())
        .build()?;
    let reports: Vec<Report> = pool.install(|| {
        sources
            .par_iter()
            .map_init(
                || analyzer.clone(),
                |analyzer, source| process(analyzer, settings, source),
            )
            .collect()
    });

    let mut success = true;
    for report in reports {
        success &= emit(mode, settings, report);
    }
    Ok(success)
}

/// Analyzer that also knows the commands defined in the definition sources
fn build_analyzer(settings: &Settings) -> Result<Analyzer, RunError> {
    if settings.format.definitions.is_empty() {
        return Ok(Analyzer::new());
    }

    let sources = resolve_sources(&settings.format.definitions)?;
    let base = Analyzer::new();
    let mut names = Vec::new();
    for source in sources {
        let path = match &source {
            Source::File(path) => path.clone(),
            Source::Stdin => PathBuf::from("-"),
        };
        let code = source.read().map_err(|source| RunError::DefinitionsRead {
            path: path.clone(),
            source,
        })?;
        let found = collect_definitions(&base, [code]).map_err(|error| {
            RunError::DefinitionsParse {
                path,
                message: error.to_string(),
            }
        })?;
        names.extend(found);
    }
    Ok(Analyzer::with_definitions(names))
}

fn process(analyzer: &Analyzer, settings: &Settings, source: &Source) -> Report {
    let original = match source.read() {
        Ok(code) => code,
        Err(error) => {
            return Report {
                source: source.clone(),
                outcome: Err(format!("Failed to read: {}", error)),
                warnings: Vec::new(),
            };
        }
    };

    let tree = match analyzer.parse(&original) {
        Ok(tree) => tree,
        Err(error) => {
            return Report {
                source: source.clone(),
                outcome: Err(error.to_string()),
                warnings: Vec::new(),
            };
        }
    };

    let warnings = if settings.warn_about_unknown_commands {
        unknown_command_warnings(&tree, source, &original)
    } else {
        Vec::new()
    };

    let outcome = format_tree(analyzer, &tree, &original, &settings.format)
        .map(|formatted| Formatted {
            original,
            formatted,
        })
        .map_err(|error| FormatError::from(error).to_string());

    Report {
        source: source.clone(),
        outcome,
        warnings,
    }
}

fn unknown_command_warnings(tree: &NormalizedTree, source: &Source, code: &str) -> Vec<String> {
    tree.custom_commands()
        .iter()
        .map(|command| {
            let (line, column) = command.span.line_col(code);
            format!(
                "{}:{}:{}: unknown command `{}`, kept as written",
                source, line, column, command.name
            )
        })
        .collect()
}

/// Print a report according to `mode`; returns whether it counts as success
fn emit(mode: Mode, settings: &Settings, report: Report) -> bool {
    if !settings.quiet {
        for warning in &report.warnings {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
    }

    let formatted = match report.outcome {
        Ok(formatted) => formatted,
        Err(error) => {
            eprintln!("{} {}: {}", "Error:".red().bold(), report.source, error);
            return false;
        }
    };

    match mode {
        Mode::ForwardToStdout => {
            print!("{}", formatted.formatted);
            true
        }
        Mode::RewriteInPlace => rewrite(&report.source, &formatted),
        Mode::CheckFormatting { show_diff } => {
            if !formatted.changed() {
                return true;
            }
            if !settings.quiet {
                eprintln!("{} would be reformatted", report.source);
            }
            if show_diff {
                print!("{}", render_diff(&report.source, &formatted, settings.color));
            }
            false
        }
        Mode::ShowDiff => {
            if formatted.changed() {
                print!("{}", render_diff(&report.source, &formatted, settings.color));
            }
            true
        }
    }
}

fn rewrite(source: &Source, formatted: &Formatted) -> bool {
    match source {
        Source::Stdin => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(formatted.formatted.as_bytes()).is_ok()
        }
        Source::File(_) if !formatted.changed() => true,
        Source::File(path) => match fs::write(path, &formatted.formatted) {
            Ok(()) => {
                log::info!("reformatted {}", path.display());
                true
            }
            Err(error) => {
                eprintln!(
                    "{} Failed to write {}: {}",
                    "Error:".red().bold(),
                    path.display(),
                    error
                );
                false
            }
        },
    }
}

/// Unified diff between the original and formatted code
fn render_diff(source: &Source, formatted: &Formatted, color: bool) -> String {
    let paint = |text: String, tag: Option<ChangeTag>| -> String {
        if !color {
            return text;
        }
        match tag {
            Some(ChangeTag::Delete) => text.red().to_string(),
            Some(ChangeTag::Insert) => text.green().to_string(),
            Some(ChangeTag::Equal) => text,
            None => text.cyan().to_string(),
        }
    };

    let diff = TextDiff::from_lines(&formatted.original, &formatted.formatted);
    let mut output = String::new();
    output.push_str(&paint(format!("--- {}\n", source), Some(ChangeTag::Delete)));
    output.push_str(&paint(format!("+++ {}\n", source), Some(ChangeTag::Insert)));

    for hunk in diff.unified_diff().iter_hunks() {
        output.push_str(&paint(format!("{}\n", hunk.header()), None));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            let mut line = format!("{}{}", sign, change.to_string_lossy());
            if change.missing_newline() {
                line.push_str("\n\\ No newline at end of file\n");
            }
            output.push_str(&paint(line, Some(change.tag())));
        }
    }
    output
}
