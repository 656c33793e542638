//! Resolving command-line paths into the files to format

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Don't mix stdin with file input")]
    MixedStdin,

    #[error("Failed to read directory {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },
}

/// Something to format
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    pub fn read(&self) -> io::Result<String> {
        match self {
            Source::Stdin => {
                let mut code = String::new();
                io::stdin().read_to_string(&mut code)?;
                Ok(code)
            }
            Source::File(path) => fs::read_to_string(path),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Whether `paths` mixes `-` with real paths
pub fn mixes_stdin(paths: &[PathBuf]) -> bool {
    paths.iter().any(|path| is_stdin(path)) && paths.len() != 1
}

/// Files named directly plus CMake files found under named directories,
/// sorted and without duplicates
pub fn resolve_sources(paths: &[PathBuf]) -> Result<Vec<Source>, SourceError> {
    if mixes_stdin(paths) {
        return Err(SourceError::MixedStdin);
    }

    let mut sources = BTreeSet::new();
    for path in paths {
        if is_stdin(path) {
            sources.insert(Source::Stdin);
        } else if path.is_dir() {
            let mut files = Vec::new();
            collect_cmake_files(path, &mut files)?;
            sources.extend(files.into_iter().map(Source::File));
        } else {
            sources.insert(Source::File(path.clone()));
        }
    }
    Ok(sources.into_iter().collect())
}

fn is_cmake_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "CMakeLists.txt")
        || path.extension().is_some_and(|ext| ext == "cmake")
}

fn collect_cmake_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let directory_error = |source| SourceError::Directory {
        path: dir.to_path_buf(),
        source,
    };
    let entries = fs::read_dir(dir).map_err(directory_error)?;

    for entry in entries {
        let entry = entry.map_err(directory_error)?;
        let path = entry.path();

        if path.is_dir() {
            // Skip hidden directories
            let name = path.file_name().unwrap_or_default().to_string_lossy();
            if !name.starts_with('.') {
                collect_cmake_files(&path, files)?;
            }
        } else if is_cmake_file(&path) {
            files.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_directory_is_searched_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("CMakeLists.txt"));
        touch(&root.join("cmake/Helpers.cmake"));
        touch(&root.join("src/CMakeLists.txt"));
        touch(&root.join("src/main.cpp"));
        touch(&root.join(".git/hooks/CMakeLists.txt"));

        let sources = resolve_sources(&[root.to_path_buf()]).unwrap();
        assert_eq!(
            sources,
            [
                Source::File(root.join("CMakeLists.txt")),
                Source::File(root.join("cmake/Helpers.cmake")),
                Source::File(root.join("src/CMakeLists.txt")),
            ]
        );
    }

    #[test]
    fn test_explicit_files_are_kept_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("toolchain.txt");
        touch(&file);

        let sources = resolve_sources(&[file.clone(), file.clone()]).unwrap();
        assert_eq!(sources, [Source::File(file)]);
    }

    #[test]
    fn test_stdin() {
        let sources = resolve_sources(&[PathBuf::from("-")]).unwrap();
        assert_eq!(sources, [Source::Stdin]);
        assert_eq!(Source::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn test_stdin_cannot_be_mixed() {
        let paths = [PathBuf::from("-"), PathBuf::from("CMakeLists.txt")];
        assert!(mixes_stdin(&paths));
        assert!(matches!(
            resolve_sources(&paths),
            Err(SourceError::MixedStdin)
        ));
    }

    #[test]
    fn test_cmake_file_names() {
        assert!(is_cmake_file(Path::new("a/CMakeLists.txt")));
        assert!(is_cmake_file(Path::new("FindFoo.cmake")));
        assert!(!is_cmake_file(Path::new("CMakeCache.txt")));
    }
}
