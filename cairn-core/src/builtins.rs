//! Commands shipped with CMake itself.
//!
//! Invocations of these commands are reformatted; everything else is treated
//! as a user-defined command and reproduced verbatim.

use std::collections::HashSet;

use once_cell::sync::Lazy;

const SCRIPTING_COMMANDS: &[&str] = &[
    "block",
    "break",
    "cmake_host_system_information",
    "cmake_language",
    "cmake_minimum_required",
    "cmake_parse_arguments",
    "cmake_path",
    "cmake_policy",
    "configure_file",
    "continue",
    "else",
    "elseif",
    "endblock",
    "endforeach",
    "endfunction",
    "endif",
    "endmacro",
    "endwhile",
    "execute_process",
    "file",
    "find_file",
    "find_library",
    "find_package",
    "find_path",
    "find_program",
    "foreach",
    "function",
    "get_cmake_property",
    "get_directory_property",
    "get_filename_component",
    "get_property",
    "if",
    "include",
    "include_guard",
    "list",
    "macro",
    "mark_as_advanced",
    "math",
    "message",
    "option",
    "return",
    "separate_arguments",
    "set",
    "set_directory_properties",
    "set_property",
    "site_name",
    "string",
    "unset",
    "variable_watch",
    "while",
];

const PROJECT_COMMANDS: &[&str] = &[
    "add_compile_definitions",
    "add_compile_options",
    "add_custom_command",
    "add_custom_target",
    "add_definitions",
    "add_dependencies",
    "add_executable",
    "add_library",
    "add_link_options",
    "add_subdirectory",
    "add_test",
    "aux_source_directory",
    "build_command",
    "create_test_sourcelist",
    "define_property",
    "enable_language",
    "enable_testing",
    "export",
    "fltk_wrap_ui",
    "get_source_file_property",
    "get_target_property",
    "get_test_property",
    "include_directories",
    "include_external_msproject",
    "include_regular_expression",
    "install",
    "link_directories",
    "link_libraries",
    "load_cache",
    "project",
    "remove_definitions",
    "set_source_files_properties",
    "set_target_properties",
    "set_tests_properties",
    "source_group",
    "target_compile_definitions",
    "target_compile_features",
    "target_compile_options",
    "target_include_directories",
    "target_link_directories",
    "target_link_libraries",
    "target_link_options",
    "target_precompile_headers",
    "target_sources",
    "try_compile",
    "try_run",
];

const CTEST_COMMANDS: &[&str] = &[
    "ctest_build",
    "ctest_configure",
    "ctest_coverage",
    "ctest_empty_binary_directory",
    "ctest_memcheck",
    "ctest_read_custom_files",
    "ctest_run_script",
    "ctest_sleep",
    "ctest_start",
    "ctest_submit",
    "ctest_test",
    "ctest_update",
    "ctest_upload",
];

const DEPRECATED_COMMANDS: &[&str] = &[
    "build_name",
    "exec_program",
    "export_library_dependencies",
    "install_files",
    "install_programs",
    "install_targets",
    "load_command",
    "make_directory",
    "output_required_files",
    "qt_wrap_cpp",
    "qt_wrap_ui",
    "remove",
    "subdir_depends",
    "subdirs",
    "use_mangled_mesa",
    "utility_source",
    "variable_requires",
    "write_file",
];

static BUILTIN_COMMANDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    SCRIPTING_COMMANDS
        .iter()
        .chain(PROJECT_COMMANDS)
        .chain(CTEST_COMMANDS)
        .chain(DEPRECATED_COMMANDS)
        .copied()
        .collect()
});

/// Whether `name` is a CMake builtin. Command names are case-insensitive.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_COMMANDS.contains(name.to_ascii_lowercase().as_str())
}

/// Set of command names an analyzer treats as reformattable
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    extra: HashSet<String>,
}

impl CommandSet {
    /// Only the CMake builtins
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Builtins plus user-supplied command names
    pub fn with_extra<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: names
                .into_iter()
                .map(|name| name.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        is_builtin(name) || self.extra.contains(&name.to_ascii_lowercase())
    }

    /// Number of user-supplied names
    pub fn extra_len(&self) -> usize {
        self.extra.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_ignores_case() {
        assert!(is_builtin("add_library"));
        assert!(is_builtin("ADD_LIBRARY"));
        assert!(is_builtin("Target_Link_Libraries"));
        assert!(!is_builtin("my_macro"));
    }

    #[test]
    fn test_command_set_with_extra() {
        let set = CommandSet::with_extra(["Seed_Project"]);
        assert!(set.contains("seed_project"));
        assert!(set.contains("message"));
        assert!(!set.contains("other"));
        assert_eq!(set.extra_len(), 1);
        assert!(!CommandSet::builtin().contains("seed_project"));
    }

    #[test]
    fn test_catalogue_size() {
        assert!(BUILTIN_COMMANDS.len() > 120);
    }
}
