use std::fs;

use cairn_core::definitions::collect_definitions;
use cairn_core::formatter::{FormatConfig, FormatError, format, format_with};
use cairn_core::{Analyzer, ParseErrorKind, verify_equivalence};

const PROJECT: &str = "\
cmake_minimum_required(VERSION 3.16)
project(cairn_demo VERSION 1.2.3 LANGUAGES C CXX) # demo



option(DEMO_TESTS \"Build the tests\" ON)
set(DEMO_SOURCES src/main.cpp src/parser.cpp src/lexer.cpp src/printer.cpp src/options.cpp)
add_executable(demo ${DEMO_SOURCES})
demo_add_warnings(demo
    STRICT   # no exceptions
)
if(DEMO_TESTS)
enable_testing()
  foreach(test IN ITEMS lexer parser)
    add_test(NAME ${test} COMMAND demo --self-test ${test})
  endforeach()
endif()
";

#[test]
fn test_formatted_project_is_equivalent_and_stable() {
    let config = FormatConfig::default();
    let analyzer = Analyzer::new();

    let first = format_with(&analyzer, PROJECT, &config).unwrap();
    assert!(verify_equivalence(&analyzer, PROJECT, &first).is_ok());
    assert_eq!(format_with(&analyzer, &first, &config).unwrap(), first);

    assert!(first.contains("project(cairn_demo VERSION 1.2.3 LANGUAGES C CXX) # demo\n\noption("));
    assert!(first.contains("demo_add_warnings(demo\n    STRICT   # no exceptions\n)"));
    assert!(first.contains("    enable_testing()\n"));
    assert!(first.contains("        add_test(NAME ${test} COMMAND demo --self-test ${test})\n"));
    assert!(first.ends_with("endif()\n"));
}

#[test]
fn test_unknown_commands_are_reported() {
    let tree = Analyzer::new().parse(PROJECT).unwrap();
    let unknown = tree.custom_commands();

    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].name, "demo_add_warnings");
    assert_eq!(unknown[0].span.line_col(PROJECT), (9, 1));
}

#[test]
fn test_definition_file_extends_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warnings.cmake");
    fs::write(
        &path,
        "function(demo_add_warnings target)\n  target_compile_options(${target} PRIVATE -Wall)\nendfunction()\n",
    )
    .unwrap();

    let definitions = fs::read_to_string(&path).unwrap();
    let names = collect_definitions(&Analyzer::new(), [definitions]).unwrap();
    let analyzer = Analyzer::with_definitions(&names);

    let formatted = format_with(&analyzer, PROJECT, &FormatConfig::default()).unwrap();
    assert!(formatted.contains("demo_add_warnings(\n    demo STRICT # no exceptions\n)"));
    assert!(analyzer.parse(PROJECT).unwrap().custom_commands().is_empty());
}

#[test]
fn test_parse_errors_surface_from_format() {
    let cases = [
        ("foo(bar", ParseErrorKind::UnbalancedParentheses),
        ("foo([=[bar]])", ParseErrorKind::UnbalancedBrackets),
        ("endif()\n", ParseErrorKind::GenericParsingError),
    ];
    for (source, kind) in cases {
        match format(source, &FormatConfig::default()) {
            Err(FormatError::Parse(error)) => assert_eq!(error.kind, kind, "{:?}", source),
            other => panic!("unexpected result for {:?}: {:?}", source, other),
        }
    }
}

#[test]
fn test_unsafe_mode_skips_check() {
    let config = FormatConfig {
        unsafe_mode: true,
        ..Default::default()
    };
    assert_eq!(format("set(A   1)", &config).unwrap(), "set(A 1)\n");
}
