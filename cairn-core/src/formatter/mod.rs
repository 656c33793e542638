//! Code formatter for CMake
//!
//! Renders normalized trees: one statement per line, block bodies indented,
//! argument lists broken over several lines only when they do not fit.
//! Comments are kept where they were and custom commands are reproduced
//! exactly as written. Unless `unsafe` is set, every result is re-parsed
//! and compared with the input before it is handed back.
//!
//! # Example
//!
//! ```
//! use cairn_core::formatter::{format, FormatConfig};
//!
//! let source = "if(WIN32)\nset(LIBS   ws2_32) # sockets\nendif()\n";
//! let config = FormatConfig::default();
//! let formatted = format(source, &config).unwrap();
//!
//! assert_eq!(formatted, "if(WIN32)\n    set(LIBS ws2_32) # sockets\nendif()\n");
//! ```

mod config;
mod format;

pub use config::{FormatConfig, Indent, InvalidValue, ListExpansion};
pub use format::{FormatError, format, format_tree, format_with, needs_format, render};
