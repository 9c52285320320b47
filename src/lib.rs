/*!
 * codemap-extract - Snapshot a project for external review
 *
 * This library walks a project directory, writes an indented codemap of its
 * structure, copies the selected file types into one flat timestamped folder
 * and documents the libraries the sources import.
 */

pub mod codemap;
pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod library;
pub mod prompt;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod types;
pub mod utils;


// Re-export main components for easier access
pub use codemap::CodemapWriter;
pub use collector::{flatten_name, FileCollector};
pub use config::{Config, IgnorePatterns};
pub use error::{ExtractError, Result};
pub use extract::{discover, Discovery, Extraction};
pub use library::{LibraryReporter, LibraryResolver, PythonEnvironment};
pub use prompt::{parse_file_types, parse_libraries, Prompter, SelectionError};
pub use report::{Reporter, RunSummary};
pub use rules::IgnoreRules;
pub use scanner::Scanner;
pub use types::{CopyKind, CopyStats, LibraryInfo, RunLayout, RunRequest};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
