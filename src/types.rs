/*!
 * Core types and data structures for codemap-extract
 */

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{ExtractError, Result};

/// Format of the run folder timestamp (`codebase-<timestamp>`)
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y.%m.%d_%H.%M.%S";

/// Prefix of the per-run folder name
pub const CODEBASE_PREFIX: &str = "codebase-";

/// Folder receiving library reports, next to the run folders
pub const LIBRARIES_DIR: &str = "Libraries";

/// Format of the header line prepended to copied text files
pub const COPY_HEADER_FORMAT: &str = "# file updated %Y.%m.%d_%H:%M:%S";

/// Installed location and footprint of a library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    /// Directory containing the library's origin file
    pub path: PathBuf,
    /// Number of files below `path`
    pub file_count: u64,
    /// Sum of file sizes below `path`, in bytes
    pub total_size: u64,
}

/// How a single file ended up in the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyKind {
    /// UTF-8 content, written with a timestamp header
    Text,
    /// Non UTF-8 content, copied verbatim with metadata
    Binary,
}

/// Statistics of one collector pass
#[derive(Debug, Clone, Default)]
pub struct CopyStats {
    /// Files written with a timestamp header
    pub text_files: usize,
    /// Files copied byte for byte
    pub binary_files: usize,
    /// Bytes read from the copied source files
    pub bytes: u64,
    /// Files that could not be copied, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

impl CopyStats {
    /// Total number of files that reached the output directory
    pub fn copied(&self) -> usize {
        self.text_files + self.binary_files
    }

    pub(crate) fn record(&mut self, kind: CopyKind, bytes: u64) {
        self.bytes += bytes;
        match kind {
            CopyKind::Text => self.text_files += 1,
            CopyKind::Binary => self.binary_files += 1,
        }
    }
}

/// What the operator asked for in one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Directory to snapshot
    pub root: PathBuf,
    /// Directory receiving `<root-basename>/...`
    pub output_dir: PathBuf,
    /// Extensions (with leading dot) selected for copying
    pub file_types: Vec<String>,
    /// Libraries selected for reporting
    pub libraries: Vec<String>,
}

/// Paths of the artifacts produced by one run
///
/// ```text
/// <output>/<root-basename>/codebase-<timestamp>/<root-basename>-codemap.txt
/// <output>/<root-basename>/Libraries/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    /// `<output>/<root-basename>`
    pub top_level_dir: PathBuf,
    /// `codebase-<timestamp>` folder holding the codemap and copies
    pub codebase_dir: PathBuf,
    /// Sibling folder for library reports
    pub libraries_dir: PathBuf,
    /// The codemap text file
    pub codemap_file: PathBuf,
    /// Timestamp string used in folder and report names
    pub timestamp: String,
}

impl RunLayout {
    /// Compute the layout for `root` below `output_dir`
    pub fn new(output_dir: &Path, root: &Path, generated_at: DateTime<Local>) -> Self {
        let root_name = root_basename(root);
        let timestamp = generated_at.format(RUN_TIMESTAMP_FORMAT).to_string();
        let top_level_dir = output_dir.join(&root_name);
        let codebase_dir = top_level_dir.join(format!("{}{}", CODEBASE_PREFIX, timestamp));

        Self {
            codemap_file: codebase_dir.join(format!("{}-codemap.txt", root_name)),
            libraries_dir: top_level_dir.join(LIBRARIES_DIR),
            top_level_dir,
            codebase_dir,
            timestamp,
        }
    }

    /// Create the codebase and library folders
    pub fn create(&self) -> Result<()> {
        for dir in [&self.codebase_dir, &self.libraries_dir] {
            fs::create_dir_all(dir).map_err(|source| ExtractError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Folders of `top_level_dir` that hold run artifacts and must not be scanned
///
/// Normally that is `top_level_dir` itself. When it is the root (the output
/// directory is the root's parent) only the `Libraries/` and `codebase-*`
/// folders are left out, so the project itself is still walked.
pub fn run_output_dirs(top_level_dir: &Path, root: &Path) -> Vec<PathBuf> {
    let is_root = match (fs::canonicalize(top_level_dir), fs::canonicalize(root)) {
        (Ok(top), Ok(root)) => top == root,
        _ => false,
    };
    if !is_root {
        return vec![top_level_dir.to_path_buf()];
    }

    let mut dirs = vec![top_level_dir.join(LIBRARIES_DIR)];
    if let Ok(entries) = fs::read_dir(top_level_dir) {
        dirs.extend(
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry
                        .file_name()
                        .to_string_lossy()
                        .starts_with(CODEBASE_PREFIX)
                })
                .map(|entry| entry.path())
                .filter(|path| path.is_dir()),
        );
    }
    dirs
}

/// Last path component of `root`, resolving `.` and trailing separators
pub fn root_basename(root: &Path) -> String {
    if let Some(name) = root.file_name() {
        return name.to_string_lossy().to_string();
    }

    fs::canonicalize(root)
        .ok()
        .and_then(|abs| abs.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "root".to_string())
}
