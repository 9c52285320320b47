/*!
 * File collector: flat, timestamped copies of the selected files
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use filetime::FileTime;
use indicatif::ProgressBar;
use walkdir::DirEntry;

use crate::error::{ExtractError, Result};
use crate::rules::IgnoreRules;
use crate::types::{CopyKind, CopyStats, COPY_HEADER_FORMAT};
use crate::utils::{file_extension, TreeWalker};

/// Character replacing path separators in flattened names
pub const FLATTEN_CHAR: char = '-';

/// Copies selected files of a root into one flat directory
pub struct FileCollector<'a> {
    walker: TreeWalker<'a>,
    rules: &'a IgnoreRules,
    progress: Arc<ProgressBar>,
    header: String,
}

impl<'a> FileCollector<'a> {
    /// Create a collector whose text copies are stamped with `generated_at`
    pub fn new(
        root: &'a Path,
        rules: &'a IgnoreRules,
        progress: Arc<ProgressBar>,
        generated_at: DateTime<Local>,
    ) -> Self {
        Self {
            walker: TreeWalker::new(root, rules),
            rules,
            progress,
            header: generated_at.format(COPY_HEADER_FORMAT).to_string(),
        }
    }

    /// Prune those of `dirs` that lie inside the root from the copy
    pub fn skipping(mut self, dirs: &[PathBuf]) -> Self {
        self.walker = self.walker.skipping(dirs);
        self
    }

    /// Header line written above every text copy
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Files whose extension is wanted and not ignored
    pub fn candidates<'s>(
        &'s self,
        wanted: &'s BTreeSet<String>,
    ) -> impl Iterator<Item = DirEntry> + 's {
        self.walker.files().filter(move |entry| {
            file_extension(entry.path()).map_or(false, |ext| {
                wanted.contains(&ext) && !self.rules.is_ignored_extension(&ext)
            })
        })
    }

    /// Copy every file whose type was both discovered and selected into `dest`
    pub fn collect(&self, dest: &Path, discovered: &[String], selected: &[String]) -> CopyStats {
        let wanted: BTreeSet<String> = selected
            .iter()
            .filter(|ext| discovered.contains(ext))
            .cloned()
            .collect();

        self.progress
            .set_length(self.candidates(&wanted).count() as u64);
        self.progress.set_prefix("📄 Copying");

        let mut stats = CopyStats::default();
        for entry in self.candidates(&wanted) {
            let relative = self.walker.relative(entry.path());
            let target = dest.join(flatten_name(relative));
            self.progress
                .set_message(relative.to_string_lossy().to_string());

            match self.copy_file(entry.path(), &target) {
                Ok(kind) => {
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    stats.record(kind, size);
                }
                Err(e) => {
                    log::warn!("Error copying file {}: {}", entry.path().display(), e);
                    stats
                        .failures
                        .push((relative.to_path_buf(), e.to_string()));
                }
            }
            self.progress.inc(1);
        }

        log::info!(
            "Copied {} files ({} text, {} binary), {} failed",
            stats.copied(),
            stats.text_files,
            stats.binary_files,
            stats.failures.len()
        );
        stats
    }

    /// Copy one file, stamping UTF-8 content and copying anything else verbatim
    pub fn copy_file(&self, source: &Path, target: &Path) -> Result<CopyKind> {
        let bytes = fs::read(source)?;

        match String::from_utf8(bytes) {
            Ok(text) => {
                fs::write(target, format!("{}\n{}", self.header, text)).map_err(|source| {
                    ExtractError::Write {
                        path: target.to_path_buf(),
                        source,
                    }
                })?;
                Ok(CopyKind::Text)
            }
            Err(_) => {
                copy_verbatim(source, target)?;
                Ok(CopyKind::Binary)
            }
        }
    }
}

/// Byte-for-byte copy keeping permissions and timestamps
fn copy_verbatim(source: &Path, target: &Path) -> Result<()> {
    let to_write_error = |e| ExtractError::Write {
        path: target.to_path_buf(),
        source: e,
    };

    fs::copy(source, target).map_err(to_write_error)?;
    let metadata = fs::metadata(source)?;
    filetime::set_file_times(
        target,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(to_write_error)?;
    Ok(())
}

/// Single file name encoding a root-relative path, `src/app/main.py` -> `src-app-main.py`
pub fn flatten_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(&FLATTEN_CHAR.to_string())
}
