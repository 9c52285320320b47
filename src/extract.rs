/*!
 * One extraction run: codemap, flat copies and library reports
 *
 * The configuration is loaded once by the caller and handed in as
 * `IgnoreRules`, so scanning, mapping and copying apply identical
 * exclusions. Nothing in here reads or writes the settings file.
 */

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use indicatif::ProgressBar;

use crate::codemap::CodemapWriter;
use crate::collector::FileCollector;
use crate::ensure;
use crate::error::Result;
use crate::library::{LibraryReporter, LibraryResolver};
use crate::report::RunSummary;
use crate::rules::IgnoreRules;
use crate::scanner::Scanner;
use crate::types::{root_basename, run_output_dirs, RunLayout, RunRequest};

/// What a scan found under a root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Sorted extensions present and not ignored
    pub file_types: Vec<String>,
    /// Sorted top-level imported modules
    pub libraries: Vec<String>,
}

/// Scan `root` for file types and imported libraries
///
/// Earlier extractions into `output_dir` are left out when they live inside
/// the root.
pub fn discover(root: &Path, output_dir: &Path, rules: &IgnoreRules) -> Result<Discovery> {
    ensure!(
        root.is_dir(),
        PathNotFound,
        "Root directory not found: {}",
        root.display()
    );

    let skip = run_output_dirs(&output_dir.join(root_basename(root)), root);
    let scanner = Scanner::new(root, rules).skipping(&skip);

    Ok(Discovery {
        file_types: scanner.file_types(),
        libraries: scanner.imported_libraries(),
    })
}

/// Runs the extraction pipeline with a fixed set of rules
pub struct Extraction<'a, R: LibraryResolver + ?Sized> {
    rules: &'a IgnoreRules,
    resolver: &'a R,
    progress: Arc<ProgressBar>,
}

impl<'a, R: LibraryResolver + ?Sized> Extraction<'a, R> {
    /// Create a pipeline without visible progress
    pub fn new(rules: &'a IgnoreRules, resolver: &'a R) -> Self {
        Self {
            rules,
            resolver,
            progress: Arc::new(ProgressBar::hidden()),
        }
    }

    /// Report copy progress on `progress`
    pub fn with_progress(mut self, progress: Arc<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Produce the run artifacts for `request`
    ///
    /// `discovered_types` bounds the copy: a selected type that the scan
    /// did not report is never copied.
    pub fn run(
        &self,
        request: &RunRequest,
        discovered_types: &[String],
        generated_at: DateTime<Local>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let root = request.root.as_path();
        ensure!(
            root.is_dir(),
            PathNotFound,
            "Root directory not found: {}",
            root.display()
        );

        let layout = RunLayout::new(&request.output_dir, root, generated_at);
        layout.create()?;
        log::info!("Writing extraction to {}", layout.codebase_dir.display());

        let skip = run_output_dirs(&layout.top_level_dir, root);
        let reporter = LibraryReporter::new(self.resolver);
        let versions = reporter.versions(&request.libraries);

        CodemapWriter::new(root, self.rules)
            .skipping(&skip)
            .write_file(&layout.codemap_file, &versions)?;

        let copy = FileCollector::new(root, self.rules, Arc::clone(&self.progress), generated_at)
            .skipping(&skip)
            .collect(&layout.codebase_dir, discovered_types, &request.file_types);

        self.progress.set_prefix("📚 Libraries");
        let libraries = reporter.write_reports(&versions, &layout.libraries_dir, &layout.timestamp);

        Ok(RunSummary {
            layout,
            copy,
            libraries,
            duration: started.elapsed(),
        })
    }
}
