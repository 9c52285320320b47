/*!
 * Directory scanning: file types and imported libraries
 *
 * Import discovery is a line-oriented heuristic, not a parser. Only
 * statements starting at column 0 are seen, so imports nested in
 * conditionals or split across lines are missed without error.
 */

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::rules::IgnoreRules;
use crate::utils::{file_extension, TreeWalker};

/// Suffixes of files read during import discovery
pub const SOURCE_SUFFIXES: &[&str] = &[".py"];

/// Read-only scanner over a project root
pub struct Scanner<'a> {
    walker: TreeWalker<'a>,
    rules: &'a IgnoreRules,
}

impl<'a> Scanner<'a> {
    /// Create a scanner for `root`
    pub fn new(root: &'a Path, rules: &'a IgnoreRules) -> Self {
        Self {
            walker: TreeWalker::new(root, rules),
            rules,
        }
    }

    /// Prune those of `dirs` that lie inside the root from the scan
    pub fn skipping(mut self, dirs: &[PathBuf]) -> Self {
        self.walker = self.walker.skipping(dirs);
        self
    }

    /// Sorted extensions present under the root and not ignored
    pub fn file_types(&self) -> Vec<String> {
        let types: BTreeSet<String> = self
            .walker
            .files()
            .filter_map(|entry| file_extension(entry.path()))
            .filter(|ext| !self.rules.is_ignored_extension(ext))
            .collect();

        log::debug!("Discovered {} file types", types.len());
        types.into_iter().collect()
    }

    /// Sorted top-level modules imported by the source files under the root
    pub fn imported_libraries(&self) -> Vec<String> {
        let mut libraries = BTreeSet::new();

        for entry in self.walker.files() {
            let Some(ext) = file_extension(entry.path()) else {
                continue;
            };
            if !SOURCE_SUFFIXES.contains(&ext.as_str()) || self.rules.is_ignored_extension(&ext) {
                continue;
            }

            // Undecodable files contribute nothing
            match fs::read_to_string(entry.path()) {
                Ok(content) => libraries.extend(content.lines().flat_map(parse_import_line)),
                Err(e) => log::debug!("Skipping imports of {}: {}", entry.path().display(), e),
            }
        }

        log::debug!("Discovered {} imported libraries", libraries.len());
        libraries.into_iter().collect()
    }
}

/// Top-level module names introduced by a single source line
///
/// `import a.b, c as d` yields `a` and `c`, `from a.b import x` yields `a`.
/// Relative imports yield nothing.
pub fn parse_import_line(line: &str) -> Vec<String> {
    if let Some(rest) = line.strip_prefix("import ") {
        let statement = rest.split('#').next().unwrap_or_default();
        statement
            .split(',')
            .filter_map(|clause| clause.split_whitespace().next())
            .filter_map(top_level_module)
            .collect()
    } else if let Some(rest) = line.strip_prefix("from ") {
        rest.split_whitespace()
            .next()
            .and_then(top_level_module)
            .into_iter()
            .collect()
    } else {
        Vec::new()
    }
}

fn top_level_module(dotted: &str) -> Option<String> {
    let head = dotted.split('.').next()?;
    is_identifier(head).then(|| head.to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
