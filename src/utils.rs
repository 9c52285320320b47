/*!
 * Utility functions for codemap-extract
 */

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::rules::IgnoreRules;
use crate::types::root_basename;

/// Sorted, rule-aware traversal of a scan root
///
/// Every traversal of a run goes through this type so that scanning,
/// mapping and copying see exactly the same set of entries.
pub struct TreeWalker<'a> {
    root: &'a Path,
    root_name: String,
    rules: &'a IgnoreRules,
    skip: Vec<PathBuf>,
}

impl<'a> TreeWalker<'a> {
    /// Walk `root`, excluding whatever `rules` exclude
    pub fn new(root: &'a Path, rules: &'a IgnoreRules) -> Self {
        Self {
            root,
            root_name: root_basename(root),
            rules,
            skip: Vec::new(),
        }
    }

    /// Also prune those of `dirs` that exist inside the root (the run's own output)
    pub fn skipping(mut self, dirs: &[PathBuf]) -> Self {
        let Ok(root) = fs::canonicalize(self.root) else {
            return self;
        };

        self.skip = dirs
            .iter()
            .filter_map(|dir| fs::canonicalize(dir).ok())
            .filter_map(|dir| {
                dir.strip_prefix(&root)
                    .ok()
                    .filter(|rel| !rel.as_os_str().is_empty())
                    .map(Path::to_path_buf)
            })
            .collect();
        self
    }

    /// Path of `path` relative to the root
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(self.root).unwrap_or(path)
    }

    /// Whether the entry at `path` is pruned
    pub fn is_excluded(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        if relative.as_os_str().is_empty() {
            return false;
        }

        if self.skip.iter().any(|skip| relative == skip) {
            return true;
        }

        self.rules.is_ignored_path(&self.root_name, relative)
    }

    /// All retained entries below the root, depth first, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = DirEntry> + '_ {
        WalkDir::new(self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded(entry.path()))
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
    }

    /// Retained regular files (symlinks to files included)
    pub fn files(&self) -> impl Iterator<Item = DirEntry> + '_ {
        self.entries().filter(|entry| entry.path().is_file())
    }
}

/// Extension of `path` with its leading dot, `None` for dot-files and bare names
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
}

/// Number of files and total bytes below `dir`
pub fn directory_footprint(dir: &Path) -> (u64, u64) {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .fold((0, 0), |(count, size), entry| {
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            (count + 1, size + len)
        })
}

/// Expand a leading `~` to the home directory
pub fn expand_home(input: &str) -> PathBuf {
    if input == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(input)
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn extension_uses_last_dot() {
        assert_eq!(file_extension(Path::new("a/b.py")), Some(".py".to_string()));
        assert_eq!(file_extension(Path::new("x.tar.gz")), Some(".gz".to_string()));
        assert_eq!(file_extension(Path::new(".bashrc")), None);
        assert_eq!(file_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn walker_prunes_ignored_directories_and_output() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("build/deep")).unwrap();
        fs::create_dir_all(root.join("out/proj")).unwrap();
        fs::write(root.join("src/a.py"), "x").unwrap();
        fs::write(root.join("build/deep/b.py"), "x").unwrap();
        fs::write(root.join("out/proj/c.py"), "x").unwrap();

        let rules = IgnoreRules::new(Vec::<String>::new(), ["*/build*"]).unwrap();
        let output = root.join("out/proj");
        let walker = TreeWalker::new(root, &rules).skipping(&[output]);

        let files: Vec<PathBuf> = walker
            .files()
            .map(|e| walker.relative(e.path()).to_path_buf())
            .collect();
        assert_eq!(files, vec![PathBuf::from("src/a.py")]);
    }

    #[test]
    fn footprint_counts_nested_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg/sub")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), vec![b'a'; 100]).unwrap();
        fs::write(dir.path().join("pkg/sub/m.py"), vec![b'b'; 24]).unwrap();

        assert_eq!(directory_footprint(&dir.path().join("pkg")), (2, 124));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }
}
