//! Ignore rules shared by every traversal of a run
//!
//! Folder patterns are fnmatch-style globs: `*` also crosses `/` and braces
//! are literal characters. A path is tested in two spellings, relative to
//! the scan root (`src/build`) and anchored at the root's own name
//! (`proj/src/build`), so that patterns such as `*/build*` prune a
//! top-level `build/` without ever matching the directories above the scan
//! root. A pattern that cannot be compiled is logged and skipped.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::Config;
use crate::error::Result;

/// Compiled extension and folder exclusions
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    extensions: BTreeSet<String>,
    folders: GlobSet,
}

impl IgnoreRules {
    /// Compile the given rules
    pub fn new<E, F>(extensions: E, folders: F) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let extensions = extensions.into_iter().map(Into::into).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in folders.into_iter().map(Into::into) {
            match GlobBuilder::new(&literal_braces(&pattern))
                .literal_separator(false)
                .build()
            {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => log::warn!("Skipping ignore pattern '{}': {}", pattern, e),
            }
        }

        Ok(Self {
            extensions,
            folders: builder.build()?,
        })
    }

    /// Compile the rules carried by a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.ignored_extensions.iter().cloned(),
            config.ignored_folders.iter().cloned(),
        )
    }

    /// Rules that exclude nothing
    pub fn empty() -> Self {
        Self {
            extensions: BTreeSet::new(),
            folders: GlobSet::empty(),
        }
    }

    /// Whether `extension` (with its leading dot) is excluded
    pub fn is_ignored_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Whether the entry at `relative` below a root named `root_name` is excluded
    pub fn is_ignored_path(&self, root_name: &str, relative: &Path) -> bool {
        if self.folders.is_empty() {
            return false;
        }

        let relative = slash_path(relative);
        if relative.is_empty() {
            return false;
        }

        self.folders.is_match(&relative)
            || self.folders.is_match(format!("{}/{}", root_name, relative))
    }
}

/// Escape `{` and `}`, which fnmatch has no alternation for
fn literal_braces(pattern: &str) -> String {
    pattern.replace('{', "[{]").replace('}', "[}]")
}

/// Join the normal components of `path` with `/`
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
