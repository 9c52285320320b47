/*!
 * Codemap writer: indented text tree of a project directory
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};
use crate::rules::IgnoreRules;
use crate::utils::{file_extension, TreeWalker};

const GUIDE: &str = "│   ";
const BRANCH: &str = "├── ";

/// Renders the codemap of a root directory
pub struct CodemapWriter<'a> {
    walker: TreeWalker<'a>,
    rules: &'a IgnoreRules,
}

impl<'a> CodemapWriter<'a> {
    /// Create a writer for `root`
    pub fn new(root: &'a Path, rules: &'a IgnoreRules) -> Self {
        Self {
            walker: TreeWalker::new(root, rules),
            rules,
        }
    }

    /// Prune those of `dirs` that lie inside the root from the map
    pub fn skipping(mut self, dirs: &[PathBuf]) -> Self {
        self.walker = self.walker.skipping(dirs);
        self
    }

    /// Write the tree followed by the included libraries
    ///
    /// `libraries` pairs each selected library with its resolved version.
    pub fn write_to<W: Write>(&self, out: &mut W, libraries: &[(String, String)]) -> io::Result<()> {
        self.write_tree(out)?;

        writeln!(out)?;
        writeln!(out, "Included Libraries:")?;
        for (name, version) in libraries {
            writeln!(out, "{} (v{})", name, version)?;
        }

        Ok(())
    }

    /// Write the codemap into `path`
    pub fn write_file(&self, path: &Path, libraries: &[(String, String)]) -> Result<()> {
        let to_write_error = |source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(to_write_error)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, libraries)
            .and_then(|_| writer.flush())
            .map_err(to_write_error)?;

        log::info!("Wrote codemap to {}", path.display());
        Ok(())
    }

    fn write_tree<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for entry in self.walker.entries() {
            let name = entry.file_name().to_string_lossy();
            let indent = GUIDE.repeat(entry.depth() - 1);

            if entry.path().is_dir() {
                writeln!(out, "{}{}{}/", indent, BRANCH, name)?;
            } else {
                let hidden = file_extension(entry.path())
                    .map_or(false, |ext| self.rules.is_ignored_extension(&ext));
                if !hidden {
                    writeln!(out, "{}{}{}", indent, BRANCH, name)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn render(root: &Path, rules: &IgnoreRules, libraries: &[(String, String)]) -> String {
        let mut out = Vec::new();
        CodemapWriter::new(root, rules)
            .write_to(&mut out, libraries)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nested_entries_are_sorted_and_indented() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::write(root.join("src/util/io.py"), "").unwrap();
        fs::write(root.join("src/main.py"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();

        let text = render(root, &IgnoreRules::empty(), &[]);

        assert_eq!(
            text,
            "├── README.md\n\
             ├── src/\n\
             │   ├── main.py\n\
             │   ├── util/\n\
             │   │   ├── io.py\n\
             \n\
             Included Libraries:\n"
        );
    }

    #[test]
    fn ignored_extensions_hide_files_but_not_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("logs.log")).unwrap();
        fs::write(root.join("run.log"), "").unwrap();
        fs::write(root.join("app.py"), "").unwrap();

        let rules = IgnoreRules::new([".log"], Vec::<String>::new()).unwrap();
        let text = render(root, &rules, &[]);

        assert!(text.contains("├── app.py\n"));
        assert!(text.contains("├── logs.log/\n"));
        assert!(!text.contains("run.log"));
    }

    #[test]
    fn libraries_are_listed_after_the_tree() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "").unwrap();

        let libraries = vec![
            ("requests".to_string(), "2.31.0".to_string()),
            ("os".to_string(), "Unknown".to_string()),
        ];
        let text = render(dir.path(), &IgnoreRules::empty(), &libraries);

        assert!(text.ends_with("\nIncluded Libraries:\nrequests (v2.31.0)\nos (vUnknown)\n"));
    }
}
