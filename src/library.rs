/*!
 * Library reporting: version, install path and footprint of imported libraries
 *
 * Installed-package metadata (`*.dist-info`, `*.egg-info`) is consulted
 * first. Next the interpreter imports the module and reports its
 * `__version__`. Without a working interpreter, a module-level
 * `__version__` assignment is read from the module's origin file instead.
 * Locations and footprints are always resolved from the filesystem.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::error::{ExtractError, Result};
use crate::types::LibraryInfo;
use crate::utils::directory_footprint;

/// Version reported when no source knows it
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Interpreter probed for its search path when none is configured
pub const DEFAULT_PYTHON: &str = "python3";

const SEPARATOR_WIDTH: usize = 50;

// argv: module name, then directories to search before the default path
const IMPORT_VERSION_SCRIPT: &str = "import importlib, sys; \
sys.path[:0] = sys.argv[2:]; \
module = importlib.import_module(sys.argv[1]); \
print(getattr(module, '__version__', ''))";

static VERSION_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^__version__\s*(?::[^=]+)?=\s*['"]([^'"]+)['"]"#)
        .expect("version attribute pattern is valid")
});

/// Source of library metadata
pub trait LibraryResolver {
    /// Installed version of `name`, `Unknown` when unresolvable
    fn version(&self, name: &str) -> String;

    /// Install location and footprint, `None` when `name` has no origin
    fn locate(&self, name: &str) -> Option<LibraryInfo>;
}

/// Libraries installed in a set of Python search directories
#[derive(Debug, Clone, Default)]
pub struct PythonEnvironment {
    search_paths: Vec<PathBuf>,
    interpreter: Option<String>,
}

impl PythonEnvironment {
    /// Resolve against the given directories, in order, without an interpreter
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            interpreter: None,
        }
    }

    /// Import modules with `interpreter` to read their version
    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    /// Use configured `library_paths`, or probe the configured interpreter
    pub fn from_config(config: &Config) -> Self {
        let interpreter = config.python.as_deref().unwrap_or(DEFAULT_PYTHON);
        if !config.library_paths.is_empty() {
            return Self::new(config.library_paths.clone()).with_interpreter(interpreter);
        }

        match Self::probe(interpreter) {
            Some(paths) => Self::new(paths).with_interpreter(interpreter),
            None => Self::default(),
        }
    }

    /// Ask `interpreter` for its `sys.path`, `None` when it cannot be run
    pub fn probe(interpreter: &str) -> Option<Vec<PathBuf>> {
        let output = Command::new(interpreter)
            .args(["-c", "import sys; print('\\n'.join(p for p in sys.path if p))"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => {
                let paths: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(PathBuf::from)
                    .filter(|path| path.is_dir())
                    .collect();
                log::debug!("{} reported {} search paths", interpreter, paths.len());
                Some(paths)
            }
            Ok(output) => {
                log::warn!(
                    "{} exited with {}; libraries will not be resolved",
                    interpreter,
                    output.status
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "Could not run {} ({}); libraries will not be resolved",
                    interpreter,
                    e
                );
                None
            }
        }
    }

    /// File a module would be loaded from: package `__init__.py`, module
    /// source, or compiled extension
    pub fn origin(&self, name: &str) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|dir| {
            let init = dir.join(name).join("__init__.py");
            if init.is_file() {
                return Some(init);
            }

            let module = dir.join(format!("{}.py", name));
            if module.is_file() {
                return Some(module);
            }

            let prefix = format!("{}.", name);
            fs::read_dir(dir)
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .find(|path| {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    file_name.starts_with(&prefix)
                        && (file_name.ends_with(".so") || file_name.ends_with(".pyd"))
                        && path.is_file()
                })
        })
    }

    fn metadata_version(&self, name: &str) -> Option<String> {
        let wanted = normalize_name(name);

        self.search_paths.iter().find_map(|dir| {
            fs::read_dir(dir)
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .find_map(|path| {
                    let file_name = path.file_name()?.to_string_lossy().to_string();
                    let stem = file_name
                        .strip_suffix(".dist-info")
                        .or_else(|| file_name.strip_suffix(".egg-info"))?;
                    let (dist, rest) = stem.split_once('-')?;
                    if normalize_name(dist) != wanted {
                        return None;
                    }

                    read_metadata_version(&path).or_else(|| {
                        rest.split('-')
                            .next()
                            .filter(|v| !v.is_empty())
                            .map(str::to_string)
                    })
                })
        })
    }

    /// `__version__` of the module as imported by `interpreter`
    fn imported_version(&self, interpreter: &str, name: &str) -> Option<String> {
        let output = Command::new(interpreter)
            .arg("-c")
            .arg(IMPORT_VERSION_SCRIPT)
            .arg(name)
            .args(&self.search_paths)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .last()
                .map(str::trim)
                .filter(|version| !version.is_empty())
                .map(str::to_string),
            Ok(_) => {
                log::debug!("{} could not import {}", interpreter, name);
                None
            }
            Err(e) => {
                log::debug!("Could not run {} to import {}: {}", interpreter, name, e);
                None
            }
        }
    }

    fn attribute_version(&self, name: &str) -> Option<String> {
        let origin = self.origin(name)?;
        let source = fs::read_to_string(origin).ok()?;
        VERSION_ATTRIBUTE
            .captures(&source)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl LibraryResolver for PythonEnvironment {
    fn version(&self, name: &str) -> String {
        self.metadata_version(name)
            .or_else(|| {
                self.interpreter
                    .as_deref()
                    .and_then(|interpreter| self.imported_version(interpreter, name))
            })
            .or_else(|| self.attribute_version(name))
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    fn locate(&self, name: &str) -> Option<LibraryInfo> {
        let origin = self.origin(name)?;
        let path = origin.parent()?.to_path_buf();
        let (file_count, total_size) = directory_footprint(&path);

        Some(LibraryInfo {
            path,
            file_count,
            total_size,
        })
    }
}

/// `Version:` header of a METADATA / PKG-INFO file (or egg-info file)
fn read_metadata_version(path: &Path) -> Option<String> {
    let metadata_file = if path.is_dir() {
        ["METADATA", "PKG-INFO"]
            .iter()
            .map(|name| path.join(name))
            .find(|candidate| candidate.is_file())?
    } else {
        path.to_path_buf()
    };

    let content = fs::read_to_string(metadata_file).ok()?;
    content
        .lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| line.strip_prefix("Version:"))
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
}

/// Case-insensitive name with `-`, `_` and `.` treated alike
fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(['-', '.'], "_")
}

/// Outcome of writing the library reports of a run
#[derive(Debug, Clone, Default)]
pub struct LibraryReportStats {
    /// Report files written
    pub written: Vec<PathBuf>,
    /// Libraries without a resolvable origin
    pub skipped: Vec<String>,
    /// Libraries whose report could not be written
    pub failed: Vec<(String, String)>,
}

/// Writes one report file per resolvable library
pub struct LibraryReporter<'a, R: LibraryResolver + ?Sized> {
    resolver: &'a R,
}

impl<'a, R: LibraryResolver + ?Sized> LibraryReporter<'a, R> {
    /// Create a reporter backed by `resolver`
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Pair each library with its resolved version
    pub fn versions(&self, libraries: &[String]) -> Vec<(String, String)> {
        libraries
            .iter()
            .map(|name| (name.clone(), self.resolver.version(name)))
            .collect()
    }

    /// Write a report for every library in `versioned` into `dir`
    pub fn write_reports(
        &self,
        versioned: &[(String, String)],
        dir: &Path,
        timestamp: &str,
    ) -> LibraryReportStats {
        let mut stats = LibraryReportStats::default();

        for (name, version) in versioned {
            let Some(info) = self.resolver.locate(name) else {
                log::info!("No installed origin for {}; report skipped", name);
                stats.skipped.push(name.clone());
                continue;
            };

            let path = dir.join(report_file_name(name, version, timestamp));
            match write_report(&path, name, version, &info) {
                Ok(()) => {
                    log::debug!("Wrote library report {}", path.display());
                    stats.written.push(path);
                }
                Err(e) => {
                    log::warn!("Error writing report for {}: {}", name, e);
                    stats.failed.push((name.clone(), e.to_string()));
                }
            }
        }

        stats
    }
}

fn write_report(path: &Path, name: &str, version: &str, info: &LibraryInfo) -> Result<()> {
    fs::write(path, render_report(name, version, info)).map_err(|source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// `<name>(v<version>)<timestamp>.txt`
pub fn report_file_name(name: &str, version: &str, timestamp: &str) -> String {
    format!("{}(v{}){}.txt", name, version, timestamp)
}

/// Text of a single library report
pub fn render_report(name: &str, version: &str, info: &LibraryInfo) -> String {
    format!(
        "{} (v{})\nPath: {}\nNumber of files: {}\nTotal size: {} KB\n\n{}\n\n",
        name,
        version,
        info.path.display(),
        info.file_count,
        info.total_size / 1024,
        "*".repeat(SEPARATOR_WIDTH)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn site_packages() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let site = dir.path();

        fs::create_dir_all(site.join("requests")).unwrap();
        fs::write(site.join("requests/__init__.py"), "from .api import get\n").unwrap();
        fs::write(site.join("requests/api.py"), vec![b'x'; 2048]).unwrap();
        fs::create_dir_all(site.join("requests-2.31.0.dist-info")).unwrap();
        fs::write(
            site.join("requests-2.31.0.dist-info/METADATA"),
            "Metadata-Version: 2.1\nName: requests\nVersion: 2.31.0\n\nBody\nVersion: 9\n",
        )
        .unwrap();

        fs::create_dir_all(site.join("yaml")).unwrap();
        fs::write(site.join("yaml/__init__.py"), "__version__ = '6.0.1'\n").unwrap();

        fs::write(site.join("six.py"), "__version__: str = \"1.16.0\"\n").unwrap();

        fs::create_dir_all(site.join("typing_extensions-4.9.0.dist-info")).unwrap();

        fs::create_dir_all(site.join("namespace_only")).unwrap();
        dir
    }

    #[test]
    fn version_prefers_installed_metadata() {
        let site = site_packages();
        let env = PythonEnvironment::new(vec![site.path().to_path_buf()]);
        assert_eq!(env.version("requests"), "2.31.0");
    }

    #[test]
    fn version_falls_back_to_dir_name_then_attribute() {
        let site = site_packages();
        let env = PythonEnvironment::new(vec![site.path().to_path_buf()]);
        assert_eq!(env.version("typing-extensions"), "4.9.0");
        assert_eq!(env.version("yaml"), "6.0.1");
        assert_eq!(env.version("six"), "1.16.0");
        assert_eq!(env.version("nothing_here"), UNKNOWN_VERSION);
    }

    #[test]
    fn locate_walks_the_containing_directory() {
        let site = site_packages();
        let env = PythonEnvironment::new(vec![site.path().to_path_buf()]);

        let info = env.locate("requests").unwrap();
        assert_eq!(info.path, site.path().join("requests"));
        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 2048 + "from .api import get\n".len() as u64);

        assert!(env.locate("namespace_only").is_none());
        assert!(env.locate("missing").is_none());
    }

    #[test]
    fn unavailable_interpreter_gives_no_paths() {
        assert!(PythonEnvironment::probe("definitely-not-a-python-binary").is_none());
    }

    #[test]
    fn configured_paths_skip_the_probe_but_keep_the_interpreter() {
        let config = Config {
            library_paths: vec![PathBuf::from("/opt/site")],
            python: Some("python3.11".to_string()),
            ..Config::default()
        };
        let env = PythonEnvironment::from_config(&config);
        assert_eq!(env.search_paths, vec![PathBuf::from("/opt/site")]);
        assert_eq!(env.interpreter.as_deref(), Some("python3.11"));

        let config = Config {
            python: Some("definitely-not-a-python-binary".to_string()),
            ..Config::default()
        };
        let env = PythonEnvironment::from_config(&config);
        assert!(env.search_paths.is_empty());
        assert!(env.interpreter.is_none());
    }

    #[test]
    fn version_imports_the_module_to_follow_reexports() {
        // Needs a Python interpreter on PATH
        if PythonEnvironment::probe(DEFAULT_PYTHON).is_none() {
            return;
        }

        let dir = tempdir().unwrap();
        let package = dir.path().join("reexporting_pkg");
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join("__init__.py"),
            "from ._version import __version__\n",
        )
        .unwrap();
        fs::write(package.join("_version.py"), "__version__ = '3.2.1'\n").unwrap();

        let static_only = PythonEnvironment::new(vec![dir.path().to_path_buf()]);
        assert_eq!(static_only.version("reexporting_pkg"), UNKNOWN_VERSION);

        let env = static_only.with_interpreter(DEFAULT_PYTHON);
        assert_eq!(env.version("reexporting_pkg"), "3.2.1");
    }

    #[test]
    fn broken_interpreter_falls_back_to_reading_the_source() {
        let site = site_packages();
        let env = PythonEnvironment::new(vec![site.path().to_path_buf()])
            .with_interpreter("definitely-not-a-python-binary");
        assert_eq!(env.version("yaml"), "6.0.1");
        assert_eq!(env.version("nothing_here"), UNKNOWN_VERSION);
    }

    #[test]
    fn report_text_and_name() {
        let info = LibraryInfo {
            path: PathBuf::from("/site/requests"),
            file_count: 12,
            total_size: 5000,
        };
        assert_eq!(
            render_report("requests", "2.31.0", &info),
            format!(
                "requests (v2.31.0)\nPath: /site/requests\nNumber of files: 12\nTotal size: 4 KB\n\n{}\n\n",
                "*".repeat(50)
            )
        );
        assert_eq!(
            report_file_name("requests", "2.31.0", "2024.01.02_03.04.05"),
            "requests(v2.31.0)2024.01.02_03.04.05.txt"
        );
    }

    #[test]
    fn unresolvable_libraries_are_skipped() {
        let site = site_packages();
        let out = tempdir().unwrap();
        let env = PythonEnvironment::new(vec![site.path().to_path_buf()]);
        let reporter = LibraryReporter::new(&env);

        let versioned = reporter.versions(&["requests".to_string(), "ghost".to_string()]);
        let stats = reporter.write_reports(&versioned, out.path(), "ts");

        assert_eq!(stats.written, vec![out.path().join("requests(v2.31.0)ts.txt")]);
        assert_eq!(stats.skipped, vec!["ghost".to_string()]);
        assert!(stats.failed.is_empty());
    }
}
