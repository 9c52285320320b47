/*!
 * Configuration handling for codemap-extract
 */

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ExtractError, Result};

/// Default name of the persisted settings file
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default name of the plain-text ignore rules file
pub const DEFAULT_IGNORE_FILE: &str = "ignored_patterns.txt";

/// Command-line arguments for codemap-extract
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "codemap-extract",
    version = env!("CARGO_PKG_VERSION"),
    about = "Snapshot a project into a codemap, flattened source copies and library reports",
    long_about = "Walks a project directory, writes an indented codemap of its structure, copies the selected file types into one flat timestamped folder and optionally documents the libraries the sources import. Inputs that are not given as flags are asked for interactively."
)]
pub struct Args {
    /// Root directory of the project to analyze
    #[clap(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Directory receiving the extraction
    #[clap(long, value_name = "DIR")]
    pub output: Option<String>,

    /// File types to copy: comma-separated indices or names, or `all`
    #[clap(long, value_name = "SELECTION")]
    pub types: Option<String>,

    /// Libraries to document: comma-separated indices or names, or `all`
    #[clap(long, value_name = "SELECTION")]
    pub libraries: Option<String>,

    /// Path to the JSON settings file
    #[clap(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the ignore rules file
    #[clap(long, value_name = "FILE", default_value = DEFAULT_IGNORE_FILE)]
    pub ignore_file: PathBuf,

    /// Never prompt; fall back to saved directories and default selections
    #[clap(long)]
    pub no_prompt: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence log output
    #[clap(short, long)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Settings persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory used by the previous run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_directory: Option<PathBuf>,

    /// Output directory used by the previous run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_output_directory: Option<PathBuf>,

    /// Extensions (with leading dot) excluded everywhere
    #[serde(default)]
    pub ignored_extensions: BTreeSet<String>,

    /// Folder glob patterns excluded everywhere
    #[serde(default)]
    pub ignored_folders: BTreeSet<String>,

    /// Directories searched for installed libraries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_paths: Vec<PathBuf>,

    /// Interpreter asked for its search path when `library_paths` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Keys this version does not know about, kept across a save
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ignore rules read from the plain-text rules file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnorePatterns {
    pub extensions: BTreeSet<String>,
    pub folders: BTreeSet<String>,
}

impl IgnorePatterns {
    /// Parse the rules file format: one rule per line, `#` comments,
    /// a leading `.` marks an extension rule
    pub fn parse(content: &str) -> Self {
        let mut patterns = Self::default();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('.') {
                patterns.extensions.insert(line.to_string());
            } else {
                patterns.folders.insert(line.to_string());
            }
        }

        patterns
    }

    /// Read the rules file, an absent file yields no rules
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No ignore rules file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let patterns = Self::parse(&content);
        log::debug!(
            "Loaded {} extension and {} folder rules from {}",
            patterns.extensions.len(),
            patterns.folders.len(),
            path.display()
        );
        Ok(patterns)
    }
}

impl Config {
    /// Parse settings leniently: empty or malformed content yields defaults
    pub fn parse_lenient(content: &str) -> Self {
        let content = content.trim();
        if content.is_empty() {
            log::warn!("Config file is empty. Creating a new configuration.");
            return Self::default();
        }

        match serde_json::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Error reading config file ({}). Creating a new configuration.",
                    e
                );
                Self::default()
            }
        }
    }

    /// Load settings from `config_file` and merge in the rules of `ignore_file`
    pub fn load(config_file: &Path, ignore_file: &Path) -> Result<Self> {
        let mut config = if config_file.exists() {
            Self::parse_lenient(&fs::read_to_string(config_file)?)
        } else {
            log::info!("Config file not found. Creating a new configuration.");
            Self::default()
        };

        config.merge_patterns(IgnorePatterns::load(ignore_file)?);
        Ok(config)
    }

    /// Union the given rules into this configuration
    pub fn merge_patterns(&mut self, patterns: IgnorePatterns) {
        self.ignored_extensions.extend(patterns.extensions);
        self.ignored_folders.extend(patterns.folders);
    }

    /// Render the settings as four-space indented JSON
    pub fn to_json(&self) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| ExtractError::Config(e.to_string()))
    }

    /// Write the settings to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let mut file = fs::File::create(path).map_err(|source| ExtractError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        writeln!(file, "{}", json)?;
        log::debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Remember the directories of a finished run
    pub fn remember_run(&mut self, root: &Path, output_dir: &Path) {
        self.last_directory = Some(root.to_path_buf());
        self.last_output_directory = Some(output_dir.to_path_buf());
    }
}
