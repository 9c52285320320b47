//! Global error handling for codemap-extract
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::prompt::SelectionError;

/// Global error type for codemap-extract operations
#[derive(Error, Debug)]
pub enum ExtractError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failure while writing a specific output file
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failure while creating an output directory
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid ignore pattern
    #[error("Glob error: {0}")]
    Glob(#[from] globset::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator selection could not be interpreted
    #[error("Invalid selection: {0}")]
    Selection(#[from] SelectionError),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Specialized Result type for codemap-extract operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Creates an ExtractError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ExtractError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

impl ExtractError {
    /// Exit code used by the binary for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Glob(_) => 1,
            Self::Io(_) | Self::Write { .. } | Self::CreateDir { .. } => 2,
            Self::PathNotFound(_) => 3,
            Self::InvalidArgument(_) | Self::Selection(_) => 5,
        }
    }
}
