//! Conversion specification models and top-level error types.

use std::path::PathBuf;

use examkit_io_sheet::{SpecSheetReadOptions, SpecSheetWriteOptions};
use thiserror::Error;

use crate::conf::{N_WORKERS_DEFAULT, derive_default_batch_headers, derive_default_patterns};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing output file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumConvertFileConflictStrategy {
    /// Keep the existing output and skip the source file.
    Skip,
    /// Replace the existing output.
    #[default]
    Overwrite,
    /// Record an error and skip the source file.
    Error,
}

/// Pattern matching mode for discovery patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumConvertPatternMode {
    /// Shell-like wildcards, case-insensitive.
    #[default]
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Case-insensitive substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `convert_folder`.
#[derive(Debug, Clone)]
pub struct SpecConvertOptions {
    /// Basename patterns selecting source files.
    pub patterns_include_files: Vec<String>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumConvertPatternMode,
    /// Prefix prepended to each output file name.
    pub prefix_file_out: String,
    /// Header row labels; `None` writes no header row.
    pub headers: Option<Vec<String>>,
    /// Record extraction options.
    pub read_options: SpecSheetReadOptions,
    /// Sheet writer options.
    pub write_options: SpecSheetWriteOptions,
    /// Conflict behavior for existing output files.
    pub rule_conflict_file: EnumConvertFileConflictStrategy,
    /// Maximum worker threads for the conversion stage.
    pub num_workers_max: Option<usize>,
    /// Do not write anything; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecConvertOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: derive_default_patterns(),
            rule_pattern: EnumConvertPatternMode::Glob,
            prefix_file_out: crate::conf::C_PREFIX_FILE_OUT_DEFAULT.to_string(),
            headers: Some(derive_default_batch_headers()),
            read_options: SpecSheetReadOptions::default(),
            write_options: SpecSheetWriteOptions::default(),
            rule_conflict_file: EnumConvertFileConflictStrategy::Overwrite,
            num_workers_max: Some(N_WORKERS_DEFAULT),
            if_dry_run: false,
        }
    }
}

/// One conversion failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConvertError {
    /// Failed source or output path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
#[derive(Debug, Error)]
pub enum ConvertFolderError {
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Invalid discovery pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Option values rejected before any work started.
    #[error("{0}")]
    InvalidOptions(String),
    /// Source directory listing failed.
    #[error("Failed to read directory {}: {message}", .path.display())]
    ReadDirFailed {
        /// Directory that could not be listed.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
