use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

use crate::report::ReportConvertBuilder;
use crate::spec::{ConvertFolderError, EnumConvertFileConflictStrategy, EnumConvertPatternMode};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeConvertPatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

impl TypeConvertPatternSeq {
    /// Compile discovery patterns; every mode matches case-insensitively.
    pub(crate) fn from_raw(
        patterns: &[String],
        rule_pattern: EnumConvertPatternMode,
    ) -> Result<Self, ConvertFolderError> {
        if patterns.is_empty() {
            return Err(ConvertFolderError::InvalidPattern(
                "At least one discovery pattern is required.".to_string(),
            ));
        }

        match rule_pattern {
            EnumConvertPatternMode::Literal => Ok(Self::Literal(
                patterns.iter().map(|p| p.to_lowercase()).collect(),
            )),
            EnumConvertPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = GlobBuilder::new(pattern)
                        .case_insensitive(true)
                        .literal_separator(true)
                        .build()
                        .map_err(|e| {
                            ConvertFolderError::InvalidPattern(format!(
                                "Invalid discovery pattern: {e}"
                            ))
                        })?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                Ok(Self::Glob(l_glob))
            }
            EnumConvertPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            ConvertFolderError::InvalidPattern(format!(
                                "Invalid discovery pattern: {e}"
                            ))
                        })?;
                    l_regex.push(regex);
                }
                Ok(Self::Regex(l_regex))
            }
        }
    }

    pub(crate) fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Literal(v) => {
                let c_name = name.to_lowercase();
                v.iter().any(|p| c_name.contains(p.as_str()))
            }
            Self::Glob(v) => v.iter().any(|p| p.is_match(name)),
            Self::Regex(v) => v.iter().any(|p| p.is_match(name)),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Output path: `dir_out / (prefix + file name)`.
pub(crate) fn derive_output_path(path_dir_out: &Path, name_file: &str, prefix: &str) -> PathBuf {
    path_dir_out.join(format!("{prefix}{name_file}"))
}

pub(crate) fn should_skip_file_conflict(
    path_dst: &Path,
    rule_conflict: EnumConvertFileConflictStrategy,
    builder_cv_report: &mut ReportConvertBuilder,
) -> bool {
    if !path_dst.exists() {
        return false;
    }
    if path_dst.is_dir() {
        builder_cv_report.add_error(
            path_dst.to_path_buf(),
            format!("Destination is a directory: {}", path_dst.display()),
        );
        return true;
    }

    match rule_conflict {
        EnumConvertFileConflictStrategy::Skip => {
            builder_cv_report.add_skipped();
            true
        }
        EnumConvertFileConflictStrategy::Error => {
            builder_cv_report.add_error(
                path_dst.to_path_buf(),
                format!("Destination exists: {}", path_dst.display()),
            );
            true
        }
        EnumConvertFileConflictStrategy::Overwrite => false,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Workers

/// Resolve the worker count: requested value capped by available cores.
pub(crate) fn calculate_worker_limit(num_workers_max: Option<usize>) -> usize {
    let n_cpu = std::thread::available_parallelism()
        .map(|v| v.get())
        .unwrap_or(1);

    match num_workers_max {
        Some(n) => n.clamp(1, n_cpu),
        None => n_cpu.clamp(1, 8),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
