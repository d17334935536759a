//! Shared sheet specification models, options and error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// One normalized row: positionally meaningful text fields.
pub type TypeRecord = Vec<String>;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Immutable cell format descriptor shared by the xlsx and xls backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Horizontal alignment (`left`, `center`, `right`).
    pub align: Option<String>,
    /// Border style for all sides (`0` none, `1` thin, `2` medium, `5` thick).
    pub border: Option<i64>,
    /// Border color for all sides, `#RRGGBB`.
    pub border_color: Option<String>,
    /// Solid background fill color, `#RRGGBB`.
    pub bg_color: Option<String>,
    /// Font color, `#RRGGBB`.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            border: other.border.or(self.border),
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// The three row styles of one exported sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStyleSheet {
    /// Header row format.
    pub fmt_header: SpecCellFormat,
    /// Data row format when the row is not flagged.
    pub fmt_normal: SpecCellFormat,
    /// Data row format when the row is flagged.
    pub fmt_highlight: SpecCellFormat,
}

/// Style key attached to each planned row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumRowStyle {
    /// Bold header row.
    Header,
    /// Bordered data row.
    Normal,
    /// Flagged data row.
    Highlight,
}

impl SpecStyleSheet {
    /// Resolve a row style key into its format descriptor.
    pub fn format_of(&self, style: EnumRowStyle) -> &SpecCellFormat {
        match style {
            EnumRowStyle::Header => &self.fmt_header,
            EnumRowStyle::Normal => &self.fmt_normal,
            EnumRowStyle::Highlight => &self.fmt_highlight,
        }
    }
}

/// Typed cell value decided by the write-direction classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Empty text, written as a styled blank.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatSelection

/// Workbook container formats the core can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSheetFormat {
    /// Legacy BIFF8 workbook.
    Xls,
    /// Office Open XML workbook.
    Xlsx,
}

impl EnumSheetFormat {
    /// Pick the format from a path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, SheetIoError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "xls" => Ok(Self::Xls),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(SheetIoError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    /// Maximum number of rows one worksheet can hold.
    pub fn n_rows_max(self) -> usize {
        match self {
            Self::Xls => crate::conf::N_NROWS_XLS_MAX,
            Self::Xlsx => crate::conf::N_NROWS_XLSX_MAX,
        }
    }

    /// Maximum number of columns one worksheet can hold.
    pub fn n_cols_max(self) -> usize {
        match self {
            Self::Xls => crate::conf::N_NCOLS_XLS_MAX,
            Self::Xlsx => crate::conf::N_NCOLS_XLSX_MAX,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordLayout

/// Where one record field takes its text from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumFieldSource {
    /// Zero-based source column.
    Column(usize),
    /// Several source columns joined by `sep`, then trimmed.
    Joined {
        /// Source columns in join order.
        cols: Vec<usize>,
        /// Separator placed between values.
        sep: String,
    },
}

/// One named field of the normalized record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRecordField {
    /// Stable field identifier.
    pub name: String,
    /// Source of the field text.
    pub source: EnumFieldSource,
}

/// Ordered projection from a source row to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRecordLayout {
    /// Record fields in output order.
    pub fields: Vec<SpecRecordField>,
}

impl SpecRecordLayout {
    /// Number of fields each record carries.
    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

impl Default for SpecRecordLayout {
    fn default() -> Self {
        crate::conf::derive_default_record_layout()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RankAndHighlight

/// Sort direction of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// One entry of the composite sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecSortKey {
    /// Record field index compared by this key.
    pub idx_field: usize,
    /// Direction of the comparison.
    pub rule_direction: EnumSortDirection,
    /// Compare with exact case when `true`.
    pub if_case_sensitive: bool,
}

/// Row highlight rule: flag rows whose field is a number below `thr_below`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecHighlightRule {
    /// Record field index holding the score.
    pub idx_field: usize,
    /// Strict upper bound of flagged values.
    pub thr_below: f64,
}

impl Default for SpecHighlightRule {
    fn default() -> Self {
        Self {
            idx_field: crate::conf::N_IDX_FIELD_SCORE,
            thr_below: crate::conf::N_SCORE_THRESHOLD_DEFAULT,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReadWriteOptions

/// Options of the record extractor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReadOptions {
    /// Source-to-record projection.
    pub layout: SpecRecordLayout,
}

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy for one write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            width_cell_min: 6,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Options of the spreadsheet writer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetWriteOptions {
    /// Worksheet name (sanitized before use).
    pub sheet_name: String,
    /// Number of leading record fields written per row.
    pub n_cols: usize,
    /// Composite sort key applied before writing.
    pub sort_keys: Vec<SpecSortKey>,
    /// Row highlight rule.
    pub highlight: SpecHighlightRule,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Header/normal/highlight formats.
    pub styles: SpecStyleSheet,
}

impl Default for SpecSheetWriteOptions {
    fn default() -> Self {
        crate::conf::derive_default_sheet_write_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PlanAndReport

/// One planned output row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPlannedRow {
    /// Style applied to every cell of the row.
    pub style: EnumRowStyle,
    /// Typed cell values, left to right.
    pub cells: Vec<EnumCellValue>,
}

/// Backend-independent description of one output sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetPlan {
    /// Sanitized worksheet name.
    pub sheet_name: String,
    /// Header row (if any) followed by data rows.
    pub rows: Vec<SpecPlannedRow>,
    /// Final width of each written column, in character units.
    pub widths_by_col: Vec<usize>,
    /// Formats referenced by the row styles.
    pub styles: SpecStyleSheet,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReport {
    /// Output workbook path.
    pub path: PathBuf,
    /// Number of header rows written (0 or 1).
    pub n_rows_header: usize,
    /// Number of data rows written.
    pub n_rows_data: usize,
    /// Number of data rows written with the highlight style.
    pub n_rows_highlighted: usize,
    /// Final column widths.
    pub widths_by_col: Vec<usize>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecSheetReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Failures of one read or write call.
#[derive(Debug, Error)]
pub enum SheetIoError {
    /// Path extension is not a supported workbook format.
    #[error("Unsupported spreadsheet format {extension:?} for {path}; use .xls or .xlsx")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Lower-cased extension (empty when missing).
        extension: String,
    },
    /// File cannot be opened, decoded, created or written.
    #[error("I/O failure on {path}: {message}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Too many rows for the target format.
    #[error("{path}: {n_rows} rows exceed the format limit of {n_rows_max}")]
    RowLimitExceeded {
        /// Output path.
        path: PathBuf,
        /// Rows requested.
        n_rows: usize,
        /// Rows allowed by the format.
        n_rows_max: usize,
    },
    /// Option values rejected before any work started.
    #[error("{0}")]
    InvalidOptions(String),
}

impl SheetIoError {
    /// Build an `Io` error from any displayable source.
    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Path the error refers to, when it has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::UnsupportedFormat { path, .. }
            | Self::Io { path, .. }
            | Self::RowLimitExceeded { path, .. } => Some(path),
            Self::InvalidOptions(_) => None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{EnumSheetFormat, SheetIoError, SpecCellFormat};

    #[test]
    fn sheet_format_from_extension_is_case_insensitive() {
        assert_eq!(
            EnumSheetFormat::from_path(Path::new("a/b.XLSX")).expect("xlsx"),
            EnumSheetFormat::Xlsx
        );
        assert_eq!(
            EnumSheetFormat::from_path(Path::new("b.xls")).expect("xls"),
            EnumSheetFormat::Xls
        );
    }

    #[test]
    fn sheet_format_rejects_csv_and_macro_workbooks() {
        for name in ["scores.csv", "scores.xlsm", "scores.xlsb", "scores"] {
            let err = EnumSheetFormat::from_path(Path::new(name)).expect_err("must fail");
            assert!(matches!(err, SheetIoError::UnsupportedFormat { .. }));
            assert_eq!(err.path(), Some(Path::new(name)));
        }
    }

    #[test]
    fn cell_format_merge_prefers_patch_values() {
        let base = SpecCellFormat {
            border: Some(1),
            bold: Some(false),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#FF0000".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.border, Some(1));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color.as_deref(), Some("#FF0000"));
    }
}
