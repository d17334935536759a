//! `examkit_io_sheet` v1:
//! Exam-result spreadsheet kernel.
//!
//! Reads the first worksheet of an `.xls`/`.xlsx` workbook into records,
//! ranks them, flags low scores and writes a styled single-sheet workbook.
//! - `conf`      : constants and default presets
//! - `spec`      : specs/models/options/errors
//! - `cell`      : cell value classification (read and write direction)
//! - `reader`    : record extractor (calamine)
//! - `rank`      : stable multi-key record ordering
//! - `highlight` : score threshold classifier
//! - `util`      : pure helper functions
//! - `writer`    : sheet planner and `.xlsx` backend (rust_xlsxwriter)
//! - `biff`      : `.xls` (BIFF8) backend
pub mod biff;
pub mod cell;
pub mod conf;
pub mod highlight;
pub mod rank;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use cell::{classify_text_for_write, derive_text_from_data, is_decimal_text};
pub use conf::{
    N_NCOLS_XLS_MAX, N_NCOLS_XLSX_MAX, N_NROWS_XLS_MAX, N_NROWS_XLSX_MAX,
    N_SCORE_THRESHOLD_DEFAULT, TUP_HEADERS_DEFAULT, derive_default_headers,
    derive_default_record_layout, derive_default_sort_keys,
};
pub use highlight::should_highlight;
pub use rank::{compare_records, rank_records};
pub use reader::{derive_records_from_range, read_records};
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumFieldSource, EnumRowStyle, EnumSheetFormat,
    EnumSortDirection, SheetIoError, SpecAutofitCellsPolicy, SpecCellFormat, SpecHighlightRule,
    SpecPlannedRow, SpecRecordField, SpecRecordLayout, SpecSheetPlan, SpecSheetReadOptions,
    SpecSheetReport, SpecSheetWriteOptions, SpecSortKey, SpecStyleSheet, TypeRecord,
};
pub use writer::{
    plan_sheet, write_records, write_records_with_headers, write_records_without_headers,
};
