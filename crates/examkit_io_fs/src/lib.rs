//! `examkit_io_fs` v1:
//! Batch conversion engine over a directory of exam-result workbooks.
//!
//! - `conf`    : default patterns, prefix and batch headers
//! - `convert` : discovery and conversion orchestration
//! - `spec`    : enums/options/errors
//! - `report`  : run-time report model
//! - `util`    : shared helper functions

pub mod conf;
pub mod convert;
pub mod report;
pub mod spec;
mod util;

pub use conf::{
    C_PREFIX_FILE_OUT_DEFAULT, TUP_HEADERS_BATCH_DEFAULT, TUP_PATTERNS_SPREADSHEET_DEFAULT,
};
pub use convert::{convert_file, convert_folder};
pub use report::{ReportConvert, ReportConvertBuilder};
pub use spec::{
    ConvertFolderError, EnumConvertFileConflictStrategy, EnumConvertPatternMode, SpecConvertError,
    SpecConvertOptions,
};
