//! Conversion report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use examkit_io_sheet::SpecSheetReport;

use crate::spec::SpecConvertError;

/// Aggregate counters and diagnostics for one `convert_folder` run.
#[derive(Debug, Default, Clone)]
pub struct ReportConvert {
    /// Regular files listed in the input directory.
    pub cnt_scanned: u64,
    /// Files whose name matched a discovery pattern.
    pub cnt_matched: u64,
    /// Files converted and written successfully.
    pub cnt_converted: u64,
    /// Files skipped by conflict strategy or dry-run.
    pub cnt_skipped: u64,
    /// Data rows written across all converted files.
    pub cnt_rows: u64,
    /// Highlighted data rows across all converted files.
    pub cnt_highlighted: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Per-file failures.
    pub errors: Vec<SpecConvertError>,
}

impl ReportConvert {
    /// Files that failed to convert.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Counters keyed by name, errors and warnings included.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_converted".to_string(), self.cnt_converted);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_highlighted".to_string(), self.cnt_highlighted);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// One-line summary, e.g. `[CONVERT] scanned=3 matched=2 ...`.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} scanned={} matched={} converted={} skipped={} rows={} highlighted={} errors={} warnings={}",
            dict_counts["cnt_scanned"],
            dict_counts["cnt_matched"],
            dict_counts["cnt_converted"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_rows"],
            dict_counts["cnt_highlighted"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportConvert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[CONVERT]"))
    }
}

/// Mutable accumulator for conversion statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportConvertBuilder {
    /// See [`ReportConvert::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportConvert::cnt_matched`].
    pub cnt_matched: u64,
    /// See [`ReportConvert::cnt_converted`].
    pub cnt_converted: u64,
    /// See [`ReportConvert::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportConvert::cnt_rows`].
    pub cnt_rows: u64,
    /// See [`ReportConvert::cnt_highlighted`].
    pub cnt_highlighted: u64,
    /// See [`ReportConvert::errors`].
    pub errors: Vec<SpecConvertError>,
    /// See [`ReportConvert::warnings`].
    pub warnings: Vec<String>,
}

impl ReportConvertBuilder {
    /// A regular file was seen in the input directory.
    pub fn add_scanned(&mut self) {
        self.cnt_scanned += 1;
    }

    pub fn add_matched(&mut self) {
        self.cnt_matched += 1;
    }

    /// Conflict skip or dry-run planning.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Fold one successful file write into the counters.
    pub fn add_converted(&mut self, sheet_report: &SpecSheetReport) {
        self.cnt_converted += 1;
        self.cnt_rows += sheet_report.n_rows_data as u64;
        self.cnt_highlighted += sheet_report.n_rows_highlighted as u64;
        for warning in &sheet_report.warnings {
            self.warnings
                .push(format!("{}: {warning}", sheet_report.path.display()));
        }
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecConvertError { path, exception });
    }

    pub fn build(self) -> ReportConvert {
        ReportConvert {
            cnt_scanned: self.cnt_scanned,
            cnt_matched: self.cnt_matched,
            cnt_converted: self.cnt_converted,
            cnt_skipped: self.cnt_skipped,
            cnt_rows: self.cnt_rows,
            cnt_highlighted: self.cnt_highlighted,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use examkit_io_sheet::SpecSheetReport;

    use super::{ReportConvert, ReportConvertBuilder};

    #[test]
    fn report_convert_to_dict_and_format() {
        let report = ReportConvert {
            cnt_scanned: 6,
            cnt_matched: 4,
            cnt_converted: 2,
            cnt_skipped: 1,
            cnt_rows: 30,
            cnt_highlighted: 7,
            warnings: vec!["w".to_string()],
            errors: vec![],
        };

        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_converted"], 2);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[CONVERT]");
        assert_eq!(
            txt,
            "[CONVERT] scanned=6 matched=4 converted=2 skipped=1 rows=30 highlighted=7 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
        assert!(report.is_success());
    }

    #[test]
    fn builder_folds_sheet_reports_and_errors() {
        let mut builder = ReportConvertBuilder::default();
        builder.add_converted(&SpecSheetReport {
            path: PathBuf::from("out/output - a.xls"),
            n_rows_header: 1,
            n_rows_data: 10,
            n_rows_highlighted: 3,
            widths_by_col: vec![],
            warnings: vec!["extra fields were not written".to_string()],
        });
        builder.add_error(PathBuf::from("b.xlsm"), "unsupported".to_string());

        let report = builder.build();
        assert_eq!(report.cnt_converted, 1);
        assert_eq!(report.cnt_rows, 10);
        assert_eq!(report.cnt_highlighted, 3);
        assert_eq!(report.warnings, vec!["out/output - a.xls: extra fields were not written"]);
        assert_eq!(report.error_count(), 1);
        assert!(!report.is_success());
    }
}
