//! Spreadsheet writer: ranks, classifies and styles records, then renders
//! the sheet plan through the backend picked by the file extension.

use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, FormatPattern, Workbook, XlsxError};
use tracing::debug;

use crate::biff::render_xls;
use crate::cell::classify_text_for_write;
use crate::conf::derive_default_headers;
use crate::highlight::should_highlight;
use crate::rank::rank_records;
use crate::spec::{
    EnumCellValue, EnumRowStyle, EnumSheetFormat, SheetIoError, SpecCellFormat, SpecPlannedRow,
    SpecSheetPlan, SpecSheetReport, SpecSheetWriteOptions, TypeRecord,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_autofit_widths, sanitize_sheet_name,
    validate_policy_autofit,
};

////////////////////////////////////////////////////////////////////////////////
// #region EntryPoints

/// Write records into a new single-sheet workbook at `path_file_out`.
///
/// A header row is written only when `headers` is present and non-empty.
/// Any existing file at the path is replaced.
pub fn write_records<P>(
    path_file_out: P,
    records: &[TypeRecord],
    headers: Option<&[String]>,
    options: &SpecSheetWriteOptions,
) -> Result<SpecSheetReport, SheetIoError>
where
    P: AsRef<Path>,
{
    let path_file_out = path_file_out.as_ref();
    let rule_format = EnumSheetFormat::from_path(path_file_out)?;
    validate_write_options(options, rule_format)?;

    let plan = plan_sheet(records, headers, options);
    let n_rows_max = rule_format.n_rows_max();
    if plan.rows.len() > n_rows_max {
        return Err(SheetIoError::RowLimitExceeded {
            path: path_file_out.to_path_buf(),
            n_rows: plan.rows.len(),
            n_rows_max,
        });
    }

    let mut report = derive_report_from_plan(path_file_out, &plan);
    let n_records_wide = records.iter().filter(|r| r.len() > options.n_cols).count();
    if n_records_wide > 0 {
        report.warn(format!(
            "{n_records_wide} record(s) have more than {} fields; extra fields were not written.",
            options.n_cols
        ));
    }
    match rule_format {
        EnumSheetFormat::Xlsx => render_xlsx(&plan, path_file_out)?,
        EnumSheetFormat::Xls => render_xls(&plan, path_file_out)?,
    }

    debug!(
        path = %path_file_out.display(),
        n_rows_data = report.n_rows_data,
        n_rows_highlighted = report.n_rows_highlighted,
        "wrote records"
    );
    Ok(report)
}

/// Write records under a header row; an empty `headers` slice selects the
/// default labels.
pub fn write_records_with_headers<P>(
    path_file_out: P,
    records: &[TypeRecord],
    headers: &[&str],
    options: &SpecSheetWriteOptions,
) -> Result<SpecSheetReport, SheetIoError>
where
    P: AsRef<Path>,
{
    let l_headers: Vec<String> = if headers.is_empty() {
        derive_default_headers()
    } else {
        headers.iter().map(ToString::to_string).collect()
    };
    write_records(path_file_out, records, Some(&l_headers), options)
}

/// Write records without a header row.
pub fn write_records_without_headers<P>(
    path_file_out: P,
    records: &[TypeRecord],
    options: &SpecSheetWriteOptions,
) -> Result<SpecSheetReport, SheetIoError>
where
    P: AsRef<Path>,
{
    write_records(path_file_out, records, None, options)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Planning

/// Build the backend-independent sheet plan.
///
/// Records are ranked first. Each record contributes exactly `n_cols`
/// cells; fields missing from a short record become styled blanks.
pub fn plan_sheet(
    records: &[TypeRecord],
    headers: Option<&[String]>,
    options: &SpecSheetWriteOptions,
) -> SpecSheetPlan {
    let n_cols = options.n_cols;
    let mut l_rows = Vec::with_capacity(records.len() + 1);

    if let Some(l_headers) = headers.filter(|h| !h.is_empty()) {
        l_rows.push(SpecPlannedRow {
            style: EnumRowStyle::Header,
            cells: l_headers
                .iter()
                .take(n_cols)
                .map(|c_header| {
                    if c_header.is_empty() {
                        EnumCellValue::None
                    } else {
                        EnumCellValue::String(c_header.clone())
                    }
                })
                .collect(),
        });
    }

    for record in rank_records(records, &options.sort_keys) {
        let style = if should_highlight(&record, &options.highlight) {
            EnumRowStyle::Highlight
        } else {
            EnumRowStyle::Normal
        };
        let cells = (0..n_cols)
            .map(|n_idx_field| {
                record
                    .get(n_idx_field)
                    .map(|value| classify_text_for_write(value))
                    .unwrap_or(EnumCellValue::None)
            })
            .collect();
        l_rows.push(SpecPlannedRow { style, cells });
    }

    let widths_by_col = derive_autofit_widths(&l_rows, n_cols, &options.policy_autofit);
    SpecSheetPlan {
        sheet_name: sanitize_sheet_name(&options.sheet_name, "_"),
        rows: l_rows,
        widths_by_col,
        styles: options.styles.clone(),
    }
}

fn validate_write_options(
    options: &SpecSheetWriteOptions,
    rule_format: EnumSheetFormat,
) -> Result<(), SheetIoError> {
    validate_policy_autofit(&options.policy_autofit)?;
    if options.n_cols == 0 {
        return Err(SheetIoError::InvalidOptions(
            "n_cols must be >= 1.".to_string(),
        ));
    }
    if options.n_cols > rule_format.n_cols_max() {
        return Err(SheetIoError::InvalidOptions(format!(
            "n_cols={} exceeds the format limit of {} columns.",
            options.n_cols,
            rule_format.n_cols_max()
        )));
    }
    Ok(())
}

fn derive_report_from_plan(path_file_out: &Path, plan: &SpecSheetPlan) -> SpecSheetReport {
    let n_rows_header = plan
        .rows
        .iter()
        .filter(|row| row.style == EnumRowStyle::Header)
        .count();
    let n_rows_highlighted = plan
        .rows
        .iter()
        .filter(|row| row.style == EnumRowStyle::Highlight)
        .count();
    SpecSheetReport {
        path: path_file_out.to_path_buf(),
        n_rows_header,
        n_rows_data: plan.rows.len() - n_rows_header,
        n_rows_highlighted,
        widths_by_col: plan.widths_by_col.clone(),
        warnings: Vec::new(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region XlsxBackend

/// Render `plan` with rust_xlsxwriter and persist it at `path` in one write.
pub fn render_xlsx(plan: &SpecSheetPlan, path: &Path) -> Result<(), SheetIoError> {
    let map_xlsx_err = |err: XlsxError| SheetIoError::io(path, derive_xlsx_error_text(err));

    let fmt_header = derive_rust_xlsx_format(&plan.styles.fmt_header);
    let fmt_normal = derive_rust_xlsx_format(&plan.styles.fmt_normal);
    let fmt_highlight = derive_rust_xlsx_format(&plan.styles.fmt_highlight);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(plan.sheet_name.as_str())
        .map_err(map_xlsx_err)?;

    for (n_idx_row, row) in plan.rows.iter().enumerate() {
        let n_row = cast_row_num(n_idx_row)?;
        let fmt = match row.style {
            EnumRowStyle::Header => &fmt_header,
            EnumRowStyle::Normal => &fmt_normal,
            EnumRowStyle::Highlight => &fmt_highlight,
        };
        for (n_idx_col, cell) in row.cells.iter().enumerate() {
            let n_col = cast_col_num(n_idx_col)?;
            let result = match cell {
                EnumCellValue::None => worksheet.write_blank(n_row, n_col, fmt),
                EnumCellValue::String(val) => {
                    worksheet.write_string_with_format(n_row, n_col, val, fmt)
                }
                EnumCellValue::Number(val) => {
                    worksheet.write_number_with_format(n_row, n_col, *val, fmt)
                }
                EnumCellValue::Boolean(val) => {
                    worksheet.write_boolean_with_format(n_row, n_col, *val, fmt)
                }
            };
            result.map_err(map_xlsx_err)?;
        }
    }

    for (n_idx_col, n_width) in plan.widths_by_col.iter().enumerate() {
        worksheet
            .set_column_width(cast_col_num(n_idx_col)?, *n_width as f64)
            .map_err(map_xlsx_err)?;
    }

    let v_buffer = workbook.save_to_buffer().map_err(map_xlsx_err)?;
    fs::write(path, v_buffer).map_err(|e| SheetIoError::io(path, e))
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.bg_color {
        format = format
            .set_pattern(FormatPattern::Solid)
            .set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = &spec.border_color {
        format = format.set_border_color(val.as_str());
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        _ => None,
    }
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
