//! Stateless helpers shared by the sheet planner and both backends.

use crate::cell::derive_text_from_number;
use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumRowStyle, SheetIoError, SpecAutofitCellsPolicy,
    SpecPlannedRow,
};

////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to a valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    // Excel refuses names that start or end with an apostrophe.
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = crate::conf::C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Autofit

/// Estimate displayed width units for one typed cell value.
pub fn estimate_width_len(value: &EnumCellValue) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => derive_text_from_number(*n).len(),
        EnumCellValue::Boolean(b) => {
            if *b {
                4
            } else {
                5
            }
        }
    }
}

/// Count ASCII chars as one unit and wider scripts as 1.6 units.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

/// Reject autofit bounds that cannot produce a width.
pub fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), SheetIoError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(SheetIoError::InvalidOptions(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(SheetIoError::InvalidOptions(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

/// Infer final column widths from planned rows.
///
/// Without autofit every column gets `width_cell_min`.
pub fn derive_autofit_widths(
    rows: &[SpecPlannedRow],
    n_cols: usize,
    policy_autofit: &SpecAutofitCellsPolicy,
) -> Vec<usize> {
    let n_min = usize::max(1, policy_autofit.width_cell_min);
    let n_max = usize::max(n_min, policy_autofit.width_cell_max);
    let n_pad = policy_autofit.width_cell_padding;

    let mut l_width_by_col_header = vec![0usize; n_cols];
    let mut l_width_by_col_body = vec![0usize; n_cols];
    for row in rows {
        let l_width_target = match row.style {
            EnumRowStyle::Header => &mut l_width_by_col_header,
            EnumRowStyle::Normal | EnumRowStyle::Highlight => &mut l_width_by_col_body,
        };
        for (n_idx_col, cell) in row.cells.iter().take(n_cols).enumerate() {
            l_width_target[n_idx_col] =
                usize::max(l_width_target[n_idx_col], estimate_width_len(cell));
        }
    }

    (0..n_cols)
        .map(|n_idx_col| {
            let n_width_recorded = match policy_autofit.rule_columns {
                EnumAutofitColumnsRule::None => return n_min,
                EnumAutofitColumnsRule::Header => l_width_by_col_header[n_idx_col],
                EnumAutofitColumnsRule::Body => l_width_by_col_body[n_idx_col],
                EnumAutofitColumnsRule::All => usize::max(
                    l_width_by_col_header[n_idx_col],
                    l_width_by_col_body[n_idx_col],
                ),
            };
            usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad))
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Casting

/// Narrow a row index to the backend integer type.
pub fn cast_row_num(value: usize) -> Result<u32, SheetIoError> {
    u32::try_from(value)
        .map_err(|_| SheetIoError::InvalidOptions(format!("row index overflow: {value}")))
}

/// Narrow a column index to the backend integer type.
pub fn cast_col_num(value: usize) -> Result<u16, SheetIoError> {
    u16::try_from(value)
        .map_err(|_| SheetIoError::InvalidOptions(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn row(style: EnumRowStyle, cells: &[&str]) -> SpecPlannedRow {
        SpecPlannedRow {
            style,
            cells: cells
                .iter()
                .map(|s| crate::cell::classify_text_for_write(s))
                .collect(),
        }
    }

    #[test]
    fn sanitize_sheet_name_replaces_illegal_and_caps_length() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("   ", "_"), "Data");
        assert_eq!(sanitize_sheet_name("'quoted'", "_"), "quoted");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn unicode_width_counts_wide_chars_heavier() {
        assert_eq!(estimate_unicode_string_width("abc"), 3);
        assert_eq!(estimate_unicode_string_width("张三"), 3);
        assert_eq!(estimate_unicode_string_width(""), 0);
    }

    #[test]
    fn autofit_widths_pad_and_clamp() {
        let l_rows = vec![
            row(EnumRowStyle::Header, &["ID", "Department"]),
            row(EnumRowStyle::Normal, &["1", &"y".repeat(100)]),
        ];
        let policy = SpecAutofitCellsPolicy::default();
        assert_eq!(derive_autofit_widths(&l_rows, 2, &policy), vec![6, 60]);

        let policy_header = SpecAutofitCellsPolicy {
            rule_columns: EnumAutofitColumnsRule::Header,
            ..Default::default()
        };
        assert_eq!(derive_autofit_widths(&l_rows, 2, &policy_header), vec![6, 12]);

        let policy_none = SpecAutofitCellsPolicy {
            rule_columns: EnumAutofitColumnsRule::None,
            ..Default::default()
        };
        assert_eq!(derive_autofit_widths(&l_rows, 2, &policy_none), vec![6, 6]);
    }

    #[test]
    fn autofit_policy_validation() {
        assert!(validate_policy_autofit(&SpecAutofitCellsPolicy::default()).is_ok());
        let policy = SpecAutofitCellsPolicy {
            width_cell_min: 10,
            width_cell_max: 5,
            ..Default::default()
        };
        assert!(matches!(
            validate_policy_autofit(&policy),
            Err(SheetIoError::InvalidOptions(_))
        ));
    }

    #[test]
    fn casts_reject_overflow() {
        assert_eq!(cast_col_num(255).expect("fits"), 255);
        assert!(cast_col_num(70_000).is_err());
        assert_eq!(cast_row_num(65_535).expect("fits"), 65_535);
    }
}
