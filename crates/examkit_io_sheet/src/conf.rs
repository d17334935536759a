//! Sheet constants and default preset factories.

use crate::spec::{
    EnumFieldSource, EnumSortDirection, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecHighlightRule, SpecRecordField, SpecRecordLayout, SpecSheetWriteOptions, SpecSortKey,
    SpecStyleSheet,
};

/// `.xlsx` worksheet maximum row count.
pub const N_NROWS_XLSX_MAX: usize = 1_048_576;
/// `.xlsx` worksheet maximum column count.
pub const N_NCOLS_XLSX_MAX: usize = 16_384;
/// `.xls` (BIFF8) worksheet maximum row count.
pub const N_NROWS_XLS_MAX: usize = 65_536;
/// `.xls` (BIFF8) worksheet maximum column count.
pub const N_NCOLS_XLS_MAX: usize = 256;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Name of the single output worksheet.
pub const C_SHEET_NAME_DEFAULT: &str = "Data";
/// Number of fields in a default record.
pub const N_FIELDS_RECORD: usize = 5;
/// Record index of the full-name field.
pub const N_IDX_FIELD_FULL_NAME: usize = 2;
/// Record index of the department (grouping) field.
pub const N_IDX_FIELD_DEPARTMENT: usize = 3;
/// Record index of the score field.
pub const N_IDX_FIELD_SCORE: usize = 4;
/// Scores strictly below this value are highlighted.
pub const N_SCORE_THRESHOLD_DEFAULT: f64 = 78.0;

/// Header labels used when a caller asks for headers but supplies none.
pub const TUP_HEADERS_DEFAULT: [&str; N_FIELDS_RECORD] =
    ["ID", "First Name", "Full Name", "Department", "Score"];

/// Build the default source-to-record projection: columns 0, 1, 4, 10 and
/// `trim(col1 + " " + col0)` inserted at index 2.
pub fn derive_default_record_layout() -> SpecRecordLayout {
    let field = |name: &str, source: EnumFieldSource| SpecRecordField {
        name: name.to_string(),
        source,
    };
    SpecRecordLayout {
        fields: vec![
            field("id", EnumFieldSource::Column(0)),
            field("first_name", EnumFieldSource::Column(1)),
            field(
                "full_name",
                EnumFieldSource::Joined {
                    cols: vec![1, 0],
                    sep: " ".to_string(),
                },
            ),
            field("department", EnumFieldSource::Column(4)),
            field("score", EnumFieldSource::Column(10)),
        ],
    }
}

/// Build the default composite sort key: department, then full name, both
/// ascending and case-insensitive.
pub fn derive_default_sort_keys() -> Vec<SpecSortKey> {
    vec![
        SpecSortKey {
            idx_field: N_IDX_FIELD_DEPARTMENT,
            rule_direction: EnumSortDirection::Ascending,
            if_case_sensitive: false,
        },
        SpecSortKey {
            idx_field: N_IDX_FIELD_FULL_NAME,
            rule_direction: EnumSortDirection::Ascending,
            if_case_sensitive: false,
        },
    ]
}

/// Build the default header/normal/highlight formats.
pub fn derive_default_style_sheet() -> SpecStyleSheet {
    let cfg_base_fmt_spec = SpecCellFormat {
        border: Some(1),
        ..Default::default()
    };

    SpecStyleSheet {
        fmt_header: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some("#C0C0C0".to_string()),
            border_color: Some("#000000".to_string()),
            ..Default::default()
        }),
        fmt_normal: cfg_base_fmt_spec.clone(),
        fmt_highlight: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            font_color: Some("#FFFFFF".to_string()),
            bg_color: Some("#FF0000".to_string()),
            border_color: Some("#000000".to_string()),
            ..Default::default()
        }),
    }
}

/// Build default write options.
pub fn derive_default_sheet_write_options() -> SpecSheetWriteOptions {
    SpecSheetWriteOptions {
        sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
        n_cols: N_FIELDS_RECORD,
        sort_keys: derive_default_sort_keys(),
        highlight: SpecHighlightRule::default(),
        policy_autofit: SpecAutofitCellsPolicy::default(),
        styles: derive_default_style_sheet(),
    }
}

/// Default header labels as owned strings.
pub fn derive_default_headers() -> Vec<String> {
    TUP_HEADERS_DEFAULT.iter().map(ToString::to_string).collect()
}
