//! Batch conversion constants and default presets.

/// File-name patterns discovered in the input directory.
///
/// `.xlsm`/`.xlsb` are listed so they show up in the report; the sheet
/// reader rejects them per file.
pub const TUP_PATTERNS_SPREADSHEET_DEFAULT: [&str; 4] = ["*.xls", "*.xlsx", "*.xlsm", "*.xlsb"];

/// Prefix prepended to each output file name.
pub const C_PREFIX_FILE_OUT_DEFAULT: &str = "output - ";

/// Header labels written by batch conversions.
pub const TUP_HEADERS_BATCH_DEFAULT: [&str; 5] = [
    "Last Name",
    "First Name",
    "Full Name",
    "Department",
    "Grade/100.00",
];

/// Default worker count: one file at a time.
pub const N_WORKERS_DEFAULT: usize = 1;

/// Default discovery patterns as owned strings.
pub fn derive_default_patterns() -> Vec<String> {
    TUP_PATTERNS_SPREADSHEET_DEFAULT
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Default batch headers as owned strings.
pub fn derive_default_batch_headers() -> Vec<String> {
    TUP_HEADERS_BATCH_DEFAULT
        .iter()
        .map(ToString::to_string)
        .collect()
}
