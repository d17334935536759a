//! Cell value classification in both directions.
//!
//! Reading turns a decoded workbook cell into record text; writing turns
//! record text back into a typed cell.

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::spec::EnumCellValue;

static RE_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("decimal pattern"));

/// Integral floats at or above this magnitude keep the default float text.
const N_ABS_INTEGER_TEXT_MAX: f64 = 1e15;

////////////////////////////////////////////////////////////////////////////////
// #region ReadDirection

/// Render a decoded cell as record text.
pub fn derive_text_from_data(cell: &Data) -> String {
    match cell {
        Data::String(val) => val.trim().to_string(),
        Data::Float(val) => derive_text_from_number(*val),
        Data::Int(val) => val.to_string(),
        Data::Bool(val) => val.to_string(),
        Data::DateTime(val) => derive_datetime_from_excel_serial(val.as_f64())
            .map(|dt| dt.to_string())
            .unwrap_or_else(|| derive_text_from_number(val.as_f64())),
        Data::DateTimeIso(val) | Data::DurationIso(val) => val.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Render a number without a decimal point when it is integral.
pub fn derive_text_from_number(val: f64) -> String {
    if val.is_finite() && val.fract() == 0.0 && val.abs() < N_ABS_INTEGER_TEXT_MAX {
        format!("{}", val as i64)
    } else {
        val.to_string()
    }
}

/// Convert an Excel 1900-system serial into a calendar timestamp.
pub fn derive_datetime_from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    // Serials below 60 predate the fictitious 1900-02-29.
    let date_epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let n_days = serial.trunc() as i64;
    let n_millis = ((serial - serial.trunc()) * 86_400_000.0).round() as i64;
    date_epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_days(n_days)?)?
        .checked_add_signed(TimeDelta::try_milliseconds(n_millis)?)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteDirection

/// True for text of the form `-?digits(.digits)?`.
pub fn is_decimal_text(value: &str) -> bool {
    !value.trim().is_empty() && RE_DECIMAL.is_match(value)
}

/// True for `true`/`false` in any letter case.
pub fn is_boolean_text(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
}

/// Decide how record text is serialized into a cell.
pub fn classify_text_for_write(value: &str) -> EnumCellValue {
    if value.is_empty() {
        return EnumCellValue::None;
    }
    if is_decimal_text(value) {
        return match value.parse::<f64>() {
            Ok(n) if n.is_finite() => EnumCellValue::Number(n),
            _ => EnumCellValue::String(value.to_string()),
        };
    }
    if is_boolean_text(value) {
        return EnumCellValue::Boolean(value.eq_ignore_ascii_case("true"));
    }
    EnumCellValue::String(value.to_string())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
