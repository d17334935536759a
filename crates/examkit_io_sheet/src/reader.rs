//! Record extraction from the first worksheet of an `.xls`/`.xlsx` file.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use tracing::debug;

use crate::cell::derive_text_from_data;
use crate::spec::{
    EnumFieldSource, EnumSheetFormat, SheetIoError, SpecRecordLayout, SpecSheetReadOptions,
    TypeRecord,
};

/// Read every non-header row of the first worksheet into records.
///
/// The first populated row is always discarded as a header, whatever it
/// holds. Every later row inside the populated range yields exactly one
/// record of `layout.width()` fields; missing cells become empty text.
pub fn read_records<P>(
    path_file_in: P,
    options: &SpecSheetReadOptions,
) -> Result<Vec<TypeRecord>, SheetIoError>
where
    P: AsRef<Path>,
{
    let path_file_in = path_file_in.as_ref();
    EnumSheetFormat::from_path(path_file_in)?;

    let mut workbook =
        open_workbook_auto(path_file_in).map_err(|e| SheetIoError::io(path_file_in, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetIoError::io(path_file_in, "workbook contains no worksheet"))?
        .map_err(|e| SheetIoError::io(path_file_in, e))?;

    let l_records = derive_records_from_range(&range, &options.layout);
    debug!(
        path = %path_file_in.display(),
        n_records = l_records.len(),
        "read records"
    );
    Ok(l_records)
}

/// Project an already-decoded worksheet range into records.
pub fn derive_records_from_range(range: &Range<Data>, layout: &SpecRecordLayout) -> Vec<TypeRecord> {
    let (Some((n_row_start, _)), Some((n_row_end, _))) = (range.start(), range.end()) else {
        return Vec::new();
    };

    (n_row_start..=n_row_end)
        .skip(1)
        .map(|n_row| {
            derive_record(layout, |n_col| {
                u32::try_from(n_col)
                    .ok()
                    .and_then(|n_col| range.get_value((n_row, n_col)))
                    .map(derive_text_from_data)
                    .unwrap_or_default()
            })
        })
        .collect()
}

/// Build one record from a column lookup.
pub fn derive_record<F>(layout: &SpecRecordLayout, mut text_at: F) -> TypeRecord
where
    F: FnMut(usize) -> String,
{
    layout
        .fields
        .iter()
        .map(|field| match &field.source {
            EnumFieldSource::Column(n_col) => text_at(*n_col),
            EnumFieldSource::Joined { cols, sep } => cols
                .iter()
                .map(|n_col| text_at(*n_col))
                .collect::<Vec<_>>()
                .join(sep)
                .trim()
                .to_string(),
        })
        .collect()
}
