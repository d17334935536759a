use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use examkit_io_sheet::{
    EnumFieldSource, EnumRowStyle, SheetIoError, SpecRecordField, SpecRecordLayout,
    SpecSheetReadOptions, SpecSheetWriteOptions, TypeRecord, plan_sheet, read_records,
    write_records, write_records_with_headers, write_records_without_headers,
};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;

fn rec(fields: &[&str]) -> TypeRecord {
    fields.iter().map(|s| s.to_string()).collect()
}

/// Source workbook with the raw 11-column export layout.
fn write_source_xlsx(path: &Path, rows: &[(&str, &str, &str, f64)]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let l_header = [
        "Last", "First", "Email", "Id", "Dept", "c5", "c6", "c7", "c8", "c9", "Score",
    ];
    for (n_col, c_header) in l_header.iter().enumerate() {
        worksheet
            .write_string(0, n_col as u16, *c_header)
            .expect("write header");
    }
    for (n_idx, (last, first, dept, score)) in rows.iter().enumerate() {
        let n_row = n_idx as u32 + 1;
        worksheet.write_string(n_row, 0, *last).expect("last");
        worksheet.write_string(n_row, 1, *first).expect("first");
        worksheet.write_string(n_row, 4, *dept).expect("dept");
        worksheet.write_number(n_row, 10, *score).expect("score");
    }
    workbook.save(path).expect("save source");
}

fn identity_layout(n_fields: usize) -> SpecSheetReadOptions {
    SpecSheetReadOptions {
        layout: SpecRecordLayout {
            fields: (0..n_fields)
                .map(|n_col| SpecRecordField {
                    name: format!("f{n_col}"),
                    source: EnumFieldSource::Column(n_col),
                })
                .collect(),
        },
    }
}

fn read_grid(path: &Path) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto(path).expect("open output");
    let range = workbook
        .worksheet_range_at(0)
        .expect("first sheet")
        .expect("decode sheet");
    range.rows().map(|row| row.to_vec()).collect()
}

#[test]
fn end_to_end_extract_rank_highlight_and_write() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_in = tmp.path().join("scores.xlsx");
    write_source_xlsx(
        &path_in,
        &[("Doe", "Jane", "Eng", 85.0), ("Lee", "Tom", "Sci", 60.0)],
    );

    let l_records = read_records(&path_in, &SpecSheetReadOptions::default()).expect("read");
    assert_eq!(
        l_records,
        vec![
            rec(&["Doe", "Jane", "Jane Doe", "Eng", "85"]),
            rec(&["Lee", "Tom", "Tom Lee", "Sci", "60"]),
        ]
    );

    let plan = plan_sheet(&l_records, None, &SpecSheetWriteOptions::default());
    assert_eq!(plan.rows[0].style, EnumRowStyle::Normal);
    assert_eq!(plan.rows[1].style, EnumRowStyle::Highlight);

    for c_ext in ["xlsx", "xls"] {
        let path_out = tmp.path().join(format!("output - scores.{c_ext}"));
        let report = write_records_with_headers(
            &path_out,
            &l_records,
            &["Last Name", "First Name", "Full Name", "Department", "Grade/100.00"],
            &SpecSheetWriteOptions::default(),
        )
        .expect("write");
        assert_eq!(report.n_rows_header, 1);
        assert_eq!(report.n_rows_data, 2);
        assert_eq!(report.n_rows_highlighted, 1);

        let grid = read_grid(&path_out);
        assert_eq!(grid.len(), 3, "{c_ext}");
        assert_eq!(grid[0][4], Data::String("Grade/100.00".to_string()));
        assert_eq!(grid[1][2], Data::String("Jane Doe".to_string()));
        assert_eq!(grid[1][4], Data::Float(85.0));
        assert_eq!(grid[2][0], Data::String("Lee".to_string()));
        assert_eq!(grid[2][4], Data::Float(60.0));
    }
}

#[test]
fn written_records_read_back_as_equivalent_text() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let c_long = "z".repeat(300);
    let l_records = vec![
        rec(&["A1", "Ann", "Ann Able", "Art", "91.5"]),
        rec(&["B2", "Bo", "Bo Baker", "Art", "77"]),
        rec(&["C3", "Cy", "Cy Cole", "Bio", ""]),
        rec(&["E5", "Zo", &c_long, "Bio", "64"]),
        rec(&["D4", "张", "张 三", "Bio", "N/A"]),
    ];

    for c_ext in ["xlsx", "xls"] {
        let path_out = tmp.path().join(format!("roundtrip.{c_ext}"));
        write_records_with_headers(&path_out, &l_records, &[], &SpecSheetWriteOptions::default())
            .expect("write");
        let l_read = read_records(&path_out, &identity_layout(5)).expect("read back");
        // Input is already in rank order, so the output order is unchanged.
        assert_eq!(l_read, l_records, "{c_ext}");
    }
}

#[test]
fn default_headers_and_headerless_output() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let l_records = vec![rec(&["1", "Jo", "Jo X", "Eng", "99"])];

    let path_default = tmp.path().join("default.xlsx");
    write_records_with_headers(&path_default, &l_records, &[], &SpecSheetWriteOptions::default())
        .expect("write");
    let grid = read_grid(&path_default);
    assert_eq!(grid[0][0], Data::String("ID".to_string()));
    assert_eq!(grid[0][4], Data::String("Score".to_string()));

    let path_bare = tmp.path().join("bare.xls");
    let report =
        write_records_without_headers(&path_bare, &l_records, &SpecSheetWriteOptions::default())
            .expect("write");
    assert_eq!(report.n_rows_header, 0);
    let grid = read_grid(&path_bare);
    assert_eq!(grid.len(), 1);
    assert_eq!(grid[0][0], Data::Float(1.0));
}

#[test]
fn existing_output_is_overwritten() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_out = tmp.path().join("out.xlsx");
    std::fs::write(&path_out, b"stale").expect("seed stale file");

    write_records(
        &path_out,
        &[rec(&["1", "a", "a b", "D", "50"])],
        None,
        &SpecSheetWriteOptions::default(),
    )
    .expect("write over stale file");
    assert_eq!(read_grid(&path_out).len(), 1);
}

#[test]
fn csv_paths_are_rejected_by_reader_and_writer() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_csv = tmp.path().join("scores.csv");
    std::fs::write(&path_csv, "a,b\n1,2\n").expect("seed csv");

    let err = read_records(&path_csv, &SpecSheetReadOptions::default()).expect_err("reader");
    assert!(matches!(err, SheetIoError::UnsupportedFormat { ref extension, .. } if extension == "csv"));

    let err = write_records(
        tmp.path().join("out.csv"),
        &[],
        None,
        &SpecSheetWriteOptions::default(),
    )
    .expect_err("writer");
    assert!(matches!(err, SheetIoError::UnsupportedFormat { .. }));
}

#[test]
fn sheet_with_only_a_header_yields_no_records() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_in = tmp.path().join("empty.xlsx");
    write_source_xlsx(&path_in, &[]);
    let l_records = read_records(&path_in, &SpecSheetReadOptions::default()).expect("read");
    assert!(l_records.is_empty());
}
