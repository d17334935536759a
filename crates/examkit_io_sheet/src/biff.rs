//! BIFF8 `.xls` backend.
//!
//! Encodes a [`SpecSheetPlan`] into a single-sheet `Workbook` stream and
//! wraps it in a Compound File Binary container. Only the record subset a
//! styled table needs is emitted:
//!
//! - globals: `BOF`, `CODEPAGE`, `DATEMODE`, `WINDOW1`, `FONT`, `XF`,
//!   `STYLE`, `BOUNDSHEET`, `SST` (+ `CONTINUE`), `EXTSST`, `EOF`
//! - worksheet: `BOF`, `COLINFO`, `DIMENSIONS`, `ROW`, cell records,
//!   `WINDOW2`, `EOF`
//!
//! Text lives in the shared string table and cells point at it with
//! `LABELSST`, so one cell holds up to 32 767 UTF-16 code units.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::debug;

use crate::spec::{EnumCellValue, EnumRowStyle, SheetIoError, SpecCellFormat, SpecSheetPlan};
use crate::util::cast_col_num;

const RECORD_BOF: u16 = 0x0809;
const RECORD_EOF: u16 = 0x000A;
const RECORD_CODEPAGE: u16 = 0x0042;
const RECORD_DATEMODE: u16 = 0x0022;
const RECORD_WINDOW1: u16 = 0x003D;
const RECORD_FONT: u16 = 0x0031;
const RECORD_XF: u16 = 0x00E0;
const RECORD_STYLE: u16 = 0x0293;
const RECORD_BOUNDSHEET: u16 = 0x0085;
const RECORD_SST: u16 = 0x00FC;
const RECORD_EXTSST: u16 = 0x00FF;
const RECORD_CONTINUE: u16 = 0x003C;
const RECORD_COLINFO: u16 = 0x007D;
const RECORD_DIMENSIONS: u16 = 0x0200;
const RECORD_ROW: u16 = 0x0208;
const RECORD_BLANK: u16 = 0x0201;
const RECORD_NUMBER: u16 = 0x0203;
const RECORD_LABELSST: u16 = 0x00FD;
const RECORD_BOOLERR: u16 = 0x0205;
const RECORD_WINDOW2: u16 = 0x023E;

/// Largest payload one physical record may carry.
const N_LEN_RECORD_DATA_MAX: usize = 8224;

const BOF_VERSION_BIFF8: u16 = 0x0600;
const BOF_DT_WORKBOOK_GLOBALS: u16 = 0x0005;
const BOF_DT_WORKSHEET: u16 = 0x0010;

const CODEPAGE_UTF16: u16 = 1200;

const XF_FLAG_LOCKED: u16 = 0x0001;
const XF_FLAG_STYLE: u16 = 0x0004;
const XF_PARENT_NONE: u16 = 0xFFF0;
const N_XF_STYLE_COUNT: u16 = 15;
const N_IDX_XF_DEFAULT_CELL: u16 = 15;
const N_IDX_XF_CUSTOM_START: u16 = 16;

const N_FONT_DEFAULT_SLOTS: usize = 4;
const C_FONT_NAME_DEFAULT: &str = "Arial";
const N_FONT_SIZE_DEFAULT: i64 = 10;
const N_LEN_FONT_NAME_MAX: usize = 31;

const COLOR_AUTOMATIC: u16 = 0x7FFF;
const ICV_BLACK: u16 = 8;
const ICV_FILL_FORE_DEFAULT: u16 = 64;
const ICV_FILL_BACK_DEFAULT: u16 = 65;
const N_PATTERN_SOLID: u32 = 1;

/// Longest text one cell holds, in UTF-16 code units.
pub const N_LEN_STRING_MAX: usize = 32_767;

const STR_FLAG_UTF16: u8 = 0x01;
const N_SST_BUCKETS_MAX: usize = 128;
const N_SST_BUCKET_SIZE_MIN: usize = 8;

/// Default BIFF8 color palette; entry `i` is color index `8 + i`.
const TUP_PALETTE_DEFAULT: [(u8, u8, u8); 56] = [
    (0, 0, 0),
    (255, 255, 255),
    (255, 0, 0),
    (0, 255, 0),
    (0, 0, 255),
    (255, 255, 0),
    (255, 0, 255),
    (0, 255, 255),
    (128, 0, 0),
    (0, 128, 0),
    (0, 0, 128),
    (128, 128, 0),
    (128, 0, 128),
    (0, 128, 128),
    (192, 192, 192),
    (128, 128, 128),
    (153, 153, 255),
    (153, 51, 102),
    (255, 255, 204),
    (204, 255, 255),
    (102, 0, 102),
    (255, 128, 128),
    (0, 102, 204),
    (204, 204, 255),
    (0, 0, 128),
    (255, 0, 255),
    (255, 255, 0),
    (0, 255, 255),
    (128, 0, 128),
    (128, 0, 0),
    (0, 128, 128),
    (0, 0, 255),
    (0, 204, 255),
    (204, 255, 255),
    (204, 255, 204),
    (255, 255, 153),
    (153, 204, 255),
    (255, 153, 204),
    (204, 153, 255),
    (255, 204, 153),
    (51, 102, 255),
    (51, 204, 204),
    (153, 204, 0),
    (255, 204, 0),
    (255, 153, 0),
    (255, 102, 0),
    (102, 102, 153),
    (150, 150, 150),
    (0, 51, 102),
    (51, 153, 102),
    (0, 51, 0),
    (51, 51, 0),
    (153, 51, 0),
    (153, 51, 51),
    (51, 51, 153),
    (51, 51, 51),
];

const TUP_ROW_STYLES: [EnumRowStyle; 3] = [
    EnumRowStyle::Header,
    EnumRowStyle::Normal,
    EnumRowStyle::Highlight,
];

////////////////////////////////////////////////////////////////////////////////
// #region Entry

/// Encode `plan` as BIFF8 and persist it at `path` in one write.
pub fn render_xls(plan: &SpecSheetPlan, path: &Path) -> Result<(), SheetIoError> {
    let v_stream = encode_workbook_stream(plan)?;
    let v_file = wrap_compound_file(&v_stream).map_err(|e| SheetIoError::io(path, e))?;
    fs::write(path, v_file).map_err(|e| SheetIoError::io(path, e))?;
    debug!(
        path = %path.display(),
        n_bytes_stream = v_stream.len(),
        "wrote xls workbook"
    );
    Ok(())
}

/// Place a `Workbook` stream into an in-memory compound file.
pub fn wrap_compound_file(v_stream: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut ole = cfb::CompoundFile::create(Cursor::new(Vec::new()))?;
    {
        let mut stream = ole.create_stream("Workbook")?;
        stream.write_all(v_stream)?;
        stream.flush()?;
    }
    ole.flush()?;
    Ok(ole.into_inner().into_inner())
}

/// Build the complete workbook stream (globals followed by one worksheet).
pub fn encode_workbook_stream(plan: &SpecSheetPlan) -> Result<Vec<u8>, SheetIoError> {
    let table = StyleTable::from_plan(plan);
    let strings = SharedStrings::from_plan(plan)?;

    let mut globals = Vec::<u8>::new();
    push_record(&mut globals, RECORD_BOF, &bof(BOF_DT_WORKBOOK_GLOBALS));
    push_record(&mut globals, RECORD_CODEPAGE, &CODEPAGE_UTF16.to_le_bytes());
    push_record(&mut globals, RECORD_DATEMODE, &0u16.to_le_bytes());
    push_record(&mut globals, RECORD_WINDOW1, &window1());

    let font_default = BiffFont::default();
    for _ in 0..N_FONT_DEFAULT_SLOTS {
        push_record(&mut globals, RECORD_FONT, &font_default.encode());
    }
    for font in &table.l_fonts_custom {
        push_record(&mut globals, RECORD_FONT, &font.encode());
    }

    for _ in 0..N_XF_STYLE_COUNT {
        push_record(&mut globals, RECORD_XF, &xf_style_record());
    }
    push_record(&mut globals, RECORD_XF, &xf_cell_record(&BiffXf::default()));
    for xf in &table.l_xfs {
        push_record(&mut globals, RECORD_XF, &xf_cell_record(xf));
    }
    push_record(&mut globals, RECORD_STYLE, &style_normal());

    let n_pos_boundsheet = globals.len();
    let mut boundsheet = Vec::<u8>::new();
    boundsheet.extend_from_slice(&0u32.to_le_bytes());
    boundsheet.extend_from_slice(&0u16.to_le_bytes());
    write_short_unicode_string(&mut boundsheet, &plan.sheet_name);
    push_record(&mut globals, RECORD_BOUNDSHEET, &boundsheet);
    let n_pos_sheet_offset = n_pos_boundsheet + 4;

    let sst = strings.encode();
    let mut l_pos_fragments = Vec::with_capacity(sst.l_fragments.len());
    for (n_idx, fragment) in sst.l_fragments.iter().enumerate() {
        l_pos_fragments.push(globals.len());
        let id = if n_idx == 0 { RECORD_SST } else { RECORD_CONTINUE };
        push_record(&mut globals, id, fragment);
    }
    push_record(&mut globals, RECORD_EXTSST, &extsst(&sst, &l_pos_fragments)?);

    push_record(&mut globals, RECORD_EOF, &[]);

    let n_sheet_offset = u32::try_from(globals.len())
        .map_err(|_| SheetIoError::InvalidOptions("workbook globals too large".to_string()))?;
    let sheet = encode_worksheet_stream(plan, &table, &strings)?;
    globals[n_pos_sheet_offset..n_pos_sheet_offset + 4]
        .copy_from_slice(&n_sheet_offset.to_le_bytes());
    globals.extend_from_slice(&sheet);
    Ok(globals)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Worksheet

fn encode_worksheet_stream(
    plan: &SpecSheetPlan,
    table: &StyleTable,
    strings: &SharedStrings,
) -> Result<Vec<u8>, SheetIoError> {
    let n_cols = plan
        .rows
        .iter()
        .map(|row| row.cells.len())
        .max()
        .unwrap_or(0)
        .max(plan.widths_by_col.len());

    let mut sheet = Vec::<u8>::new();
    push_record(&mut sheet, RECORD_BOF, &bof(BOF_DT_WORKSHEET));

    for (n_idx_col, n_width) in plan.widths_by_col.iter().enumerate() {
        let n_col = cast_col_num(n_idx_col)?;
        push_record(&mut sheet, RECORD_COLINFO, &colinfo(n_col, *n_width));
    }

    push_record(
        &mut sheet,
        RECORD_DIMENSIONS,
        &dimensions(plan.rows.len(), n_cols),
    );

    for (n_idx_row, row) in plan.rows.iter().enumerate() {
        let n_row = cast_row_num_xls(n_idx_row)?;
        let n_cols_row = cast_col_num(row.cells.len())?;
        push_record(&mut sheet, RECORD_ROW, &row_record(n_row, n_cols_row));
    }

    for (n_idx_row, row) in plan.rows.iter().enumerate() {
        let n_row = cast_row_num_xls(n_idx_row)?;
        let n_xf = table.xf_index_of(row.style);
        for (n_idx_col, cell) in row.cells.iter().enumerate() {
            let n_col = cast_col_num(n_idx_col)?;
            let mut data = cell_header(n_row, n_col, n_xf).to_vec();
            let id = match cell {
                EnumCellValue::None => RECORD_BLANK,
                EnumCellValue::Number(val) => {
                    data.extend_from_slice(&val.to_le_bytes());
                    RECORD_NUMBER
                }
                EnumCellValue::Boolean(val) => {
                    data.push(u8::from(*val));
                    data.push(0);
                    RECORD_BOOLERR
                }
                EnumCellValue::String(val) => {
                    data.extend_from_slice(&strings.index_of(val).to_le_bytes());
                    RECORD_LABELSST
                }
            };
            push_record(&mut sheet, id, &data);
        }
    }

    push_record(&mut sheet, RECORD_WINDOW2, &window2());
    push_record(&mut sheet, RECORD_EOF, &[]);
    Ok(sheet)
}

fn cast_row_num_xls(value: usize) -> Result<u16, SheetIoError> {
    u16::try_from(value)
        .map_err(|_| SheetIoError::InvalidOptions(format!("row index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SharedStrings

/// Unique cell texts in first-use order.
struct SharedStrings {
    l_units: Vec<Vec<u16>>,
    dict_index: HashMap<String, u32>,
    n_refs: u32,
}

/// `SST` payload cut into physical records; the first fragment is the
/// `SST` record itself, the rest go out as `CONTINUE`.
struct SstFragments {
    l_fragments: Vec<Vec<u8>>,
    n_bucket_size: usize,
    /// `(fragment, offset in fragment)` of every bucket's first string.
    l_bucket_starts: Vec<(usize, usize)>,
}

impl SharedStrings {
    fn from_plan(plan: &SpecSheetPlan) -> Result<Self, SheetIoError> {
        let mut l_units: Vec<Vec<u16>> = Vec::new();
        let mut dict_index: HashMap<String, u32> = HashMap::new();
        let mut n_refs: u32 = 0;

        for (n_idx_row, row) in plan.rows.iter().enumerate() {
            for (n_idx_col, cell) in row.cells.iter().enumerate() {
                let EnumCellValue::String(val) = cell else {
                    continue;
                };
                n_refs = n_refs.saturating_add(1);
                if dict_index.contains_key(val) {
                    continue;
                }
                let l_text_units: Vec<u16> = val.encode_utf16().collect();
                if l_text_units.len() > N_LEN_STRING_MAX {
                    return Err(SheetIoError::InvalidOptions(format!(
                        "Cell (row {n_idx_row}, col {n_idx_col}) holds {} characters; \
                         .xls cells hold at most {N_LEN_STRING_MAX}.",
                        l_text_units.len()
                    )));
                }
                dict_index.insert(val.clone(), l_units.len() as u32);
                l_units.push(l_text_units);
            }
        }

        Ok(Self {
            l_units,
            dict_index,
            n_refs,
        })
    }

    fn index_of(&self, text: &str) -> u32 {
        self.dict_index.get(text).copied().unwrap_or_default()
    }

    /// Serialize the table. A string header (`cch` + flags) never straddles
    /// two records; a string cut mid-text resumes after a flags byte, and
    /// surrogate pairs stay in one record.
    fn encode(&self) -> SstFragments {
        let n_bucket_size = self
            .l_units
            .len()
            .div_ceil(N_SST_BUCKETS_MAX)
            .max(N_SST_BUCKET_SIZE_MIN);

        let mut l_fragments: Vec<Vec<u8>> = Vec::new();
        let mut l_bucket_starts = Vec::new();
        let mut fragment = Vec::with_capacity(N_LEN_RECORD_DATA_MAX);
        fragment.extend_from_slice(&self.n_refs.to_le_bytes());
        fragment.extend_from_slice(&(self.l_units.len() as u32).to_le_bytes());

        for (n_idx, l_text_units) in self.l_units.iter().enumerate() {
            if fragment.len() + 3 + 2 > N_LEN_RECORD_DATA_MAX {
                l_fragments.push(std::mem::take(&mut fragment));
            }
            if n_idx % n_bucket_size == 0 {
                l_bucket_starts.push((l_fragments.len(), fragment.len()));
            }
            fragment.extend_from_slice(&(l_text_units.len() as u16).to_le_bytes());
            fragment.push(STR_FLAG_UTF16);

            let mut n_pos = 0;
            while n_pos < l_text_units.len() {
                let n_room = (N_LEN_RECORD_DATA_MAX - fragment.len()) / 2;
                let mut n_take = n_room.min(l_text_units.len() - n_pos);
                if n_take > 0
                    && n_pos + n_take < l_text_units.len()
                    && is_high_surrogate(l_text_units[n_pos + n_take - 1])
                {
                    n_take -= 1;
                }
                for unit in &l_text_units[n_pos..n_pos + n_take] {
                    fragment.extend_from_slice(&unit.to_le_bytes());
                }
                n_pos += n_take;
                if n_pos < l_text_units.len() {
                    l_fragments.push(std::mem::take(&mut fragment));
                    fragment.push(STR_FLAG_UTF16);
                }
            }
        }
        l_fragments.push(fragment);

        SstFragments {
            l_fragments,
            n_bucket_size,
            l_bucket_starts,
        }
    }
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

/// `EXTSST` lookup table; `l_pos_fragments` holds the stream position of
/// each fragment's record header.
fn extsst(sst: &SstFragments, l_pos_fragments: &[usize]) -> Result<Vec<u8>, SheetIoError> {
    let mut out = Vec::with_capacity(2 + 8 * sst.l_bucket_starts.len());
    let n_bucket_size = u16::try_from(sst.n_bucket_size)
        .map_err(|_| SheetIoError::InvalidOptions("shared string table too large".to_string()))?;
    out.extend_from_slice(&n_bucket_size.to_le_bytes());
    for (n_idx_fragment, n_offset) in &sst.l_bucket_starts {
        let n_offset_record = 4 + n_offset;
        let n_pos_stream = l_pos_fragments
            .get(*n_idx_fragment)
            .copied()
            .unwrap_or_default()
            + n_offset_record;
        let n_pos_stream = u32::try_from(n_pos_stream).map_err(|_| {
            SheetIoError::InvalidOptions("shared string table too large".to_string())
        })?;
        out.extend_from_slice(&n_pos_stream.to_le_bytes());
        out.extend_from_slice(&(n_offset_record as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(out)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleTable

#[derive(Debug, Clone, PartialEq, Eq)]
struct BiffFont {
    name: String,
    height_twips: u16,
    bold: bool,
    italic: bool,
    icv: u16,
}

impl Default for BiffFont {
    fn default() -> Self {
        Self {
            name: C_FONT_NAME_DEFAULT.to_string(),
            height_twips: (N_FONT_SIZE_DEFAULT * 20) as u16,
            bold: false,
            italic: false,
            icv: COLOR_AUTOMATIC,
        }
    }
}

impl BiffFont {
    fn from_format(fmt: &SpecCellFormat) -> Self {
        let n_size = fmt.font_size.unwrap_or(N_FONT_SIZE_DEFAULT).clamp(1, 409);
        Self {
            name: fmt
                .font_name
                .as_deref()
                .unwrap_or(C_FONT_NAME_DEFAULT)
                .chars()
                .take(N_LEN_FONT_NAME_MAX)
                .collect(),
            height_twips: (n_size * 20) as u16,
            bold: fmt.bold.unwrap_or(false),
            italic: fmt.italic.unwrap_or(false),
            icv: fmt
                .font_color
                .as_deref()
                .and_then(derive_palette_index)
                .unwrap_or(COLOR_AUTOMATIC),
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::<u8>::new();
        out.extend_from_slice(&self.height_twips.to_le_bytes());
        let flags: u16 = if self.italic { 0x0002 } else { 0 };
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&self.icv.to_le_bytes());
        let weight: u16 = if self.bold { 700 } else { 400 };
        out.extend_from_slice(&weight.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // escapement
        out.push(0); // underline
        out.push(0); // family
        out.push(0); // charset
        out.push(0);
        write_short_unicode_string(&mut out, &self.name);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BiffXf {
    n_idx_font: u16,
    n_align: u8,
    n_border: u8,
    icv_border: u16,
    icv_fill: Option<u16>,
}

impl Default for BiffXf {
    fn default() -> Self {
        Self {
            n_idx_font: 0,
            n_align: 0,
            n_border: 0,
            icv_border: ICV_BLACK,
            icv_fill: None,
        }
    }
}

/// Fonts and cell XFs for the three row styles.
struct StyleTable {
    l_fonts_custom: Vec<BiffFont>,
    l_xfs: Vec<BiffXf>,
}

impl StyleTable {
    fn from_plan(plan: &SpecSheetPlan) -> Self {
        let font_default = BiffFont::default();
        let mut l_fonts_custom: Vec<BiffFont> = Vec::new();
        let mut l_xfs = Vec::with_capacity(TUP_ROW_STYLES.len());

        for style in TUP_ROW_STYLES {
            let fmt = plan.styles.format_of(style);
            let font = BiffFont::from_format(fmt);
            let n_idx_font = if font == font_default {
                0
            } else {
                let n_pos = match l_fonts_custom.iter().position(|f| *f == font) {
                    Some(n_pos) => n_pos,
                    None => {
                        l_fonts_custom.push(font);
                        l_fonts_custom.len() - 1
                    }
                };
                derive_font_index(N_FONT_DEFAULT_SLOTS + n_pos)
            };
            l_xfs.push(BiffXf {
                n_idx_font,
                n_align: fmt.align.as_deref().map(derive_xls_align).unwrap_or(0),
                n_border: fmt.border.map(|b| b.clamp(0, 13) as u8).unwrap_or(0),
                icv_border: fmt
                    .border_color
                    .as_deref()
                    .and_then(derive_palette_index)
                    .unwrap_or(ICV_BLACK),
                icv_fill: fmt.bg_color.as_deref().and_then(derive_palette_index),
            });
        }

        Self {
            l_fonts_custom,
            l_xfs,
        }
    }

    fn xf_index_of(&self, style: EnumRowStyle) -> u16 {
        let n_pos = TUP_ROW_STYLES
            .iter()
            .position(|s| *s == style)
            .unwrap_or_default();
        N_IDX_XF_CUSTOM_START + n_pos as u16
    }
}

/// Font index 4 does not exist in BIFF; records from position 4 shift by one.
fn derive_font_index(n_pos_record: usize) -> u16 {
    let n_idx = if n_pos_record >= 4 {
        n_pos_record + 1
    } else {
        n_pos_record
    };
    n_idx as u16
}

fn derive_xls_align(align: &str) -> u8 {
    match align.trim().to_ascii_lowercase().as_str() {
        "left" => 1,
        "center" => 2,
        "right" => 3,
        "fill" => 4,
        "justify" => 5,
        "center_across" => 6,
        "distributed" => 7,
        _ => 0,
    }
}

/// Map `#RRGGBB` to the nearest default palette index.
pub fn derive_palette_index(color: &str) -> Option<u16> {
    let c_hex = color.trim().trim_start_matches('#');
    if c_hex.len() != 6 || !c_hex.chars().all(|chr| chr.is_ascii_hexdigit()) {
        return None;
    }
    let n_rgb = u32::from_str_radix(c_hex, 16).ok()?;
    let (r, g, b) = (
        ((n_rgb >> 16) & 0xFF) as i32,
        ((n_rgb >> 8) & 0xFF) as i32,
        (n_rgb & 0xFF) as i32,
    );
    TUP_PALETTE_DEFAULT
        .iter()
        .enumerate()
        .min_by_key(|(_, (pr, pg, pb))| {
            let (dr, dg, db) = (r - *pr as i32, g - *pg as i32, b - *pb as i32);
            dr * dr + dg * dg + db * db
        })
        .map(|(n_idx, _)| 8 + n_idx as u16)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RecordPayloads

fn push_record(out: &mut Vec<u8>, id: u16, data: &[u8]) {
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(data);
}

fn bof(dt: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&BOF_VERSION_BIFF8.to_le_bytes());
    out[2..4].copy_from_slice(&dt.to_le_bytes());
    out[4..6].copy_from_slice(&0x0DBBu16.to_le_bytes()); // build
    out[6..8].copy_from_slice(&0x07CCu16.to_le_bytes()); // year
    out
}

fn window1() -> [u8; 18] {
    let mut out = [0u8; 18];
    out[14..16].copy_from_slice(&1u16.to_le_bytes()); // cTabSel
    out[16..18].copy_from_slice(&600u16.to_le_bytes()); // wTabRatio
    out
}

fn window2() -> [u8; 18] {
    let mut out = [0u8; 18];
    // Gridlines, headers, zeros, default header color, outline symbols,
    // selected and active tab.
    let grbit: u16 = 0x06B6;
    out[0..2].copy_from_slice(&grbit.to_le_bytes());
    out[6..8].copy_from_slice(&64u16.to_le_bytes()); // icvHdr
    out
}

fn xf_style_record() -> [u8; 20] {
    let mut out = [0u8; 20];
    let flags: u16 = XF_FLAG_LOCKED | XF_FLAG_STYLE | XF_PARENT_NONE;
    out[4..6].copy_from_slice(&flags.to_le_bytes());
    out[6] = 0x20; // general + bottom
    let fill: u16 = ICV_FILL_FORE_DEFAULT | (ICV_FILL_BACK_DEFAULT << 7);
    out[18..20].copy_from_slice(&fill.to_le_bytes());
    out
}

fn xf_cell_record(xf: &BiffXf) -> [u8; 20] {
    let mut out = [0u8; 20];
    out[0..2].copy_from_slice(&xf.n_idx_font.to_le_bytes());
    out[2..4].copy_from_slice(&0u16.to_le_bytes()); // General
    out[4..6].copy_from_slice(&XF_FLAG_LOCKED.to_le_bytes());
    out[6] = 0x20 | (xf.n_align & 0x07);
    // Used-attribute flags live in bits 2..7.
    out[9] = 0xFC;

    let n_dg = u32::from(xf.n_border & 0x0F);
    let n_icv = u32::from(xf.icv_border & 0x7F);
    let border1: u32 = n_dg | (n_dg << 4) | (n_dg << 8) | (n_dg << 12) | (n_icv << 16) | (n_icv << 23);
    let n_pattern = if xf.icv_fill.is_some() {
        N_PATTERN_SOLID
    } else {
        0
    };
    let border2: u32 = n_icv | (n_icv << 7) | (n_pattern << 26);
    let fill: u16 = (xf.icv_fill.unwrap_or(ICV_FILL_FORE_DEFAULT) & 0x7F)
        | (ICV_FILL_BACK_DEFAULT << 7);

    out[10..14].copy_from_slice(&border1.to_le_bytes());
    out[14..18].copy_from_slice(&border2.to_le_bytes());
    out[18..20].copy_from_slice(&fill.to_le_bytes());
    out
}

fn style_normal() -> [u8; 4] {
    let mut out = [0u8; 4];
    out[0..2].copy_from_slice(&0x8000u16.to_le_bytes()); // built-in, XF 0
    out[2] = 0; // Normal
    out[3] = 0xFF;
    out
}

fn colinfo(n_col: u16, n_width: usize) -> [u8; 12] {
    let mut out = [0u8; 12];
    out[0..2].copy_from_slice(&n_col.to_le_bytes());
    out[2..4].copy_from_slice(&n_col.to_le_bytes());
    let n_cx = u16::try_from(n_width.saturating_mul(256)).unwrap_or(u16::MAX);
    out[4..6].copy_from_slice(&n_cx.to_le_bytes());
    out[6..8].copy_from_slice(&N_IDX_XF_DEFAULT_CELL.to_le_bytes());
    out
}

fn dimensions(n_rows: usize, n_cols: usize) -> [u8; 14] {
    let mut out = [0u8; 14];
    out[4..8].copy_from_slice(&(n_rows as u32).to_le_bytes()); // rwMac
    out[10..12].copy_from_slice(&(n_cols as u16).to_le_bytes()); // colMac
    out
}

fn row_record(n_row: u16, n_cols: u16) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..2].copy_from_slice(&n_row.to_le_bytes());
    out[4..6].copy_from_slice(&n_cols.to_le_bytes());
    out[6..8].copy_from_slice(&0x00FFu16.to_le_bytes()); // 12.75pt
    out[12..14].copy_from_slice(&0x0100u16.to_le_bytes());
    out[14..16].copy_from_slice(&N_IDX_XF_DEFAULT_CELL.to_le_bytes());
    out
}

fn cell_header(n_row: u16, n_col: u16, n_xf: u16) -> [u8; 6] {
    let mut out = [0u8; 6];
    out[0..2].copy_from_slice(&n_row.to_le_bytes());
    out[2..4].copy_from_slice(&n_col.to_le_bytes());
    out[4..6].copy_from_slice(&n_xf.to_le_bytes());
    out
}

fn write_short_unicode_string(out: &mut Vec<u8>, s: &str) {
    let l_units: Vec<u16> = s.encode_utf16().take(u8::MAX as usize).collect();
    out.push(l_units.len() as u8);
    out.push(1); // UTF-16LE
    for unit in l_units {
        out.extend_from_slice(&unit.to_le_bytes());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, open_workbook_auto};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::derive_default_style_sheet;
    use crate::spec::SpecPlannedRow;

    fn plan_of(rows: Vec<SpecPlannedRow>) -> SpecSheetPlan {
        SpecSheetPlan {
            sheet_name: "Data".to_string(),
            widths_by_col: vec![8; rows.first().map(|r| r.cells.len()).unwrap_or(0)],
            rows,
            styles: derive_default_style_sheet(),
        }
    }

    #[test]
    fn palette_lookup_picks_nearest_entry() {
        assert_eq!(derive_palette_index("#000000"), Some(8));
        assert_eq!(derive_palette_index("#FFFFFF"), Some(9));
        assert_eq!(derive_palette_index("#ff0000"), Some(10));
        assert_eq!(derive_palette_index("#C0C0C0"), Some(22));
        assert_eq!(derive_palette_index("#FE0101"), Some(10));
        assert_eq!(derive_palette_index("red"), None);
    }

    #[test]
    fn font_index_four_is_skipped() {
        assert_eq!(derive_font_index(3), 3);
        assert_eq!(derive_font_index(4), 5);
        assert_eq!(derive_font_index(6), 7);
    }

    #[test]
    fn highlight_xf_packs_solid_red_fill_and_thin_black_borders() {
        let plan = plan_of(vec![]);
        let table = StyleTable::from_plan(&plan);
        let xf = xf_cell_record(&table.l_xfs[2]);

        let border1 = u32::from_le_bytes([xf[10], xf[11], xf[12], xf[13]]);
        assert_eq!(border1 & 0xFFFF, 0x1111);
        assert_eq!((border1 >> 16) & 0x7F, 8);
        let border2 = u32::from_le_bytes([xf[14], xf[15], xf[16], xf[17]]);
        assert_eq!((border2 >> 26) & 0x3F, 1);
        let fill = u16::from_le_bytes([xf[18], xf[19]]);
        assert_eq!(fill & 0x7F, 10);

        // Header and highlight are bold with different colors; normal uses Arial 10.
        assert_eq!(table.l_fonts_custom.len(), 2);
        assert_eq!(table.l_xfs[1].n_idx_font, 0);
        assert_eq!(table.l_xfs[0].n_idx_font, 5);
        assert_eq!(table.l_xfs[2].n_idx_font, 6);
    }

    #[test]
    fn encoded_workbook_reads_back_through_calamine() {
        let plan = plan_of(vec![
            SpecPlannedRow {
                style: EnumRowStyle::Header,
                cells: vec![
                    EnumCellValue::String("Name".to_string()),
                    EnumCellValue::String("Score".to_string()),
                    EnumCellValue::String("Pass".to_string()),
                ],
            },
            SpecPlannedRow {
                style: EnumRowStyle::Highlight,
                cells: vec![
                    EnumCellValue::String("Tom Lee".to_string()),
                    EnumCellValue::Number(60.0),
                    EnumCellValue::Boolean(false),
                ],
            },
            SpecPlannedRow {
                style: EnumRowStyle::Normal,
                cells: vec![
                    EnumCellValue::String("张三".to_string()),
                    EnumCellValue::Number(85.5),
                    EnumCellValue::None,
                ],
            },
        ]);

        let range = read_back(&plan);
        assert_eq!(
            range.get_value((0, 1)),
            Some(&Data::String("Score".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("Tom Lee".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(60.0)));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Bool(false)));
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("张三".to_string()))
        );
        assert_eq!(range.get_value((2, 1)), Some(&Data::Float(85.5)));
    }

    #[test]
    fn long_text_survives_continue_records() {
        let l_texts = vec![
            "x".repeat(300),
            "y".repeat(20_000),
            "😀".repeat(6_000),
            format!("{}{}", "a".repeat(4_105), "😀".repeat(10)),
            "Tom Lee".to_string(),
        ];
        let mut l_rows: Vec<SpecPlannedRow> = l_texts
            .iter()
            .map(|text| SpecPlannedRow {
                style: EnumRowStyle::Normal,
                cells: vec![EnumCellValue::String(text.clone())],
            })
            .collect();
        l_rows.push(SpecPlannedRow {
            style: EnumRowStyle::Normal,
            cells: vec![EnumCellValue::String("x".repeat(300))],
        });
        let plan = plan_of(l_rows);

        let range = read_back(&plan);
        for (n_idx, text) in l_texts.iter().enumerate() {
            assert_eq!(
                range.get_value((n_idx as u32, 0)),
                Some(&Data::String(text.clone())),
                "row {n_idx}"
            );
        }
        assert_eq!(
            range.get_value((5, 0)),
            Some(&Data::String("x".repeat(300)))
        );

        let v_stream = encode_workbook_stream(&plan).expect("encode");
        let l_records = records_of(&v_stream);
        assert!(l_records.iter().all(|(_, _, data)| data.len() <= N_LEN_RECORD_DATA_MAX));
        assert!(l_records.iter().filter(|(_, id, _)| *id == RECORD_CONTINUE).count() >= 5);

        // The first EXTSST bucket points at the first string header.
        let (_, _, extsst_data) = l_records
            .iter()
            .find(|(_, id, _)| *id == RECORD_EXTSST)
            .expect("extsst");
        assert_eq!(u16::from_le_bytes([extsst_data[0], extsst_data[1]]), 8);
        let n_pos = u32::from_le_bytes([
            extsst_data[2],
            extsst_data[3],
            extsst_data[4],
            extsst_data[5],
        ]) as usize;
        assert_eq!(u16::from_le_bytes([v_stream[n_pos], v_stream[n_pos + 1]]), 300);
    }

    #[test]
    fn shared_strings_are_deduplicated() {
        let plan = plan_of(vec![SpecPlannedRow {
            style: EnumRowStyle::Normal,
            cells: vec![
                EnumCellValue::String("a".to_string()),
                EnumCellValue::String("b".to_string()),
                EnumCellValue::Number(1.0),
                EnumCellValue::String("a".to_string()),
            ],
        }]);
        let strings = SharedStrings::from_plan(&plan).expect("collect");
        assert_eq!(strings.l_units.len(), 2);
        assert_eq!(strings.n_refs, 3);
        assert_eq!(strings.index_of("a"), 0);
        assert_eq!(strings.index_of("b"), 1);
    }

    #[test]
    fn text_beyond_cell_limit_is_rejected() {
        let plan = plan_of(vec![SpecPlannedRow {
            style: EnumRowStyle::Normal,
            cells: vec![EnumCellValue::String("z".repeat(N_LEN_STRING_MAX + 1))],
        }]);
        let err = encode_workbook_stream(&plan).expect_err("too long");
        assert!(matches!(err, SheetIoError::InvalidOptions(_)));
    }

    #[test]
    fn cells_reference_the_xf_of_their_row_style() {
        let row_of = |style| SpecPlannedRow {
            style,
            cells: vec![
                EnumCellValue::String("t".to_string()),
                EnumCellValue::Number(1.0),
                EnumCellValue::Boolean(true),
                EnumCellValue::None,
            ],
        };
        let plan = plan_of(vec![
            row_of(EnumRowStyle::Header),
            row_of(EnumRowStyle::Normal),
            row_of(EnumRowStyle::Highlight),
        ]);
        let v_stream = encode_workbook_stream(&plan).expect("encode");

        let l_cells: Vec<(u16, u16)> = records_of(&v_stream)
            .into_iter()
            .filter(|(_, id, _)| {
                matches!(
                    *id,
                    RECORD_BLANK | RECORD_NUMBER | RECORD_BOOLERR | RECORD_LABELSST
                )
            })
            .map(|(_, _, data)| {
                (
                    u16::from_le_bytes([data[0], data[1]]),
                    u16::from_le_bytes([data[4], data[5]]),
                )
            })
            .collect();
        assert_eq!(l_cells.len(), 12);
        for (n_row, n_xf) in l_cells {
            let n_xf_expected = match n_row {
                0 => 16,
                1 => 17,
                _ => 18,
            };
            assert_eq!(n_xf, n_xf_expected, "row {n_row}");
        }
    }

    fn read_back(plan: &SpecSheetPlan) -> calamine::Range<Data> {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("out.xls");
        render_xls(plan, &path).expect("render xls");

        let mut workbook = open_workbook_auto(&path).expect("open xls");
        assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
        workbook
            .worksheet_range_at(0)
            .expect("first sheet")
            .expect("decode sheet")
    }

    fn records_of(v_stream: &[u8]) -> Vec<(usize, u16, &[u8])> {
        let mut l_records = Vec::new();
        let mut n_pos = 0;
        while n_pos + 4 <= v_stream.len() {
            let id = u16::from_le_bytes([v_stream[n_pos], v_stream[n_pos + 1]]);
            let n_len = u16::from_le_bytes([v_stream[n_pos + 2], v_stream[n_pos + 3]]) as usize;
            l_records.push((n_pos, id, &v_stream[n_pos + 4..n_pos + 4 + n_len]));
            n_pos += 4 + n_len;
        }
        l_records
    }
}
