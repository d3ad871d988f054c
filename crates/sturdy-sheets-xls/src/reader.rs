//! XLS (BIFF8) reader.
//!
//! Opens a Compound File Binary (CFB/OLE2) container, reads the `Workbook`
//! stream, parses BIFF8 records, and turns the selected sheet's cell
//! records into a [`Dataset`]. Presentation records (fonts, borders, row
//! heights) are skipped; number formats are read only far enough to tell
//! date cells from plain numbers.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use sturdy_sheets_core::{dates, CellError, CellValue, Dataset, SheetSelector};

use crate::biff::{self, BiffRecord};
use crate::error::{XlsError, XlsResult};

/// XLS file reader
pub struct XlsReader;

/// Metadata for a sheet parsed from the BOUNDSHEET record.
#[derive(Debug)]
struct SheetInfo {
    /// Sheet type: 0 = worksheet, 2 = chart, 6 = macro/VBA.
    sheet_type: u8,
    /// Sheet name.
    name: String,
}

/// Workbook-global state collected from the globals substream.
#[derive(Debug, Default)]
struct Globals {
    sst: Vec<String>,
    sheets: Vec<SheetInfo>,
    date_1904: bool,
    /// Format index (ifmt) per XF record, in XF order.
    xf_formats: Vec<u16>,
    /// Custom number format strings, by ifmt.
    formats: HashMap<u16, String>,
}

impl Globals {
    /// Whether the XF at `xf_idx` formats its value as a date/time.
    fn is_date_xf(&self, xf_idx: u16) -> bool {
        let Some(&ifmt) = self.xf_formats.get(xf_idx as usize) else {
            return false;
        };
        if is_builtin_date_format(ifmt) {
            return true;
        }
        self.formats
            .get(&ifmt)
            .is_some_and(|f| format_looks_like_date(f))
    }
}

/// Builtin number format IDs that render as dates or times ([MS-XLS] §2.4.126).
fn is_builtin_date_format(ifmt: u16) -> bool {
    matches!(ifmt, 14..=22 | 27..=36 | 45..=47 | 50..=58)
}

/// Heuristic date detection for custom format strings: any of the date
/// letters outside quoted literals and `[...]` color/locale blocks.
fn format_looks_like_date(fmt: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    for c in fmt.chars() {
        match c {
            '"' if !in_brackets => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S'
                if !in_quotes && !in_brackets =>
            {
                return true;
            }
            _ => {}
        }
    }
    false
}

impl XlsReader {
    /// Read the selected sheet of an XLS file into a dataset
    pub fn read_file<P: AsRef<Path>>(path: P, selector: &SheetSelector) -> XlsResult<Dataset> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read(file, selector)
    }

    /// Read the selected sheet from any `Read + Seek` source
    pub fn read<R: Read + Seek>(reader: R, selector: &SheetSelector) -> XlsResult<Dataset> {
        let mut cfb = cfb::CompoundFile::open(reader)?;

        // Some files use "Book" (BIFF5 naming) for the stream
        let stream_path = if cfb.exists("/Workbook") {
            "/Workbook"
        } else if cfb.exists("/Book") {
            "/Book"
        } else {
            return Err(XlsError::InvalidFormat(
                "no Workbook or Book stream found in CFB".into(),
            ));
        };

        let mut stream_data = Vec::new();
        {
            let mut stream = cfb.open_stream(stream_path)?;
            stream.read_to_end(&mut stream_data)?;
        }

        let records = biff::read_all_records(&mut stream_data.as_slice())?;
        let (globals, globals_end_idx) = Self::parse_globals(&records)?;

        // Resolve the selector against worksheet names (charts and macro
        // sheets are not selectable)
        let names: Vec<String> = globals
            .sheets
            .iter()
            .filter(|s| s.sheet_type == 0)
            .map(|s| s.name.clone())
            .collect();
        let ws_idx = selector.resolve(&names)?;

        // Substream groups follow BOUNDSHEET order, including non-worksheets
        let biff_idx = globals
            .sheets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.sheet_type == 0)
            .nth(ws_idx)
            .map(|(i, _)| i)
            .expect("resolved index is within the worksheet list");

        let groups = Self::split_sheet_records(&records[globals_end_idx + 1..]);
        log::debug!(
            "reading xls sheet {:?} (substream {biff_idx} of {})",
            names[ws_idx],
            groups.len()
        );

        let grid = match groups.get(biff_idx) {
            Some(group) => Self::parse_cells(group, &globals)?,
            None => Vec::new(),
        };

        Ok(Dataset::from_rows(names[ws_idx].clone(), grid))
    }

    /// Parse the workbook globals substream (everything before the first
    /// EOF that follows the globals BOF). Returns the collected state and
    /// the record index of that EOF.
    fn parse_globals(records: &[BiffRecord]) -> XlsResult<(Globals, usize)> {
        let mut globals = Globals::default();
        let mut in_globals = false;

        for (idx, rec) in records.iter().enumerate() {
            match rec.record_type {
                biff::BOF => {
                    let (version, dt) = biff::parse_bof(&rec.data)?;
                    if dt == biff::BOF_WORKBOOK_GLOBALS {
                        if version != biff::BIFF8_VERSION {
                            return Err(XlsError::UnsupportedVersion(format!(
                                "expected BIFF8 (0x0600), got 0x{version:04X}"
                            )));
                        }
                        in_globals = true;
                    }
                }
                biff::EOF if in_globals => {
                    return Ok((globals, idx));
                }
                biff::SST if in_globals => {
                    globals.sst = biff::parse_sst(&rec.data)?;
                }
                biff::BOUNDSHEET if in_globals => {
                    globals.sheets.push(Self::parse_boundsheet(&rec.data)?);
                }
                biff::DATEMODE if in_globals => {
                    if rec.data.len() >= 2 {
                        globals.date_1904 =
                            u16::from_le_bytes([rec.data[0], rec.data[1]]) == 1;
                    }
                }
                biff::XF if in_globals => {
                    // ifnt(2) + ifmt(2) + ...; only the format index matters
                    if rec.data.len() >= 4 {
                        globals
                            .xf_formats
                            .push(u16::from_le_bytes([rec.data[2], rec.data[3]]));
                    }
                }
                biff::FORMAT if in_globals => {
                    let mut off = 0;
                    if let (Ok(ifmt), Ok(s)) = (
                        biff::read_u16(&rec.data, &mut off),
                        biff::read_unicode_string(&rec.data, &mut off),
                    ) {
                        globals.formats.insert(ifmt, s);
                    }
                }
                _ => {}
            }
        }

        Err(XlsError::InvalidFormat(
            "no workbook globals substream found".into(),
        ))
    }

    /// Parse a BOUNDSHEET record body: offset(4) + visibility(1) +
    /// type(1) + short string name.
    fn parse_boundsheet(data: &[u8]) -> XlsResult<SheetInfo> {
        let mut offset = 0;
        let _abs_offset = biff::read_u32(data, &mut offset)?;
        let _visibility = biff::read_u8(data, &mut offset)?;
        let sheet_type = biff::read_u8(data, &mut offset)?;
        let name = biff::read_short_string(data, &mut offset)?;

        Ok(SheetInfo { sheet_type, name })
    }

    /// Split the post-globals records into per-sheet groups (each BOF..EOF
    /// pair is one substream).
    fn split_sheet_records(records: &[BiffRecord]) -> Vec<Vec<&BiffRecord>> {
        let mut groups: Vec<Vec<&BiffRecord>> = Vec::new();
        let mut current: Option<Vec<&BiffRecord>> = None;
        let mut depth = 0i32;

        for rec in records {
            match rec.record_type {
                biff::BOF => {
                    if depth == 0 {
                        current = Some(Vec::new());
                    }
                    depth += 1;
                }
                biff::EOF => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(group) = current.take() {
                            groups.push(group);
                        }
                    }
                }
                _ => {
                    if let Some(ref mut group) = current {
                        group.push(rec);
                    }
                }
            }
        }

        groups
    }

    /// Parse one sheet's cell records into a dense grid.
    fn parse_cells(records: &[&BiffRecord], globals: &Globals) -> XlsResult<Vec<Vec<CellValue>>> {
        let mut grid: Vec<Vec<CellValue>> = Vec::new();
        // A FORMULA with a string result is followed by a STRING record
        let mut pending_string_cell: Option<(u16, u16)> = None;

        for rec in records {
            let data = &rec.data;
            match rec.record_type {
                biff::LABELSST => {
                    pending_string_cell = None;
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let col = biff::read_u16(data, &mut off)?;
                    let _xf = biff::read_u16(data, &mut off)?;
                    let sst_idx = biff::read_u32(data, &mut off)? as usize;

                    match globals.sst.get(sst_idx) {
                        Some(s) => set_cell(&mut grid, row, col, CellValue::string(s.clone())),
                        None => log::warn!("SST index {sst_idx} out of range at r{row}c{col}"),
                    }
                }
                biff::LABEL => {
                    pending_string_cell = None;
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let col = biff::read_u16(data, &mut off)?;
                    let _xf = biff::read_u16(data, &mut off)?;
                    let text = biff::read_unicode_string(data, &mut off)?;
                    set_cell(&mut grid, row, col, CellValue::String(text));
                }
                biff::NUMBER => {
                    pending_string_cell = None;
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let col = biff::read_u16(data, &mut off)?;
                    let xf = biff::read_u16(data, &mut off)?;
                    let value = biff::read_f64(data, &mut off)?;
                    set_cell(&mut grid, row, col, numeric_cell(globals, xf, value));
                }
                biff::RK => {
                    pending_string_cell = None;
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let col = biff::read_u16(data, &mut off)?;
                    let xf = biff::read_u16(data, &mut off)?;
                    let value = biff::read_rk(data, &mut off)?;
                    set_cell(&mut grid, row, col, numeric_cell(globals, xf, value));
                }
                biff::MULRK => {
                    pending_string_cell = None;
                    // row(2) + first_col(2) + [xf(2) + rk(4)]* + last_col(2)
                    if data.len() < 6 {
                        return Err(XlsError::Parse("MULRK record too short".into()));
                    }
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let first_col = biff::read_u16(data, &mut off)?;
                    let last_col =
                        u16::from_le_bytes([data[data.len() - 2], data[data.len() - 1]]);
                    let rk_data_end = data.len() - 2;

                    let mut col = first_col;
                    while off + 6 <= rk_data_end && col <= last_col {
                        let xf = biff::read_u16(data, &mut off)?;
                        let value = biff::read_rk(data, &mut off)?;
                        set_cell(&mut grid, row, col, numeric_cell(globals, xf, value));
                        col += 1;
                    }
                }
                biff::BOOLERR => {
                    pending_string_cell = None;
                    let mut off = 0;
                    let row = biff::read_u16(data, &mut off)?;
                    let col = biff::read_u16(data, &mut off)?;
                    let _xf = biff::read_u16(data, &mut off)?;
                    let val = biff::read_u8(data, &mut off)?;
                    let is_error = biff::read_u8(data, &mut off)?;

                    let cell = if is_error != 0 {
                        CellValue::Error(CellError::from_code(val).unwrap_or(CellError::Value))
                    } else {
                        CellValue::Boolean(val != 0)
                    };
                    set_cell(&mut grid, row, col, cell);
                }
                biff::FORMULA => {
                    pending_string_cell = Self::parse_formula(data, globals, &mut grid)?;
                }
                biff::STRING => {
                    if let Some((row, col)) = pending_string_cell.take() {
                        let mut off = 0;
                        let text = biff::read_unicode_string(data, &mut off)?;
                        set_cell(&mut grid, row, col, CellValue::String(text));
                    }
                }
                _ => {
                    // Presentation and structure records are irrelevant here
                }
            }
        }

        Ok(grid)
    }

    /// FORMULA: row(2) + col(2) + xf(2) + result(8) + options(2) + ...
    ///
    /// Only the cached result matters for a dataset; the formula bytes are
    /// never decoded. Returns `(row, col)` when the cached result is a
    /// string, which arrives in the next STRING record.
    fn parse_formula(
        data: &[u8],
        globals: &Globals,
        grid: &mut Vec<Vec<CellValue>>,
    ) -> XlsResult<Option<(u16, u16)>> {
        if data.len() < 14 {
            return Err(XlsError::Parse("FORMULA record too short".into()));
        }

        let mut off = 0;
        let row = biff::read_u16(data, &mut off)?;
        let col = biff::read_u16(data, &mut off)?;
        let xf = biff::read_u16(data, &mut off)?;
        let result = &data[off..off + 8];

        // Special results are tagged with 0xFFFF in the top two bytes
        if result[6] == 0xFF && result[7] == 0xFF {
            match result[0] {
                // String results arrive in the next STRING record
                0x00 => return Ok(Some((row, col))),
                0x01 => set_cell(grid, row, col, CellValue::Boolean(result[2] != 0)),
                0x02 => set_cell(
                    grid,
                    row,
                    col,
                    CellValue::Error(CellError::from_code(result[2]).unwrap_or(CellError::Value)),
                ),
                // Empty result
                _ => {}
            }
        } else {
            let value = f64::from_le_bytes(result.try_into().unwrap());
            set_cell(grid, row, col, numeric_cell(globals, xf, value));
        }

        Ok(None)
    }
}

/// Place a value in the grid, growing it as needed. Empty values are not
/// stored (absent cells already read back as empty).
fn set_cell(grid: &mut Vec<Vec<CellValue>>, row: u16, col: u16, value: CellValue) {
    if value.is_empty() {
        return;
    }
    let (row, col) = (row as usize, col as usize);
    if grid.len() <= row {
        grid.resize_with(row + 1, Vec::new);
    }
    if grid[row].len() <= col {
        grid[row].resize(col + 1, CellValue::Empty);
    }
    grid[row][col] = value;
}

/// A numeric cell is a date when its XF says so, otherwise a plain number.
fn numeric_cell(globals: &Globals, xf_idx: u16, value: f64) -> CellValue {
    if globals.is_date_xf(xf_idx) {
        if let Some(dt) = dates::from_excel_serial(value, globals.date_1904) {
            return CellValue::DateTime(dt);
        }
    }
    CellValue::Number(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_date_formats() {
        assert!(is_builtin_date_format(14)); // m/d/yyyy
        assert!(is_builtin_date_format(22)); // m/d/yyyy h:mm
        assert!(is_builtin_date_format(45)); // mm:ss
        assert!(!is_builtin_date_format(0)); // General
        assert!(!is_builtin_date_format(2)); // 0.00
    }

    #[test]
    fn test_custom_format_date_detection() {
        assert!(format_looks_like_date("yyyy-mm-dd"));
        assert!(format_looks_like_date("[$-409]dddd"));
        assert!(!format_looks_like_date("0.00"));
        assert!(!format_looks_like_date("#,##0"));
        // Date letters inside quoted literals don't count
        assert!(!format_looks_like_date("0.00\" meters\""));
    }
}
