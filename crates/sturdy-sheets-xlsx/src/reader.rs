//! XLSX reader
//!
//! Opens the ZIP package, reads the shared-strings table and the workbook's
//! sheet list, then stream-parses only the selected worksheet into a cell
//! grid. Styles, comments and other presentation parts are never touched.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use sturdy_sheets_core::{parse_cell_ref, CellError, CellValue, Dataset, SheetSelector};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x000a_` = LF (line feed)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' {
            let mut hex_chars = String::new();
            let mut is_escape = false;

            if chars.peek() == Some(&'x') {
                chars.next(); // consume 'x'

                for _ in 0..4 {
                    if let Some(&ch) = chars.peek() {
                        if ch.is_ascii_hexdigit() {
                            hex_chars.push(ch);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }

                if hex_chars.len() == 4 && chars.peek() == Some(&'_') {
                    chars.next(); // consume closing '_'
                    if let Ok(code) = u32::from_str_radix(&hex_chars, 16) {
                        if let Some(decoded) = char::from_u32(code) {
                            result.push(decoded);
                            is_escape = true;
                        }
                    }
                }
            }

            if !is_escape {
                result.push('_');
                if !hex_chars.is_empty() {
                    result.push('x');
                    result.push_str(&hex_chars);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read the selected sheet of an XLSX file into a dataset
    pub fn read_file<P: AsRef<Path>>(path: P, selector: &SheetSelector) -> XlsxResult<Dataset> {
        let file = File::open(path)?;
        Self::read(file, selector)
    }

    /// Read the selected sheet from any `Read + Seek` source
    pub fn read<R: Read + Seek>(reader: R, selector: &SheetSelector) -> XlsxResult<Dataset> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX package
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let names: Vec<String> = sheet_info.iter().map(|(name, _)| name.clone()).collect();
        let sheet_idx = selector.resolve(&names)?;
        let (name, r_id) = &sheet_info[sheet_idx];

        let part = sheet_paths
            .get(r_id)
            .ok_or_else(|| XlsxError::MissingPart(format!("worksheet part for sheet {name:?}")))?;

        log::debug!("reading xlsx sheet {name:?} from part {part}");
        let grid = Self::read_sheet_cells(&mut archive, part, &shared_strings)?;

        Ok(Dataset::from_rows(name.clone(), grid))
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"t" if in_si => {
                        in_t = true;
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"t" => {
                        in_t = false;
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current_string.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names and rIds, in workbook order
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<(String, String)>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            b"r:id" => {
                                r_id = attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push((name, r_id));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if sheets.is_empty() {
            return Err(XlsxError::InvalidFormat("workbook has no sheets".into()));
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to map rIds to worksheet part paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => {
                                id = attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            b"Target" => {
                                target = attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            b"Type" => {
                                rel_type = attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ unless absolute
                            let full_path = if let Some(stripped) = target.strip_prefix('/') {
                                stripped.to_string()
                            } else {
                                format!("xl/{}", target)
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Stream-parse one worksheet part into a dense cell grid
    fn read_sheet_cells<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        part: &str,
        shared_strings: &[String],
    ) -> XlsxResult<Vec<Vec<CellValue>>> {
        let file = archive
            .by_name(part)
            .map_err(|_| XlsxError::MissingPart(part.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut grid: Vec<Vec<CellValue>> = Vec::new();

        // Current cell state
        let mut current_cell_ref: Option<String> = None;
        let mut current_cell_type: Option<String> = None;
        let mut current_value: Option<String> = None;
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                // A self-closing <c/> carries no value and contributes nothing
                Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {}
                Ok(Event::Start(e)) if e.name().as_ref() == b"c" => {
                    in_cell = true;
                    current_cell_ref = None;
                    current_cell_type = None;
                    current_value = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                current_cell_ref =
                                    attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            b"t" => {
                                current_cell_type =
                                    attr.decode_and_unescape_value(&xml_reader).ok().map(|s| s.to_string());
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"v" if in_cell => in_value = true,
                    b"is" if in_cell => in_inline_str = true,
                    b"t" if in_inline_str => in_inline_text = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(ref cell_ref) = current_cell_ref {
                            Self::store_cell(
                                &mut grid,
                                cell_ref,
                                current_cell_type.as_deref(),
                                current_value.as_deref(),
                                shared_strings,
                            )?;
                        }
                        in_cell = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" if in_inline_str => in_inline_text = false,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_value {
                        if let Ok(text) = e.unescape() {
                            current_value = Some(text.to_string());
                        }
                    } else if in_inline_text {
                        if let Ok(text) = e.unescape() {
                            current_value = Some(text.to_string());
                            current_cell_type = Some("inlineStr".to_string());
                        }
                    }
                    // Formula text inside <f> is never captured; only the
                    // cached <v> result matters for a dataset.
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(grid)
    }

    /// Resolve one cell's type/value pair and place it in the grid
    fn store_cell(
        grid: &mut Vec<Vec<CellValue>>,
        cell_ref: &str,
        cell_type: Option<&str>,
        value: Option<&str>,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let (row, col) = parse_cell_ref(cell_ref)?;

        let cell_value = match (cell_type, value) {
            (_, None) => CellValue::Empty,
            (Some("s"), Some(v)) => {
                let idx: usize = v
                    .parse()
                    .map_err(|_| XlsxError::Parse(format!("bad shared string index: {v}")))?;
                match shared_strings.get(idx) {
                    Some(s) => CellValue::String(s.clone()),
                    None => {
                        log::warn!("shared string index {idx} out of range at {cell_ref}");
                        CellValue::Empty
                    }
                }
            }
            (Some("str"), Some(v)) => CellValue::string(v),
            (Some("inlineStr"), Some(v)) => CellValue::string(decode_excel_escapes(v)),
            (Some("b"), Some(v)) => CellValue::Boolean(v != "0"),
            (Some("e"), Some(v)) => match CellError::from_str(v) {
                Some(err) => CellValue::Error(err),
                None => CellValue::string(v),
            },
            (Some("d"), Some(v)) => Self::parse_iso_datetime(v)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::string(v)),
            // Default (t="n" or no t attribute): numeric
            (_, Some(v)) => match v.parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::string(v),
            },
        };

        if !cell_value.is_empty() {
            let row = row as usize;
            let col = col as usize;
            if grid.len() <= row {
                grid.resize_with(row + 1, Vec::new);
            }
            if grid[row].len() <= col {
                grid[row].resize(col + 1, CellValue::Empty);
            }
            grid[row][col] = cell_value;
        }

        Ok(())
    }

    /// Parse the ISO 8601 datetime used by `t="d"` cells
    fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode_excel_escapes("a_x000a_b"), "a\nb");
        assert_eq!(decode_excel_escapes("tab_x0009_here"), "tab\there");
        assert_eq!(decode_excel_escapes("escaped_x005f_underscore"), "escaped_underscore");
        assert_eq!(decode_excel_escapes("none"), "none");
        // A truncated sequence passes through untouched
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
    }

    #[test]
    fn test_parse_iso_datetime() {
        let dt = XlsxReader::parse_iso_datetime("2024-01-15T12:30:00").unwrap();
        assert_eq!(dt.to_string(), "2024-01-15 12:30:00");

        let d = XlsxReader::parse_iso_datetime("2024-01-15").unwrap();
        assert_eq!(d.to_string(), "2024-01-15 00:00:00");

        assert!(XlsxReader::parse_iso_datetime("not a date").is_none());
    }
}
