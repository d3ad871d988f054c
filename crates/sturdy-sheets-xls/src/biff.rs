//! BIFF8 (Binary Interchange File Format) wire handling.
//!
//! A BIFF8 stream is a sequence of records, each with a 4-byte header
//! (2 bytes record type + 2 bytes body length) followed by the body.
//! CONTINUE records (type 0x003C) extend the body of the preceding record
//! beyond the 8224-byte per-record limit.
//!
//! All multi-byte integers are little-endian. Strings have their own
//! encoding: a character count, a flags byte selecting compressed Latin-1
//! vs UTF-16LE, and optional rich-text/extended tails that must be skipped.

use std::io::Read;

use crate::error::{XlsError, XlsResult};

// ── Record types handled by the reader ──────────────────────────────────
pub const BOF: u16 = 0x0809;
pub const EOF: u16 = 0x000A;
pub const CONTINUE: u16 = 0x003C;

pub const BOUNDSHEET: u16 = 0x0085; // Sheet name, type, visibility
pub const SST: u16 = 0x00FC; // Shared String Table
pub const DATEMODE: u16 = 0x0022; // 1900 vs 1904 date system
pub const FORMAT: u16 = 0x041E; // Number format string
pub const XF: u16 = 0x00E0; // Extended Format (cell format record)

pub const LABELSST: u16 = 0x00FD; // Cell containing SST string index
pub const LABEL: u16 = 0x0204; // Cell with inline string (rare in BIFF8)
pub const NUMBER: u16 = 0x0203; // Cell with IEEE 754 double
pub const RK: u16 = 0x027E; // Cell with compressed number (RK encoding)
pub const MULRK: u16 = 0x00BD; // Multiple RK values in one row
pub const BOOLERR: u16 = 0x0205; // Boolean or error cell
pub const FORMULA: u16 = 0x0006; // Formula cell with cached result
pub const STRING: u16 = 0x0207; // Cached string result for preceding FORMULA

// ── BOF fields ──────────────────────────────────────────────────────────
pub const BOF_WORKBOOK_GLOBALS: u16 = 0x0005;
pub const BIFF8_VERSION: u16 = 0x0600;

/// A single BIFF8 record (with CONTINUE bodies already merged).
#[derive(Debug)]
pub struct BiffRecord {
    /// Record type ID (e.g. [`SST`], [`NUMBER`]).
    pub record_type: u16,
    /// Record body bytes (CONTINUE records have been concatenated).
    pub data: Vec<u8>,
}

/// Read all BIFF8 records from a byte stream, merging CONTINUE records
/// into their parent.
pub fn read_all_records<R: Read>(stream: &mut R) -> XlsResult<Vec<BiffRecord>> {
    let mut records: Vec<BiffRecord> = Vec::new();
    let mut header_buf = [0u8; 4];

    loop {
        match stream.read_exact(&mut header_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(XlsError::Io(e)),
        }

        let record_type = u16::from_le_bytes([header_buf[0], header_buf[1]]);
        let body_len = u16::from_le_bytes([header_buf[2], header_buf[3]]) as usize;

        let mut body = vec![0u8; body_len];
        if body_len > 0 {
            stream.read_exact(&mut body)?;
        }

        if record_type == CONTINUE {
            // Append to the previous record's data; an orphaned CONTINUE
            // at stream start is dropped.
            if let Some(prev) = records.last_mut() {
                prev.data.extend_from_slice(&body);
            }
        } else {
            records.push(BiffRecord { record_type, data: body });
        }
    }

    Ok(records)
}

/// Extract `(version, substream_type)` from a BOF record body.
///
/// `version` should be [`BIFF8_VERSION`]; `substream_type` is
/// [`BOF_WORKBOOK_GLOBALS`] for globals, 0x0010 for a worksheet.
pub fn parse_bof(data: &[u8]) -> XlsResult<(u16, u16)> {
    if data.len() < 4 {
        return Err(XlsError::InvalidFormat("BOF record too short".into()));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let dt = u16::from_le_bytes([data[2], data[3]]);
    Ok((version, dt))
}

// ── Little-endian field readers ─────────────────────────────────────────

/// Read a `u8` at `offset`, advancing `offset`.
#[inline]
pub fn read_u8(data: &[u8], offset: &mut usize) -> XlsResult<u8> {
    if *offset >= data.len() {
        return Err(truncated(*offset, 1));
    }
    let v = data[*offset];
    *offset += 1;
    Ok(v)
}

/// Read a `u16` at `offset`, advancing `offset`.
#[inline]
pub fn read_u16(data: &[u8], offset: &mut usize) -> XlsResult<u16> {
    if *offset + 2 > data.len() {
        return Err(truncated(*offset, 2));
    }
    let v = u16::from_le_bytes([data[*offset], data[*offset + 1]]);
    *offset += 2;
    Ok(v)
}

/// Read a `u32` at `offset`, advancing `offset`.
#[inline]
pub fn read_u32(data: &[u8], offset: &mut usize) -> XlsResult<u32> {
    if *offset + 4 > data.len() {
        return Err(truncated(*offset, 4));
    }
    let v = u32::from_le_bytes([
        data[*offset],
        data[*offset + 1],
        data[*offset + 2],
        data[*offset + 3],
    ]);
    *offset += 4;
    Ok(v)
}

/// Read an IEEE 754 double at `offset`, advancing `offset`.
#[inline]
pub fn read_f64(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    if *offset + 8 > data.len() {
        return Err(truncated(*offset, 8));
    }
    let bytes: [u8; 8] = data[*offset..*offset + 8].try_into().unwrap();
    *offset += 8;
    Ok(f64::from_le_bytes(bytes))
}

fn truncated(offset: usize, need: usize) -> XlsError {
    XlsError::Parse(format!(
        "unexpected end of data at offset {offset}, need {need} byte(s)"
    ))
}

/// Decode an RK-encoded number.
///
/// RK encoding (4 bytes):
/// - Bit 0: if 1, the decoded number should be divided by 100
/// - Bit 1: if 1, value is a signed 30-bit integer in bits 2..31;
///   if 0, bits 2..31 are the upper 30 bits of an IEEE 754 double
///   whose lower 34 bits are zero
#[inline]
pub fn decode_rk(rk: u32) -> f64 {
    let div100 = (rk & 0x01) != 0;
    let is_integer = (rk & 0x02) != 0;

    let value = if is_integer {
        ((rk as i32) >> 2) as f64
    } else {
        let upper = (rk & 0xFFFF_FFFC) as u64;
        f64::from_bits(upper << 32)
    };

    if div100 {
        value / 100.0
    } else {
        value
    }
}

/// Read an RK value from 4 bytes at `offset`.
#[inline]
pub fn read_rk(data: &[u8], offset: &mut usize) -> XlsResult<f64> {
    let raw = read_u32(data, offset)?;
    Ok(decode_rk(raw))
}

// ── BIFF8 string decoding ───────────────────────────────────────────────

/// Read a BIFF8 "short" string (1-byte length prefix, used in BOUNDSHEET).
pub fn read_short_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u8(data, offset)? as u16;
    let flags = read_u8(data, offset)?;
    read_character_data(data, offset, char_count, flags)
}

/// Read a BIFF8 Unicode string with a 2-byte length prefix (SST, LABEL,
/// STRING, FORMAT records).
///
/// Flags bit 0 selects compressed Latin-1 vs UTF-16LE; bit 2 (`fExtSt`)
/// and bit 3 (`fRichSt`) announce tails that are skipped after the
/// character data.
pub fn read_unicode_string(data: &[u8], offset: &mut usize) -> XlsResult<String> {
    let char_count = read_u16(data, offset)?;
    let flags = read_u8(data, offset)?;

    let is_rich = (flags & 0x08) != 0;
    let has_ext = (flags & 0x04) != 0;

    let run_count = if is_rich { read_u16(data, offset)? } else { 0 };
    let ext_size = if has_ext { read_u32(data, offset)? } else { 0 };

    let text = read_character_data(data, offset, char_count, flags)?;

    // Rich text runs are 4 bytes each (char_pos u16 + font_idx u16)
    if is_rich {
        *offset += run_count as usize * 4;
    }
    if has_ext {
        *offset += ext_size as usize;
    }

    Ok(text)
}

/// Read character data (no header) given char_count and the flags byte.
fn read_character_data(
    data: &[u8],
    offset: &mut usize,
    char_count: u16,
    flags: u8,
) -> XlsResult<String> {
    let count = char_count as usize;

    if (flags & 0x01) != 0 {
        // UTF-16LE: 2 bytes per character
        let byte_len = count * 2;
        if *offset + byte_len > data.len() {
            return Err(truncated(*offset, byte_len));
        }
        let mut units = Vec::with_capacity(count);
        for i in 0..count {
            units.push(u16::from_le_bytes([
                data[*offset + i * 2],
                data[*offset + i * 2 + 1],
            ]));
        }
        *offset += byte_len;
        String::from_utf16(&units)
            .map_err(|e| XlsError::Parse(format!("invalid UTF-16 string: {e}")))
    } else {
        // Compressed Latin-1: 1 byte per character
        if *offset + count > data.len() {
            return Err(truncated(*offset, count));
        }
        let s: String = data[*offset..*offset + count]
            .iter()
            .map(|&b| b as char)
            .collect();
        *offset += count;
        Ok(s)
    }
}

/// Parse the SST (Shared String Table) from a concatenated buffer
/// (SST body + CONTINUE bodies already joined).
///
/// Layout: total string refs (u32), unique string count (u32), then that
/// many Unicode strings.
pub fn parse_sst(data: &[u8]) -> XlsResult<Vec<String>> {
    let mut offset = 0;

    let _total_refs = read_u32(data, &mut offset)?;
    let unique_count = read_u32(data, &mut offset)? as usize;

    let mut strings = Vec::with_capacity(unique_count);

    for i in 0..unique_count {
        match read_unicode_string(data, &mut offset) {
            Ok(s) => strings.push(s),
            Err(e) => {
                // Some files have SST padding or truncation issues; keep
                // whatever decoded cleanly.
                log::warn!("SST parse error at string {i}/{unique_count}: {e}");
                break;
            }
        }
    }

    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rk_integer() {
        // Integer 42: bits 2..31 = 42, bit 1 = 1 (integer), bit 0 = 0
        let rk = (42u32 << 2) | 0x02;
        assert_eq!(decode_rk(rk), 42.0);
    }

    #[test]
    fn test_decode_rk_negative_integer() {
        let rk = ((-5i32 << 2) as u32) | 0x02;
        assert_eq!(decode_rk(rk), -5.0);
    }

    #[test]
    fn test_decode_rk_div100() {
        // Integer 314 / 100 = 3.14
        let rk = (314u32 << 2) | 0x03;
        assert!((decode_rk(rk) - 3.14).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_rk_float() {
        let bits = 42.0_f64.to_bits();
        let rk = ((bits >> 32) as u32) & 0xFFFF_FFFC;
        assert_eq!(decode_rk(rk), 42.0);
    }

    #[test]
    fn test_read_le_fields() {
        let data = [0x34, 0x12];
        let mut off = 0;
        assert_eq!(read_u16(&data, &mut off).unwrap(), 0x1234);
        assert_eq!(off, 2);

        let bytes = 3.14_f64.to_le_bytes();
        let mut off = 0;
        assert!((read_f64(&bytes, &mut off).unwrap() - 3.14).abs() < f64::EPSILON);
    }

    #[test]
    fn test_read_compressed_string() {
        let data = [0x03, 0x00, 0x00, b'A', b'B', b'C'];
        let mut offset = 0;
        assert_eq!(read_unicode_string(&data, &mut offset).unwrap(), "ABC");
        assert_eq!(offset, 6);
    }

    #[test]
    fn test_read_wide_string() {
        let data = [0x02, 0x00, 0x01, b'H', 0x00, b'i', 0x00];
        let mut offset = 0;
        assert_eq!(read_unicode_string(&data, &mut offset).unwrap(), "Hi");
        assert_eq!(offset, 7);
    }

    #[test]
    fn test_read_short_string() {
        let data = [0x02, 0x00, b'O', b'K'];
        let mut offset = 0;
        assert_eq!(read_short_string(&data, &mut offset).unwrap(), "OK");
    }

    #[test]
    fn test_parse_sst() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes()); // total refs
        buf.extend_from_slice(&2u32.to_le_bytes()); // unique strings
        buf.extend_from_slice(&[0x01, 0x00, 0x00, b'A']);
        buf.extend_from_slice(&[0x02, 0x00, 0x00, b'B', b'C']);

        assert_eq!(parse_sst(&buf).unwrap(), vec!["A", "BC"]);
    }

    #[test]
    fn test_continue_records_merged() {
        // A NUMBER record split by a CONTINUE: bodies should concatenate
        let mut stream = Vec::new();
        stream.extend_from_slice(&NUMBER.to_le_bytes());
        stream.extend_from_slice(&2u16.to_le_bytes());
        stream.extend_from_slice(&[0xAA, 0xBB]);
        stream.extend_from_slice(&CONTINUE.to_le_bytes());
        stream.extend_from_slice(&2u16.to_le_bytes());
        stream.extend_from_slice(&[0xCC, 0xDD]);

        let records = read_all_records(&mut stream.as_slice()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type, NUMBER);
        assert_eq!(records[0].data, vec![0xAA, 0xBB, 0xCC, 0xDD]);
    }
}
