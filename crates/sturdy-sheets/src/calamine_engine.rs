//! Secondary engine backed by the `calamine` crate
//!
//! calamine reads both modern and legacy formats without any of our own
//! format code, which makes it the broad-compatibility middle step of the
//! fallback chain. Its used-range convention differs from the native
//! engine: leading empty rows/columns before the first value are not part
//! of the range, so the header is simply the first row calamine yields.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use sturdy_sheets_core::{CellError, CellValue, Dataset, SheetSelector};

use crate::error::EngineError;

pub(crate) fn read_file(path: &Path, selector: &SheetSelector) -> Result<Dataset, EngineError> {
    let mut workbook = open_workbook_auto(path)?;

    let names = workbook.sheet_names().to_vec();
    let idx = selector.resolve(&names)?;
    let name = names[idx].clone();

    let range = workbook.worksheet_range(&name)?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(convert).collect())
        .collect();

    Ok(Dataset::from_rows(name, rows))
}

fn convert(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::DateTime(naive),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::string(s.clone()),
        Data::Error(e) => CellValue::Error(convert_error(e)),
    }
}

fn convert_error(e: &calamine::CellErrorType) -> CellError {
    use calamine::CellErrorType;

    match e {
        CellErrorType::Null => CellError::Null,
        CellErrorType::Div0 => CellError::Div0,
        CellErrorType::Value => CellError::Value,
        CellErrorType::Ref => CellError::Ref,
        CellErrorType::Name => CellError::Name,
        CellErrorType::Num => CellError::Num,
        CellErrorType::NA => CellError::Na,
        CellErrorType::GettingData => CellError::Value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_scalars() {
        assert_eq!(convert(&Data::Empty), CellValue::Empty);
        assert_eq!(convert(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(convert(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(convert(&Data::Bool(true)), CellValue::Boolean(true));
        assert_eq!(
            convert(&Data::String("hi".into())),
            CellValue::string("hi")
        );
    }

    #[test]
    fn test_convert_errors() {
        assert_eq!(
            convert(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Error(CellError::Div0)
        );
        assert_eq!(
            convert(&Data::Error(calamine::CellErrorType::NA)),
            CellValue::Error(CellError::Na)
        );
    }

    #[test]
    fn test_iso_strings_pass_through_as_text() {
        assert_eq!(
            convert(&Data::DateTimeIso("2024-01-15T00:00:00".into())),
            CellValue::string("2024-01-15T00:00:00")
        );
    }
}
