//! # sturdy-sheets-xls
//!
//! XLS (BIFF8) reading engine for sturdy-sheets.
//!
//! This is the legacy-format engine of the fallback chain: it is only ever
//! attempted for files with a `.xls` extension, and reads the selected
//! sheet of a BIFF8 workbook into a
//! [`Dataset`](sturdy_sheets_core::Dataset).

pub mod biff;
pub mod error;
pub mod reader;

pub use error::{XlsError, XlsResult};
pub use reader::XlsReader;
