//! # sturdy-sheets-xlsx
//!
//! XLSX (Office Open XML) reading engine for sturdy-sheets.
//!
//! This is the default engine of the fallback chain: it reads the selected
//! sheet of an `.xlsx` package straight into a
//! [`Dataset`](sturdy_sheets_core::Dataset).

pub mod error;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
