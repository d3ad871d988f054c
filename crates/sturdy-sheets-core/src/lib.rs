//! # sturdy-sheets-core
//!
//! Core data structures for the sturdy-sheets tabular reader.
//!
//! This crate provides the types shared by every decoding engine:
//! - [`Dataset`] - The result of a read: rows × named columns
//! - [`CellValue`] - Cell values (numbers, strings, booleans, dates, errors)
//! - [`SheetSelector`] - Which sheet of a workbook to read
//! - [`parse_cell_ref`] - A1-style reference parsing
//! - [`dates`] - Excel serial date conversion
//!
//! ## Example
//!
//! ```rust
//! use sturdy_sheets_core::{CellValue, Dataset};
//!
//! let ds = Dataset::from_rows(
//!     "Sheet1",
//!     vec![
//!         vec!["name".into(), "score".into()],
//!         vec!["alice".into(), CellValue::Number(10.0)],
//!     ],
//! );
//!
//! assert_eq!(ds.column_names(), &["name", "score"]);
//! assert_eq!(ds.row_count(), 1);
//! ```

pub mod address;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod selector;
pub mod value;

// Re-exports for convenience
pub use address::parse_cell_ref;
pub use dataset::{ColumnKind, Dataset};
pub use error::{Error, Result};
pub use selector::SheetSelector;
pub use value::{CellError, CellValue};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
