//! # sturdy-sheets
//!
//! Fault-tolerant spreadsheet reading for Rust.
//!
//! Give it a path and an optional sheet selector; it tries a fixed, ordered
//! list of decoding engines until one produces a tabular dataset:
//!
//! 1. The built-in XLSX (Office Open XML) engine
//! 2. The [`calamine`] crate, which also handles legacy formats
//!    (cargo feature `calamine`, on by default)
//! 3. For `.xls` paths only, the built-in BIFF8 engine
//!    (cargo feature `xls`, opt-in)
//!
//! Intermediate failures are recovered and recorded; the only error a
//! caller sees is [`UnreadableFileError`], whose message says how to enable
//! more backends and suggests re-saving the file as `.xlsx`.
//!
//! ## Example
//!
//! ```no_run
//! use sturdy_sheets::prelude::*;
//!
//! let ds = read_table("sales.xls", "Q3")?;
//! for row in ds.rows() {
//!     println!("{row:?}");
//! }
//! # Ok::<(), sturdy_sheets::UnreadableFileError>(())
//! ```

pub mod engine;
pub mod error;
pub mod prelude;
pub mod reader;

#[cfg(feature = "calamine")]
mod calamine_engine;

pub use engine::EngineKind;
pub use error::{EngineAttempt, EngineError, UnreadableFileError};
pub use reader::{read_table, TableReader};

// Re-export core types
pub use sturdy_sheets_core::{
    CellError, CellValue, ColumnKind, Dataset, Error, Result, SheetSelector,
};

// Re-export the engines for direct use
pub use sturdy_sheets_xlsx::XlsxReader;

#[cfg(feature = "xls")]
pub use sturdy_sheets_xls::XlsReader;
