//! Prelude module - common imports for sturdy-sheets users
//!
//! ```rust
//! use sturdy_sheets::prelude::*;
//! ```

pub use crate::{
    read_table,
    // Cell types
    CellError,
    CellValue,
    ColumnKind,
    // Main types
    Dataset,
    EngineKind,
    SheetSelector,
    TableReader,
    // Error types
    UnreadableFileError,
};
