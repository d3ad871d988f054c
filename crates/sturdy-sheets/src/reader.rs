//! The fallback reader
//!
//! Walks the strategy plan for the path, stopping at the first engine that
//! produces a dataset. Every per-engine failure is recovered locally,
//! recorded, and logged at debug level; the caller only ever sees success
//! or [`UnreadableFileError`].

use std::path::Path;

use sturdy_sheets_core::{Dataset, SheetSelector};

use crate::engine;
use crate::error::{EngineAttempt, EngineError, UnreadableFileError};

/// Reads a spreadsheet file by trying each eligible engine in order
pub struct TableReader;

impl TableReader {
    /// Read the selected sheet of a spreadsheet file into a dataset.
    ///
    /// Strategies are attempted in a fixed order: the built-in XLSX engine,
    /// then calamine, then (for `.xls` paths only) the built-in BIFF8
    /// engine. The first success wins. Each call is independent and
    /// read-only; nothing is cached across attempts.
    ///
    /// # Errors
    ///
    /// [`UnreadableFileError`] when every strategy failed or was skipped.
    /// Intermediate failures (missing file, corrupt content, absent
    /// backend, bad sheet selector) are not distinguished in the error
    /// message; they are retained on
    /// [`attempts`](UnreadableFileError::attempts).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sturdy_sheets::{SheetSelector, TableReader};
    ///
    /// let ds = TableReader::read_file("report.xlsx", SheetSelector::First)?;
    /// println!("{} rows", ds.row_count());
    /// # Ok::<(), sturdy_sheets::UnreadableFileError>(())
    /// ```
    pub fn read_file<P, S>(path: P, selector: S) -> Result<Dataset, UnreadableFileError>
    where
        P: AsRef<Path>,
        S: Into<SheetSelector>,
    {
        let path = path.as_ref();
        let selector = selector.into();
        let mut attempts = Vec::new();

        for engine in engine::plan_for(path) {
            if !engine.is_available() {
                log::debug!(
                    "skipping {} for {}: backend not compiled in",
                    engine.name(),
                    path.display()
                );
                attempts.push(EngineAttempt {
                    engine,
                    error: EngineError::Unavailable(engine.name()),
                });
                continue;
            }

            match engine.read(path, &selector) {
                Ok(dataset) => {
                    log::debug!(
                        "{} read {} ({dataset})",
                        engine.name(),
                        path.display()
                    );
                    return Ok(dataset);
                }
                Err(error) => {
                    log::debug!("{} failed on {}: {error}", engine.name(), path.display());
                    attempts.push(EngineAttempt { engine, error });
                }
            }
        }

        Err(UnreadableFileError::new(attempts))
    }
}

/// Free-function convenience for [`TableReader::read_file`]
pub fn read_table<P, S>(path: P, selector: S) -> Result<Dataset, UnreadableFileError>
where
    P: AsRef<Path>,
    S: Into<SheetSelector>,
{
    TableReader::read_file(path, selector)
}
