//! The ordered decoding strategy list
//!
//! Each call computes an immutable plan for the path, then the reader walks
//! it stopping at the first success. Availability is a compile-time
//! capability check (cargo features), not a caught initialization failure.

use std::path::Path;

use sturdy_sheets_core::{Dataset, SheetSelector};

use crate::error::EngineError;

/// The decoding engines, in fallback priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// The built-in XLSX reader (always compiled)
    Native,
    /// The calamine crate, which handles both modern and legacy formats
    Calamine,
    /// The built-in BIFF8 reader, eligible only for `.xls` paths
    LegacyXls,
}

impl EngineKind {
    /// Short engine name for logs and attempt records
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Native => "native-xlsx",
            EngineKind::Calamine => "calamine",
            EngineKind::LegacyXls => "legacy-xls",
        }
    }

    /// Whether the engine's backing crate was compiled in
    pub fn is_available(&self) -> bool {
        match self {
            EngineKind::Native => true,
            EngineKind::Calamine => cfg!(feature = "calamine"),
            EngineKind::LegacyXls => cfg!(feature = "xls"),
        }
    }

    pub(crate) fn read(&self, path: &Path, selector: &SheetSelector) -> Result<Dataset, EngineError> {
        match self {
            EngineKind::Native => {
                Ok(sturdy_sheets_xlsx::XlsxReader::read_file(path, selector)?)
            }
            EngineKind::Calamine => {
                #[cfg(feature = "calamine")]
                {
                    crate::calamine_engine::read_file(path, selector)
                }
                #[cfg(not(feature = "calamine"))]
                {
                    let _ = (path, selector);
                    Err(EngineError::Unavailable(self.name()))
                }
            }
            EngineKind::LegacyXls => {
                #[cfg(feature = "xls")]
                {
                    Ok(sturdy_sheets_xls::XlsReader::read_file(path, selector)?)
                }
                #[cfg(not(feature = "xls"))]
                {
                    let _ = (path, selector);
                    Err(EngineError::Unavailable(self.name()))
                }
            }
        }
    }
}

/// Compute the strategy plan for a path.
///
/// Native and calamine are always in the plan; the legacy engine joins it
/// if and only if the path's extension is `.xls`, case-insensitively.
/// Eligibility looks at the extension alone, never the file contents: a
/// BIFF file named `data.bin` will not reach the legacy engine.
pub fn plan_for(path: &Path) -> Vec<EngineKind> {
    let mut plan = vec![EngineKind::Native, EngineKind::Calamine];
    if has_legacy_extension(path) {
        plan.push(EngineKind::LegacyXls);
    }
    plan
}

fn has_legacy_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xls"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_modern_extension() {
        let plan = plan_for(Path::new("report.xlsx"));
        assert_eq!(plan, vec![EngineKind::Native, EngineKind::Calamine]);
    }

    #[test]
    fn test_plan_includes_legacy_for_xls() {
        let plan = plan_for(Path::new("old/report.xls"));
        assert_eq!(
            plan,
            vec![EngineKind::Native, EngineKind::Calamine, EngineKind::LegacyXls]
        );
    }

    #[test]
    fn test_legacy_gating_is_case_insensitive() {
        assert!(plan_for(Path::new("REPORT.XLS")).contains(&EngineKind::LegacyXls));
        assert!(plan_for(Path::new("report.Xls")).contains(&EngineKind::LegacyXls));
    }

    #[test]
    fn test_legacy_not_planned_for_other_extensions() {
        assert!(!plan_for(Path::new("report.xlsb")).contains(&EngineKind::LegacyXls));
        assert!(!plan_for(Path::new("data.bin")).contains(&EngineKind::LegacyXls));
        assert!(!plan_for(Path::new("no_extension")).contains(&EngineKind::LegacyXls));
        // The extension must be exactly "xls", not merely end with it
        assert!(!plan_for(Path::new("archive.tar.xls.bak")).contains(&EngineKind::LegacyXls));
    }

    #[test]
    fn test_native_is_always_available() {
        assert!(EngineKind::Native.is_available());
    }
}
