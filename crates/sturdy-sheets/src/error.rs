//! The terminal error surfaced when every decoding strategy fails

use thiserror::Error;

use crate::engine::EngineKind;

/// The message shown when no engine could read the file.
///
/// Deliberately generic: the fallback chain does not distinguish "backend
/// missing" from "file corrupt" in what it shows the user, only in what it
/// records on [`UnreadableFileError::attempts`].
const UNREADABLE_MESSAGE: &str = "\
Could not read the spreadsheet file. Enable one of the supported reader backends and retry:
  - sturdy-sheets = { features = [\"calamine\"] }    # best all-around, supports .xls/.xlsx
  - sturdy-sheets = { features = [\"xls\"] }         # for legacy .xls
Alternatively, open the file and save/export it as .xlsx, then re-run.";

/// A failure from one decoding strategy
#[derive(Debug, Error)]
pub enum EngineError {
    /// The built-in XLSX engine failed
    #[error("xlsx engine: {0}")]
    Native(#[from] sturdy_sheets_xlsx::XlsxError),

    /// The calamine engine failed
    #[cfg(feature = "calamine")]
    #[error("calamine engine: {0}")]
    Calamine(#[from] calamine::Error),

    /// The legacy XLS engine failed
    #[cfg(feature = "xls")]
    #[error("xls engine: {0}")]
    LegacyXls(#[from] sturdy_sheets_xls::XlsError),

    /// Sheet selection failed before the engine could run
    #[error("sheet selection: {0}")]
    Core(#[from] sturdy_sheets_core::Error),

    /// The engine's backing crate was not compiled in
    #[error("backend {0:?} not compiled in")]
    Unavailable(&'static str),
}

/// One entry in the record of failed strategies
#[derive(Debug)]
pub struct EngineAttempt {
    /// Which engine was attempted
    pub engine: EngineKind,
    /// Why it failed
    pub error: EngineError,
}

/// Every decoding strategy failed (or was skipped as ineligible).
///
/// This is the only error the fallback reader surfaces. Its `Display` is a
/// fixed remediation template; the per-engine failures that led here are
/// kept on the value for debugging, never shown in the message.
#[derive(Debug, Error)]
#[error("{}", UNREADABLE_MESSAGE)]
pub struct UnreadableFileError {
    attempts: Vec<EngineAttempt>,
}

impl UnreadableFileError {
    pub(crate) fn new(attempts: Vec<EngineAttempt>) -> Self {
        UnreadableFileError { attempts }
    }

    /// The failed strategy attempts, in the order they were tried
    pub fn attempts(&self) -> &[EngineAttempt] {
        &self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_both_remediation_hints() {
        let err = UnreadableFileError::new(Vec::new());
        let msg = err.to_string();
        assert!(msg.contains(
            "  - sturdy-sheets = { features = [\"calamine\"] }    # best all-around, supports .xls/.xlsx"
        ));
        assert!(msg.contains(
            "  - sturdy-sheets = { features = [\"xls\"] }         # for legacy .xls"
        ));
        assert!(msg.contains("save/export it as .xlsx, then re-run"));
    }

    #[test]
    fn test_message_never_leaks_engine_errors() {
        let attempts = vec![EngineAttempt {
            engine: EngineKind::Native,
            error: EngineError::Native(sturdy_sheets_xlsx::XlsxError::InvalidFormat(
                "secret detail".into(),
            )),
        }];
        let err = UnreadableFileError::new(attempts);
        assert!(!err.to_string().contains("secret detail"));
        // The detail is still there for debugging
        assert!(format!("{err:?}").contains("secret detail"));
        assert_eq!(err.attempts().len(), 1);
    }
}
