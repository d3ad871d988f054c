//! Sheet selection

use std::fmt;

use crate::error::{Error, Result};

/// Identifies which sheet of a workbook to read.
///
/// Every decoding engine resolves the selector the same way via
/// [`SheetSelector::resolve`], so "sheet 2" means the same thing no matter
/// which engine ends up succeeding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SheetSelector {
    /// The first sheet in workbook order
    #[default]
    First,
    /// A sheet identified by its exact name
    Name(String),
    /// A sheet identified by its zero-based position
    Index(usize),
}

impl SheetSelector {
    /// Resolve the selector against a workbook's sheet names, in workbook order.
    ///
    /// Returns the zero-based sheet index. Name matching is exact; there is
    /// no trimming or case folding (engines pass names through verbatim).
    pub fn resolve(&self, names: &[String]) -> Result<usize> {
        match self {
            SheetSelector::First => {
                if names.is_empty() {
                    Err(Error::SheetOutOfBounds(0, 0))
                } else {
                    Ok(0)
                }
            }
            SheetSelector::Name(name) => names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| Error::SheetNotFound(name.clone())),
            SheetSelector::Index(idx) => {
                if *idx < names.len() {
                    Ok(*idx)
                } else {
                    Err(Error::SheetOutOfBounds(*idx, names.len()))
                }
            }
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::First => write!(f, "first sheet"),
            SheetSelector::Name(name) => write!(f, "sheet {name:?}"),
            SheetSelector::Index(idx) => write!(f, "sheet #{idx}"),
        }
    }
}

impl From<&str> for SheetSelector {
    fn from(name: &str) -> Self {
        SheetSelector::Name(name.to_string())
    }
}

impl From<String> for SheetSelector {
    fn from(name: String) -> Self {
        SheetSelector::Name(name)
    }
}

impl From<usize> for SheetSelector {
    fn from(idx: usize) -> Self {
        SheetSelector::Index(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_first() {
        let sheets = names(&["Data", "Notes"]);
        assert_eq!(SheetSelector::First.resolve(&sheets).unwrap(), 0);
    }

    #[test]
    fn test_resolve_first_empty_workbook() {
        assert!(matches!(
            SheetSelector::First.resolve(&[]),
            Err(Error::SheetOutOfBounds(0, 0))
        ));
    }

    #[test]
    fn test_resolve_by_name() {
        let sheets = names(&["Data", "Notes"]);
        assert_eq!(
            SheetSelector::from("Notes").resolve(&sheets).unwrap(),
            1
        );
        assert!(matches!(
            SheetSelector::from("Missing").resolve(&sheets),
            Err(Error::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_by_name_is_exact() {
        let sheets = names(&["Data"]);
        assert!(SheetSelector::from("data").resolve(&sheets).is_err());
        assert!(SheetSelector::from(" Data").resolve(&sheets).is_err());
    }

    #[test]
    fn test_resolve_by_index() {
        let sheets = names(&["Data", "Notes"]);
        assert_eq!(SheetSelector::from(1usize).resolve(&sheets).unwrap(), 1);
        assert!(matches!(
            SheetSelector::from(2usize).resolve(&sheets),
            Err(Error::SheetOutOfBounds(2, 2))
        ));
    }
}
