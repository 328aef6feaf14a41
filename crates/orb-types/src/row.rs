use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a row within its table.
///
/// Row indices are stable for the lifetime of a table: rows are appended and
/// never moved.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowIndex(pub usize);

impl RowIndex {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowIndex({})", self.0)
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for RowIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug() {
        let row = RowIndex::new(3);
        assert_eq!(row.to_string(), "#3");
        assert_eq!(format!("{row:?}"), "RowIndex(3)");
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&RowIndex(7)).unwrap();
        assert_eq!(json, "7");
    }
}
