use std::fmt::{Display, Formatter};

/// Opaque handle for one rendered row, assigned by the [`TreeWidget`].
///
/// Only equality and hashing are meaningful. Ids are neither contiguous nor
/// stable across reloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for RowId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tree-drawing widget the viewer populates.
pub trait TreeWidget: Send + Sync {
    /// Removes every row. Called before a new document is rendered.
    fn clear_rows(&self);

    /// Appends a row below `parent` (or at top level for `None`) and returns
    /// the id the widget assigned to it. Rows are always inserted after
    /// their parent row.
    fn insert_row(&self, parent: Option<RowId>, label: &str) -> RowId;
}
