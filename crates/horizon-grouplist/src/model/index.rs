//! Cell addressing for flat item models.
//!
//! Grouping only ever deals with tabular data, so a position is just a
//! row and a column. `CellIndex` is carried by `data_changed` notifications.

use std::fmt;

/// Position of a cell within a flat (non-hierarchical) `ItemModel`.
///
/// Indices should be used immediately and not stored long-term: after
/// rows are inserted or removed, a previously obtained index may point at
/// a different row.
///
/// # Example
///
/// ```
/// use horizon_grouplist::model::CellIndex;
///
/// let top_left = CellIndex::new(0, 0);
/// let bottom_right = CellIndex::new(4, 2);
/// assert!(top_left.row() <= bottom_right.row());
/// assert!(bottom_right.spans_column(1, &top_left));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct CellIndex {
    row: usize,
    column: usize,
}

impl CellIndex {
    /// Creates an index for the given row and column.
    #[inline]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Returns the row.
    #[inline]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Returns the column.
    #[inline]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Creates an index in the same column at a different row.
    #[inline]
    pub const fn with_row(&self, row: usize) -> Self {
        Self::new(row, self.column)
    }

    /// Returns `true` if `column` lies between `other`'s column and this
    /// index's column, inclusive, in either order.
    pub fn spans_column(&self, column: usize, other: &CellIndex) -> bool {
        let (lo, hi) = if self.column <= other.column {
            (self.column, other.column)
        } else {
            (other.column, self.column)
        };
        (lo..=hi).contains(&column)
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_accessors() {
        let index = CellIndex::new(3, 1);
        assert_eq!(index.row(), 3);
        assert_eq!(index.column(), 1);
        assert_eq!(index.with_row(7), CellIndex::new(7, 1));
        assert_eq!(index.to_string(), "(3, 1)");
    }

    #[test]
    fn test_spans_column_either_order() {
        let a = CellIndex::new(0, 4);
        let b = CellIndex::new(2, 1);
        assert!(a.spans_column(1, &b));
        assert!(b.spans_column(4, &a));
        assert!(a.spans_column(2, &b));
        assert!(!a.spans_column(0, &b));
        assert!(!a.spans_column(5, &b));
    }
}
