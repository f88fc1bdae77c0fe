//! Structural shift engine
//!
//! Pure functions that transform addresses and ranges when rows or columns are
//! inserted or deleted. Every store calls [`shift`] once per range per edit, so
//! the functions here never look at anything but their arguments.
//!
//! Rows and columns behave identically; the rules are written once over a
//! single axis and applied to the row or column coordinates of a range.

use crate::cell::{Address, RangeAddress};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A structural edit on one sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Edit {
    /// Insert `count` rows before row `at`
    InsertRows { at: i32, count: i32 },
    /// Delete rows `at..at+count`
    DeleteRows { at: i32, count: i32 },
    /// Insert `count` columns before column `at`
    InsertColumns { at: i32, count: i32 },
    /// Delete columns `at..at+count`
    DeleteColumns { at: i32, count: i32 },
}

/// Which coordinate an edit moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rows,
    Columns,
}

impl Axis {
    /// Grid size along this axis
    pub fn max(self) -> i32 {
        match self {
            Axis::Rows => MAX_ROWS,
            Axis::Columns => MAX_COLS,
        }
    }

    fn out_of_range(self, value: i64) -> Error {
        match self {
            Axis::Rows => Error::RowOutOfRange(value, MAX_ROWS),
            Axis::Columns => Error::ColumnOutOfRange(value, MAX_COLS),
        }
    }
}

impl Edit {
    /// Axis the edit moves
    pub fn axis(&self) -> Axis {
        match self {
            Edit::InsertRows { .. } | Edit::DeleteRows { .. } => Axis::Rows,
            Edit::InsertColumns { .. } | Edit::DeleteColumns { .. } => Axis::Columns,
        }
    }

    /// First row/column affected
    pub fn at(&self) -> i32 {
        match *self {
            Edit::InsertRows { at, .. }
            | Edit::DeleteRows { at, .. }
            | Edit::InsertColumns { at, .. }
            | Edit::DeleteColumns { at, .. } => at,
        }
    }

    /// Number of rows/columns inserted or deleted
    pub fn count(&self) -> i32 {
        match *self {
            Edit::InsertRows { count, .. }
            | Edit::DeleteRows { count, .. }
            | Edit::InsertColumns { count, .. }
            | Edit::DeleteColumns { count, .. } => count,
        }
    }

    /// Whether the edit inserts
    pub fn is_insert(&self) -> bool {
        matches!(self, Edit::InsertRows { .. } | Edit::InsertColumns { .. })
    }

    /// The edit that undoes this one
    pub fn inverse(&self) -> Edit {
        match *self {
            Edit::InsertRows { at, count } => Edit::DeleteRows { at, count },
            Edit::DeleteRows { at, count } => Edit::InsertRows { at, count },
            Edit::InsertColumns { at, count } => Edit::DeleteColumns { at, count },
            Edit::DeleteColumns { at, count } => Edit::InsertColumns { at, count },
        }
    }

    /// Check the edit's arguments against the grid bounds
    pub fn validate(&self) -> Result<()> {
        let axis = self.axis();
        let (at, count) = (self.at(), self.count());
        if at < 1 || at > axis.max() {
            return Err(axis.out_of_range(at as i64));
        }
        if count < 0 || count > axis.max() {
            return Err(Error::InvalidRange(format!("invalid count {}", count)));
        }
        if !self.is_insert() {
            let end = at as i64 + count as i64 - 1;
            if end > axis.max() as i64 {
                return Err(axis.out_of_range(end));
            }
        }
        Ok(())
    }

    /// New position of a single row/column index on the edit's axis, `None` when deleted
    /// or pushed past the grid
    pub fn shift_index(&self, index: i32) -> Option<i32> {
        let (at, count) = (self.at(), self.count());
        if self.is_insert() {
            if index < at {
                Some(index)
            } else {
                let moved = index + count;
                (moved <= self.axis().max()).then_some(moved)
            }
        } else if index < at {
            Some(index)
        } else if index < at + count {
            None
        } else {
            Some(index - count)
        }
    }
}

/// What an edit did to a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Range is untouched
    Unchanged,
    /// Range moved or grew; all of its cells survive
    Moved(RangeAddress),
    /// Range lost cells (deleted rows/columns, or clipped at the grid edge)
    Truncated(RangeAddress),
    /// Nothing of the range survives
    Invalidated,
}

impl RangeOutcome {
    /// The range after the edit, or `None` when invalidated
    pub fn resolve(self, original: &RangeAddress) -> Option<RangeAddress> {
        match self {
            RangeOutcome::Unchanged => Some(original.clone()),
            RangeOutcome::Moved(r) | RangeOutcome::Truncated(r) => Some(r),
            RangeOutcome::Invalidated => None,
        }
    }

    /// Whether the range is gone
    pub fn is_invalidated(&self) -> bool {
        matches!(self, RangeOutcome::Invalidated)
    }

    /// Whether the range lost cells
    pub fn is_truncated(&self) -> bool {
        matches!(self, RangeOutcome::Truncated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Unchanged,
    Moved(i32, i32),
    Truncated(i32, i32),
    Invalidated,
}

fn shift_span(first: i32, last: i32, edit: &Edit) -> Span {
    let (at, count, max) = (edit.at(), edit.count(), edit.axis().max());
    if count == 0 || last < at || (first == 1 && last == max) {
        return Span::Unchanged;
    }

    if edit.is_insert() {
        let (new_first, new_last) = if first >= at {
            (first + count, last + count)
        } else {
            (first, last + count)
        };
        if new_first > max {
            Span::Invalidated
        } else if new_last > max {
            Span::Truncated(new_first, max)
        } else {
            Span::Moved(new_first, new_last)
        }
    } else {
        let end = at + count - 1;
        if first > end {
            return Span::Moved(first - count, last - count);
        }
        if first >= at && last <= end {
            return Span::Invalidated;
        }
        let new_first = first.min(at);
        let new_last = if last > end { last - count } else { at - 1 };
        if new_first > new_last {
            Span::Invalidated
        } else {
            Span::Truncated(new_first, new_last)
        }
    }
}

/// Transform a range for an edit on its sheet
///
/// # Examples
/// ```
/// use gridspan_core::{shift, Edit, RangeAddress, RangeOutcome};
///
/// let range = RangeAddress::parse("A3:C3").unwrap();
/// let edit = Edit::InsertColumns { at: 3, count: 2 };
/// assert_eq!(
///     shift(&range, &edit),
///     RangeOutcome::Moved(RangeAddress::parse("A3:E3").unwrap())
/// );
/// ```
pub fn shift(range: &RangeAddress, edit: &Edit) -> RangeOutcome {
    if !range.is_valid() {
        return RangeOutcome::Unchanged;
    }

    let (first, last) = match edit.axis() {
        Axis::Rows => (range.first.row, range.last.row),
        Axis::Columns => (range.first.column, range.last.column),
    };

    let rebuild = |f: i32, l: i32| match edit.axis() {
        Axis::Rows => range.with_coords(f, range.first.column, l, range.last.column),
        Axis::Columns => range.with_coords(range.first.row, f, range.last.row, l),
    };

    match shift_span(first, last, edit) {
        Span::Unchanged => RangeOutcome::Unchanged,
        Span::Moved(f, l) => RangeOutcome::Moved(rebuild(f, l)),
        Span::Truncated(f, l) => RangeOutcome::Truncated(rebuild(f, l)),
        Span::Invalidated => RangeOutcome::Invalidated,
    }
}

/// Transform a single address; `None` when its row/column was deleted or pushed off the grid
pub fn shift_address(addr: &Address, edit: &Edit) -> Option<Address> {
    if !addr.is_valid() {
        return Some(addr.clone());
    }
    let mut out = addr.clone();
    match edit.axis() {
        Axis::Rows => out.row = edit.shift_index(addr.row)?,
        Axis::Columns => out.column = edit.shift_index(addr.column)?,
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    fn moved(text: &str) -> RangeOutcome {
        RangeOutcome::Moved(r(text))
    }

    fn truncated(text: &str) -> RangeOutcome {
        RangeOutcome::Truncated(r(text))
    }

    #[test]
    fn test_insert_zero_is_unchanged() {
        for text in ["A1", "B2:D4", "3:5", "C:C"] {
            assert_eq!(
                shift(&r(text), &Edit::InsertRows { at: 1, count: 0 }),
                RangeOutcome::Unchanged
            );
            assert_eq!(
                shift(&r(text), &Edit::DeleteColumns { at: 1, count: 0 }),
                RangeOutcome::Unchanged
            );
        }
    }

    #[test]
    fn test_insert_rows() {
        let edit = Edit::InsertRows { at: 5, count: 3 };
        assert_eq!(shift(&r("A1:B4"), &edit), RangeOutcome::Unchanged);
        assert_eq!(shift(&r("A5:B6"), &edit), moved("A8:B9"));
        assert_eq!(shift(&r("A2:B6"), &edit), moved("A2:B9"));
    }

    #[test]
    fn test_insert_columns_scenario() {
        // two columns inserted after column B
        let edit = Edit::InsertColumns { at: 3, count: 2 };
        assert_eq!(shift(&r("E7:F7"), &edit), moved("G7:H7"));
        assert_eq!(shift(&r("A1"), &edit), RangeOutcome::Unchanged);
        assert_eq!(shift(&r("A3:C3"), &edit), moved("A3:E3"));
    }

    #[test]
    fn test_insert_clamps_at_grid_edge() {
        let edit = Edit::InsertRows { at: 10, count: 5 };
        let near_end = RangeAddress::from_coords(MAX_ROWS - 10, 1, MAX_ROWS - 1, 1);
        assert_eq!(
            shift(&near_end, &edit),
            RangeOutcome::Truncated(RangeAddress::from_coords(MAX_ROWS - 5, 1, MAX_ROWS, 1))
        );

        let last_row = RangeAddress::from_coords(MAX_ROWS - 1, 1, MAX_ROWS - 1, 1);
        assert_eq!(shift(&last_row, &edit), RangeOutcome::Invalidated);
    }

    #[test]
    fn test_delete_rows() {
        let edit = Edit::DeleteRows { at: 5, count: 3 };
        assert_eq!(shift(&r("A1:B4"), &edit), RangeOutcome::Unchanged);
        assert_eq!(shift(&r("A8:B9"), &edit), moved("A5:B6"));
        assert_eq!(shift(&r("A5:B7"), &edit), RangeOutcome::Invalidated);
        assert_eq!(shift(&r("A6"), &edit), RangeOutcome::Invalidated);
        assert_eq!(shift(&r("A3:B6"), &edit), truncated("A3:B4"));
        assert_eq!(shift(&r("A6:B10"), &edit), truncated("A5:B7"));
        assert_eq!(shift(&r("A2:B12"), &edit), truncated("A2:B9"));
    }

    #[test]
    fn test_whole_axis_ranges() {
        let rows = r("3:3");
        assert_eq!(
            shift(&rows, &Edit::InsertColumns { at: 2, count: 4 }),
            RangeOutcome::Unchanged
        );
        assert_eq!(
            shift(&rows, &Edit::DeleteColumns { at: 1, count: 4 }),
            RangeOutcome::Unchanged
        );
        assert_eq!(
            shift(&rows, &Edit::InsertRows { at: 1, count: 2 }),
            moved("5:5")
        );

        let cols = r("B:C");
        assert_eq!(
            shift(&cols, &Edit::DeleteRows { at: 1, count: 10 }),
            RangeOutcome::Unchanged
        );
        assert_eq!(
            shift(&cols, &Edit::DeleteColumns { at: 2, count: 1 }),
            truncated("B:B")
        );
    }

    #[test]
    fn test_flags_and_sheet_preserved() {
        let range = r("Data!$B$2:$C$3");
        match shift(&range, &Edit::InsertRows { at: 1, count: 1 }) {
            RangeOutcome::Moved(out) => {
                assert_eq!(out.to_a1_string(), "$B$3:$C$4");
                assert_eq!(out.sheet(), range.sheet());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_insert_then_delete_restores() {
        let edit = Edit::InsertRows { at: 4, count: 2 };
        for text in ["A1:B2", "A4:B9", "A2:B6", "C10"] {
            let range = r(text);
            let shifted = shift(&range, &edit).resolve(&range).unwrap();
            let back = shift(&shifted, &edit.inverse()).resolve(&shifted).unwrap();
            assert_eq!(back, range);
        }
    }

    #[test]
    fn test_shift_address() {
        let addr = Address::parse("C5").unwrap();
        let out = shift_address(&addr, &Edit::InsertRows { at: 5, count: 1 }).unwrap();
        assert_eq!(out.to_a1_string(), "C6");
        assert!(shift_address(&addr, &Edit::DeleteColumns { at: 3, count: 1 }).is_none());
        let out = shift_address(&addr, &Edit::DeleteColumns { at: 1, count: 2 }).unwrap();
        assert_eq!(out.to_a1_string(), "A5");
    }

    #[test]
    fn test_validate() {
        assert!(Edit::InsertRows { at: 1, count: 3 }.validate().is_ok());
        assert!(matches!(
            Edit::InsertRows { at: 0, count: 1 }.validate(),
            Err(Error::RowOutOfRange(0, _))
        ));
        assert!(matches!(
            Edit::DeleteColumns {
                at: MAX_COLS,
                count: 2
            }
            .validate(),
            Err(Error::ColumnOutOfRange(..))
        ));
        assert!(Edit::DeleteRows { at: 2, count: -1 }.validate().is_err());
    }
}
