//! Cell storage implementation
//!
//! Sparse storage for spreadsheet cells. Only non-empty cells are stored, using a
//! row-based BTreeMap structure. Row and column metadata (heights, widths, hidden
//! flags) is kept beside the cells and moves with them on structural edits.

use std::collections::BTreeMap;

use super::{CellValue, RangeAddress, StringPool};
use crate::shift::{Axis, Edit};
use crate::style::{StyleId, StylePool};

/// Complete data for a single cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    /// The cell's value
    pub value: CellValue,
    /// Handle into the sheet's style pool
    pub style: StyleId,
}

impl CellData {
    /// Create a new cell with a value and default style
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style: StyleId::DEFAULT,
        }
    }

    /// Create a new cell with a value and style
    pub fn with_style(value: CellValue, style: StyleId) -> Self {
        Self { value, style }
    }

    /// Create an empty cell
    pub fn empty() -> Self {
        Self::new(CellValue::Empty)
    }

    /// Check if this cell is effectively empty (no value and default style)
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style.is_default()
    }
}

impl Default for CellData {
    fn default() -> Self {
        Self::empty()
    }
}

/// Sparse row-based storage for worksheet cells
///
/// Structure: `BTreeMap<row, BTreeMap<column, CellData>>`, 1-based like every
/// other coordinate in the crate.
#[derive(Debug, Clone)]
pub struct CellStorage {
    /// Row index → column map
    rows: BTreeMap<i32, BTreeMap<i32, CellData>>,

    /// Shared string pool for deduplication
    string_pool: StringPool,

    /// Shared style pool for deduplication
    style_pool: StylePool,

    /// Default row height in points
    default_row_height: f64,

    /// Default column width in characters
    default_column_width: f64,

    /// Custom row heights
    row_heights: BTreeMap<i32, f64>,

    /// Hidden rows
    hidden_rows: BTreeMap<i32, bool>,

    /// Custom column widths
    column_widths: BTreeMap<i32, f64>,

    /// Hidden columns
    hidden_columns: BTreeMap<i32, bool>,
}

impl CellStorage {
    /// Create a new empty cell storage
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            string_pool: StringPool::new(),
            style_pool: StylePool::new(),
            default_row_height: 15.0,
            default_column_width: 8.43,
            row_heights: BTreeMap::new(),
            hidden_rows: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            hidden_columns: BTreeMap::new(),
        }
    }

    /// Get a cell
    pub fn get(&self, row: i32, col: i32) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Get a mutable cell
    pub fn get_mut(&mut self, row: i32, col: i32) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Set a cell
    ///
    /// If the cell data is empty (no value, default style), the cell is removed.
    pub fn set(&mut self, row: i32, col: i32, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Set just the cell value (preserving style)
    pub fn set_value(&mut self, row: i32, col: i32, value: CellValue) {
        let value = match value {
            CellValue::String(s) => CellValue::String(self.string_pool.intern(s.as_str())),
            other => other,
        };
        let style = self.get(row, col).map(|c| c.style).unwrap_or_default();
        self.set(row, col, CellData::with_style(value, style));
    }

    /// Set just the cell style (preserving value)
    pub fn set_style(&mut self, row: i32, col: i32, style: StyleId) {
        let value = self
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default();
        self.set(row, col, CellData::with_style(value, style));
    }

    /// Remove a cell
    pub fn remove(&mut self, row: i32, col: i32) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let result = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        result
    }

    /// Remove every cell inside `range`
    pub fn clear_range(&mut self, range: &RangeAddress) {
        let (c1, c2) = (range.first.column, range.last.column);
        for row_map in self.rows.range_mut(range.first.row..=range.last.row) {
            let doomed: Vec<i32> = row_map.1.range(c1..=c2).map(|(&c, _)| c).collect();
            for col in doomed {
                row_map.1.remove(&col);
            }
        }
        self.rows.retain(|_, cols| !cols.is_empty());
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bounds of the stored cells, or `None` if empty
    pub fn used_range(&self) -> Option<RangeAddress> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;
        let mut min_col = i32::MAX;
        let mut max_col = 0;
        for row_data in self.rows.values() {
            if let Some(&col) = row_data.keys().next() {
                min_col = min_col.min(col);
            }
            if let Some(&col) = row_data.keys().next_back() {
                max_col = max_col.max(col);
            }
        }
        Some(RangeAddress::from_coords(min_row, min_col, max_row, max_col))
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    /// Iterate over the stored cells inside `range` in row order
    pub fn iter_range<'a>(
        &'a self,
        range: &RangeAddress,
    ) -> impl Iterator<Item = (i32, i32, &'a CellData)> + 'a {
        let (c1, c2) = (range.first.column, range.last.column);
        self.rows
            .range(range.first.row..=range.last.row)
            .flat_map(move |(&row, cols)| {
                cols.range(c1..=c2).map(move |(&col, data)| (row, col, data))
            })
    }

    /// Remove and return the cells of `row` in columns `first..=last`
    pub(crate) fn take_row_segment(&mut self, row: i32, first: i32, last: i32) -> BTreeMap<i32, CellData> {
        let Some(cols) = self.rows.get_mut(&row) else {
            return BTreeMap::new();
        };
        let mut segment = cols.split_off(&first);
        let mut tail = segment.split_off(&(last + 1));
        cols.append(&mut tail);
        if cols.is_empty() {
            self.rows.remove(&row);
        }
        segment
    }

    /// Put cells taken by [`take_row_segment`](Self::take_row_segment) back at `row`
    pub(crate) fn put_row_segment(&mut self, row: i32, mut segment: BTreeMap<i32, CellData>) {
        if !segment.is_empty() {
            self.rows.entry(row).or_default().append(&mut segment);
        }
    }

    /// Move cells and row/column metadata for a structural edit
    ///
    /// Cells in deleted rows/columns are dropped.
    pub fn apply_edit(&mut self, edit: &Edit) {
        match edit.axis() {
            Axis::Rows => {
                shift_keys(&mut self.rows, edit);
                shift_keys(&mut self.row_heights, edit);
                shift_keys(&mut self.hidden_rows, edit);
            }
            Axis::Columns => {
                for cols in self.rows.values_mut() {
                    shift_keys(cols, edit);
                }
                self.rows.retain(|_, cols| !cols.is_empty());
                shift_keys(&mut self.column_widths, edit);
                shift_keys(&mut self.hidden_columns, edit);
            }
        }
    }

    /// Get default row height
    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    /// Get row height
    pub fn row_height(&self, row: i32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    /// Set row height
    pub fn set_row_height(&mut self, row: i32, height: f64) {
        if (height - self.default_row_height).abs() < f64::EPSILON {
            self.row_heights.remove(&row);
        } else {
            self.row_heights.insert(row, height);
        }
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: i32) -> bool {
        self.hidden_rows.get(&row).copied().unwrap_or(false)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: i32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row, true);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    /// Get default column width
    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    /// Get column width
    pub fn column_width(&self, col: i32) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    /// Set column width
    pub fn set_column_width(&mut self, col: i32, width: f64) {
        if (width - self.default_column_width).abs() < f64::EPSILON {
            self.column_widths.remove(&col);
        } else {
            self.column_widths.insert(col, width);
        }
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: i32) -> bool {
        self.hidden_columns.get(&col).copied().unwrap_or(false)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: i32, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col, true);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    /// Get the style pool
    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    /// Get the style pool mutably
    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-key a map for an edit on its axis, dropping deleted keys
fn shift_keys<T>(map: &mut BTreeMap<i32, T>, edit: &Edit) {
    if edit.count() == 0 || map.range(edit.at()..).next().is_none() {
        return;
    }
    let tail = map.split_off(&edit.at());
    for (key, value) in tail {
        if let Some(new_key) = edit.shift_index(key) {
            map.insert(new_key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    #[test]
    fn test_basic_operations() {
        let mut storage = CellStorage::new();
        storage.set(1, 1, CellData::new(CellValue::Number(42.0)));
        let cell = storage.get(1, 1).unwrap();
        assert_eq!(cell.value.as_number(), Some(42.0));
        assert!(storage.get(2, 2).is_none());
    }

    #[test]
    fn test_empty_cells_not_stored() {
        let mut storage = CellStorage::new();
        storage.set(1, 1, CellData::new(CellValue::Number(42.0)));
        assert_eq!(storage.cell_count(), 1);

        storage.set(1, 1, CellData::empty());
        assert_eq!(storage.cell_count(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_used_range() {
        let mut storage = CellStorage::new();
        assert!(storage.used_range().is_none());

        storage.set_value(5, 3, CellValue::Number(1.0));
        storage.set_value(10, 7, CellValue::Number(2.0));
        storage.set_value(2, 1, CellValue::Number(3.0));
        assert_eq!(storage.used_range(), Some(r("A2:G10")));
    }

    #[test]
    fn test_row_column_properties() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.row_height(1), 15.0);
        assert_eq!(storage.column_width(1), 8.43);

        storage.set_row_height(5, 30.0);
        storage.set_column_width(3, 20.0);
        storage.set_row_hidden(10, true);
        storage.set_column_hidden(5, true);

        assert_eq!(storage.row_height(5), 30.0);
        assert_eq!(storage.column_width(3), 20.0);
        assert!(storage.is_row_hidden(10));
        assert!(storage.is_column_hidden(5));
    }

    #[test]
    fn test_apply_row_edits() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 1, CellValue::from("top"));
        storage.set_value(3, 1, CellValue::from("gone"));
        storage.set_value(5, 2, CellValue::from("moves"));
        storage.set_row_hidden(5, true);
        storage.set_row_height(6, 40.0);

        storage.apply_edit(&Edit::DeleteRows { at: 2, count: 2 });
        assert_eq!(storage.get(1, 1).unwrap().value.as_string(), Some("top"));
        assert_eq!(storage.get(3, 2).unwrap().value.as_string(), Some("moves"));
        assert!(storage.is_row_hidden(3));
        assert_eq!(storage.row_height(4), 40.0);
        assert_eq!(storage.cell_count(), 2);

        storage.apply_edit(&Edit::InsertRows { at: 1, count: 1 });
        assert_eq!(storage.get(2, 1).unwrap().value.as_string(), Some("top"));
        assert!(storage.is_row_hidden(4));
    }

    #[test]
    fn test_apply_column_edits() {
        let mut storage = CellStorage::new();
        storage.set_value(1, 1, CellValue::from(1));
        storage.set_value(1, 3, CellValue::from(3));
        storage.set_column_width(3, 12.0);

        storage.apply_edit(&Edit::InsertColumns { at: 2, count: 2 });
        assert!(storage.get(1, 3).is_none());
        assert_eq!(storage.get(1, 5).unwrap().value.as_number(), Some(3.0));
        assert_eq!(storage.column_width(5), 12.0);

        storage.apply_edit(&Edit::DeleteColumns { at: 1, count: 1 });
        assert_eq!(storage.cell_count(), 1);
        assert!(storage.get(1, 4).is_some());
    }

    #[test]
    fn test_clear_and_iter_range() {
        let mut storage = CellStorage::new();
        for row in 1..=4 {
            for col in 1..=4 {
                storage.set_value(row, col, CellValue::from(row * 10 + col));
            }
        }
        assert_eq!(storage.iter_range(&r("B2:C3")).count(), 4);
        storage.clear_range(&r("B2:C3"));
        assert_eq!(storage.cell_count(), 12);
        assert!(storage.get(2, 2).is_none());
    }

    #[test]
    fn test_row_segments() {
        let mut storage = CellStorage::new();
        for col in 1..=5 {
            storage.set_value(1, col, CellValue::from(col));
        }
        let segment = storage.take_row_segment(1, 2, 3);
        assert_eq!(segment.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(storage.cell_count(), 3);

        storage.put_row_segment(4, segment);
        assert_eq!(storage.get(4, 3).unwrap().value.as_number(), Some(3.0));
        assert!(storage.take_row_segment(9, 1, 5).is_empty());
    }
}
