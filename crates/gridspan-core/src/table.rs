//! Tables (list objects)
//!
//! A table owns a rectangular range made of an optional header row, the data
//! rows and an optional totals row. Tables never overlap each other or the
//! worksheet's autofilter.

use log::warn;

use crate::cell::RangeAddress;
use crate::error::{Error, Result};
use crate::named_range::validate_name;
use crate::shift::{shift, Edit, RangeOutcome};

/// A table on a worksheet
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    range: RangeAddress,
    has_header: bool,
    has_totals: bool,
    /// Optional named table style
    pub style_name: Option<String>,
}

impl Table {
    fn new(name: &str, range: RangeAddress, has_header: bool) -> Self {
        Self {
            name: name.to_string(),
            range,
            has_header,
            has_totals: false,
            style_name: None,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whole table range
    pub fn range(&self) -> &RangeAddress {
        &self.range
    }

    /// Whether the first row is a header
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Whether the last row is a totals row
    pub fn has_totals(&self) -> bool {
        self.has_totals
    }

    /// Number of columns
    pub fn column_count(&self) -> i32 {
        self.range.column_count()
    }

    /// Header row range
    pub fn header_range(&self) -> Option<RangeAddress> {
        self.has_header.then(|| {
            self.range.with_coords(
                self.range.first.row,
                self.range.first.column,
                self.range.first.row,
                self.range.last.column,
            )
        })
    }

    /// Totals row range
    pub fn totals_range(&self) -> Option<RangeAddress> {
        self.has_totals.then(|| {
            self.range.with_coords(
                self.range.last.row,
                self.range.first.column,
                self.range.last.row,
                self.range.last.column,
            )
        })
    }

    /// Rows between header and totals, or `None` when there are none
    pub fn data_range(&self) -> Option<RangeAddress> {
        let first = self.range.first.row + i32::from(self.has_header);
        let last = self.range.last.row - i32::from(self.has_totals);
        (first <= last).then(|| {
            self.range
                .with_coords(first, self.range.first.column, last, self.range.last.column)
        })
    }

    /// Data cells of the `n`th column (1-based within the table)
    pub fn column_range(&self, n: i32) -> Option<RangeAddress> {
        if n < 1 || n > self.column_count() {
            return None;
        }
        let data = self.data_range()?;
        let column = self.range.first.column + n - 1;
        Some(data.with_coords(data.first.row, column, data.last.row, column))
    }

    /// Minimum number of rows for this layout
    fn min_rows(&self) -> i32 {
        1 + i32::from(self.has_header) + i32::from(self.has_totals)
    }
}

/// What a structural edit did to the tables of a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableShift {
    /// Tables whose size changed
    pub resized: Vec<String>,
    /// Tables discarded because their range was invalidated
    pub removed: Vec<String>,
}

/// The tables of one worksheet
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    tables: Vec<Table>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table
    ///
    /// Fails with [`Error::ConflictingStructure`] on a duplicate name (case
    /// insensitive) or when the range overlaps another table.
    pub fn add(&mut self, name: &str, range: RangeAddress, has_header: bool) -> Result<&mut Table> {
        validate_name(name)?;
        let table = Table::new(name, range, has_header);
        if !table.range.is_valid() || table.range.row_count() < table.min_rows() {
            return Err(Error::InvalidRange(format!(
                "{} is too small for a table",
                table.range
            )));
        }
        if self.get(name).is_some() {
            return Err(Error::conflict(format!("table '{}' already exists", name)));
        }
        if let Some(other) = self.intersecting(&table.range) {
            return Err(Error::conflict(format!(
                "{} overlaps table '{}'",
                table.range.to_a1_string(),
                other.name
            )));
        }
        self.tables.push(table);
        let idx = self.tables.len() - 1;
        Ok(&mut self.tables[idx])
    }

    /// Add or remove the totals row
    ///
    /// Turning it on claims the row below the table; turning it off gives the
    /// row back.
    pub fn set_totals_row(&mut self, name: &str, show: bool) -> Result<()> {
        let idx = self.index_of(name)?;
        let table = &self.tables[idx];
        if table.has_totals == show {
            return Ok(());
        }
        let range = &table.range;
        let new_range = if show {
            if range.last.row >= crate::MAX_ROWS {
                return Err(Error::RowOutOfRange(
                    i64::from(range.last.row) + 1,
                    crate::MAX_ROWS,
                ));
            }
            range.with_coords(range.first.row, range.first.column, range.last.row + 1, range.last.column)
        } else {
            range.with_coords(range.first.row, range.first.column, range.last.row - 1, range.last.column)
        };
        if show {
            let extra = new_range.with_coords(
                new_range.last.row,
                new_range.first.column,
                new_range.last.row,
                new_range.last.column,
            );
            if let Some(other) = self.intersecting(&extra) {
                return Err(Error::conflict(format!(
                    "totals row of '{}' would overlap table '{}'",
                    name, other.name
                )));
            }
        }
        let table = &mut self.tables[idx];
        table.range = new_range;
        table.has_totals = show;
        Ok(())
    }

    /// Remove a table
    pub fn remove(&mut self, name: &str) -> Option<Table> {
        let idx = self.index_of(name).ok()?;
        Some(self.tables.remove(idx))
    }

    /// Find a table by name (case insensitive)
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Table containing the cell
    pub fn table_at(&self, row: i32, column: i32) -> Option<&Table> {
        self.tables.iter().find(|t| t.range.contains(row, column))
    }

    /// First table intersecting `range`
    pub fn intersecting(&self, range: &RangeAddress) -> Option<&Table> {
        self.tables.iter().find(|t| t.range.intersects(range))
    }

    /// All tables
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether there are no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.tables
            .iter()
            .position(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidName(format!("no table named '{}'", name)))
    }

    /// Apply a structural edit to every table
    pub(crate) fn shift(&mut self, edit: &Edit) -> TableShift {
        let mut result = TableShift::default();
        self.tables.retain_mut(|table| {
            let new_range = match shift(&table.range, edit) {
                RangeOutcome::Unchanged => return true,
                RangeOutcome::Moved(r) | RangeOutcome::Truncated(r) => r,
                RangeOutcome::Invalidated => {
                    warn!("{:?}: table '{}' invalidated, discarding it", edit, table.name);
                    result.removed.push(table.name.clone());
                    return false;
                }
            };
            if new_range.row_count() < table.min_rows() {
                warn!(
                    "{:?}: table '{}' lost all its data rows, discarding it",
                    edit, table.name
                );
                result.removed.push(table.name.clone());
                return false;
            }
            let resized = new_range.row_count() != table.range.row_count()
                || new_range.column_count() != table.range.column_count();
            if resized {
                result.resized.push(table.name.clone());
            }
            table.range = new_range;
            true
        });
        result
    }
}
