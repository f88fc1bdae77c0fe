//! Rectangular range addresses

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::sheet_ref::{SheetRef, SheetResolver};
use crate::{MAX_COLS, MAX_ROWS};

use super::address::{
    a1_column, a1_row, apply_sheet_prefix, parse_a1_endpoint, parse_r1c1_endpoint,
    split_sheet_prefix, Address, Endpoint, FormatOptions, ReferenceStyle, REF_ERROR,
};

/// A rectangular range of cells (e.g. `A1:B10`, `3:5`, `Data!C:D`)
///
/// `first` is always the top-left corner and `last` the bottom-right one; both
/// carry the range's sheet. Whole rows and whole columns are ordinary ranges that
/// span the full other axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeAddress {
    /// Top-left corner
    pub first: Address,
    /// Bottom-right corner
    pub last: Address,
}

impl RangeAddress {
    /// Create a range from two corners, normalizing to top-left / bottom-right
    ///
    /// The `$` flags travel with the coordinate they belong to. The sheet is taken
    /// from `first`.
    pub fn new(first: Address, last: Address) -> Self {
        let sheet = first.sheet.clone();
        let invalid = !first.is_valid() || !last.is_valid();

        let (top, top_fixed, bottom, bottom_fixed) = if first.row <= last.row {
            (first.row, first.row_fixed, last.row, last.row_fixed)
        } else {
            (last.row, last.row_fixed, first.row, first.row_fixed)
        };
        let (left, left_fixed, right, right_fixed) = if first.column <= last.column {
            (first.column, first.column_fixed, last.column, last.column_fixed)
        } else {
            (last.column, last.column_fixed, first.column, first.column_fixed)
        };

        let mut range = Self {
            first: Address::with_fixed(top, left, top_fixed, left_fixed).on_sheet(sheet.clone()),
            last: Address::with_fixed(bottom, right, bottom_fixed, right_fixed).on_sheet(sheet),
        };
        if invalid {
            range = range.invalidated();
        }
        range
    }

    /// Create a relative range from 1-based coordinates
    pub fn from_coords(first_row: i32, first_col: i32, last_row: i32, last_col: i32) -> Self {
        Self::new(
            Address::new(first_row, first_col),
            Address::new(last_row, last_col),
        )
    }

    /// Single-cell range
    pub fn single(addr: Address) -> Self {
        Self {
            first: addr.clone(),
            last: addr,
        }
    }

    /// Rows `first..=last` across every column
    pub fn whole_rows(first: i32, last: i32) -> Self {
        Self::from_coords(first, 1, last, MAX_COLS)
    }

    /// Columns `first..=last` across every row
    pub fn whole_columns(first: i32, last: i32) -> Self {
        Self::from_coords(1, first, MAX_ROWS, last)
    }

    /// The whole sheet
    pub fn whole_sheet() -> Self {
        Self::from_coords(1, 1, MAX_ROWS, MAX_COLS)
    }

    /// The canonical invalid range (`#REF!`)
    pub fn invalid() -> Self {
        Self::single(Address::invalid())
    }

    /// Same range on another sheet
    pub fn on_sheet(mut self, sheet: SheetRef) -> Self {
        self.first.sheet = sheet.clone();
        self.last.sheet = sheet;
        self
    }

    /// Copy of this range marked invalid
    pub fn invalidated(&self) -> Self {
        Self {
            first: self.first.invalidated(),
            last: self.last.invalidated(),
        }
    }

    /// Sheet of this range
    pub fn sheet(&self) -> &SheetRef {
        &self.first.sheet
    }

    /// Whether both corners are valid and ordered
    pub fn is_valid(&self) -> bool {
        self.first.is_valid()
            && self.last.is_valid()
            && self.first.row <= self.last.row
            && self.first.column <= self.last.column
    }

    /// Whether the owning sheet was deleted
    pub fn is_sheet_deleted(&self) -> bool {
        self.first.is_sheet_deleted()
    }

    /// Range covers every column of its rows
    pub fn spans_all_columns(&self) -> bool {
        self.first.column == 1 && self.last.column == MAX_COLS
    }

    /// Range covers every row of its columns
    pub fn spans_all_rows(&self) -> bool {
        self.first.row == 1 && self.last.row == MAX_ROWS
    }

    /// Whether this is exactly one cell
    pub fn is_single_cell(&self) -> bool {
        self.first.row == self.last.row && self.first.column == self.last.column
    }

    /// Whether this range is one row or one column tall/wide
    pub fn is_linear(&self) -> bool {
        self.first.row == self.last.row || self.first.column == self.last.column
    }

    /// Number of rows
    pub fn row_count(&self) -> i32 {
        self.last.row - self.first.row + 1
    }

    /// Number of columns
    pub fn column_count(&self) -> i32 {
        self.last.column - self.first.column + 1
    }

    /// Number of cells
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.column_count() as u64
    }

    /// Whether the cell lies inside this range (coordinates only)
    pub fn contains(&self, row: i32, column: i32) -> bool {
        row >= self.first.row
            && row <= self.last.row
            && column >= self.first.column
            && column <= self.last.column
    }

    /// Whether the address lies inside this range (coordinates only)
    pub fn contains_address(&self, addr: &Address) -> bool {
        self.contains(addr.row, addr.column)
    }

    /// Whether `other` lies completely inside this range
    pub fn contains_range(&self, other: &RangeAddress) -> bool {
        self.contains(other.first.row, other.first.column)
            && self.contains(other.last.row, other.last.column)
    }

    /// Whether the two ranges share at least one cell
    pub fn intersects(&self, other: &RangeAddress) -> bool {
        self.first.row <= other.last.row
            && self.last.row >= other.first.row
            && self.first.column <= other.last.column
            && self.last.column >= other.first.column
    }

    /// Shared cells of the two ranges; keeps this range's sheet and flags
    pub fn intersection(&self, other: &RangeAddress) -> Option<RangeAddress> {
        if !self.intersects(other) {
            return None;
        }
        let mut out = self.clone();
        out.first
            .set_coordinates(self.first.row.max(other.first.row), self.first.column.max(other.first.column));
        out.last
            .set_coordinates(self.last.row.min(other.last.row), self.last.column.min(other.last.column));
        Some(out)
    }

    /// Smallest range covering both
    pub fn bounding_union(&self, other: &RangeAddress) -> RangeAddress {
        let mut out = self.clone();
        out.first
            .set_coordinates(self.first.row.min(other.first.row), self.first.column.min(other.first.column));
        out.last
            .set_coordinates(self.last.row.max(other.last.row), self.last.column.max(other.last.column));
        out
    }

    /// Whether the two ranges touch along a complete shared edge without overlapping
    ///
    /// `A1:B2` and `C1:C2` are adjacent; `A1:B2` and `C2:C3` are not.
    pub fn is_adjacent(&self, other: &RangeAddress) -> bool {
        let same_rows = self.first.row == other.first.row && self.last.row == other.last.row;
        let same_cols =
            self.first.column == other.first.column && self.last.column == other.last.column;
        (same_rows
            && (self.last.column + 1 == other.first.column
                || other.last.column + 1 == self.first.column))
            || (same_cols
                && (self.last.row + 1 == other.first.row || other.last.row + 1 == self.first.row))
    }

    /// Whether the union of the two ranges is itself a rectangle
    pub fn union_is_rectangle(&self, other: &RangeAddress) -> bool {
        self.contains_range(other)
            || other.contains_range(self)
            || self.is_adjacent(other)
            || (self.intersects(other) && {
                let same_rows =
                    self.first.row == other.first.row && self.last.row == other.last.row;
                let same_cols = self.first.column == other.first.column
                    && self.last.column == other.last.column;
                same_rows || same_cols
            })
    }

    /// The parts of this range not covered by `hole`
    ///
    /// Returns up to four strips in reading order: the full-width band above the
    /// hole, the pieces left and right of it, then the full-width band below.
    pub fn subtract(&self, hole: &RangeAddress) -> Vec<RangeAddress> {
        let cut = match self.intersection(hole) {
            Some(cut) => cut,
            None => return vec![self.clone()],
        };

        let mut parts = Vec::with_capacity(4);
        let (top, bottom) = (self.first.row, self.last.row);
        let (left, right) = (self.first.column, self.last.column);

        if cut.first.row > top {
            parts.push(self.with_coords(top, left, cut.first.row - 1, right));
        }
        if cut.first.column > left {
            parts.push(self.with_coords(cut.first.row, left, cut.last.row, cut.first.column - 1));
        }
        if cut.last.column < right {
            parts.push(self.with_coords(cut.first.row, cut.last.column + 1, cut.last.row, right));
        }
        if cut.last.row < bottom {
            parts.push(self.with_coords(cut.last.row + 1, left, bottom, right));
        }
        parts
    }

    /// Same range moved by a delta, or `None` if any corner would leave the grid
    pub fn offset(&self, rows: i32, columns: i32) -> Option<RangeAddress> {
        Some(Self {
            first: self.first.offset(rows, columns)?,
            last: self.last.offset(rows, columns)?,
        })
    }

    /// Move this range so that `from` lands on `to`, keeping its size
    pub fn rebase(&self, from: &Address, to: &Address) -> Option<RangeAddress> {
        self.offset(to.row - from.row, to.column - from.column)
    }

    /// Copy with new coordinates, keeping sheet, flags and validity
    pub fn with_coords(&self, first_row: i32, first_col: i32, last_row: i32, last_col: i32) -> Self {
        let mut out = self.clone();
        out.first.set_coordinates(first_row, first_col);
        out.last.set_coordinates(last_row, last_col);
        out
    }

    /// Iterate `(row, column)` pairs in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> {
        let (r1, c1, r2, c2) = (
            self.first.row,
            self.first.column,
            self.last.row,
            self.last.column,
        );
        (r1..=r2).flat_map(move |r| (c1..=c2).map(move |c| (r, c)))
    }

    /// Parse an A1 range (`A1:B2`, `$A$1`, `3:5`, `A:C`, `Sheet1!A1:B2`, `#REF!`)
    ///
    /// # Examples
    /// ```
    /// use gridspan_core::RangeAddress;
    ///
    /// let range = RangeAddress::parse("B2:D5").unwrap();
    /// assert_eq!(range.row_count(), 4);
    /// assert_eq!(range.column_count(), 3);
    ///
    /// assert!(RangeAddress::parse("3:5").unwrap().spans_all_columns());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let (sheet, body) = split_sheet_prefix(text)?;
        if body.eq_ignore_ascii_case(REF_ERROR) {
            return Ok(Self::invalid().on_sheet(sheet));
        }

        let (start, end) = match body.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (body, None),
        };
        let start = parse_a1_endpoint(start, text)?;
        let end = match end {
            Some(b) => parse_a1_endpoint(b, text)?,
            None => start,
        };

        let range = match (start, end) {
            (
                Endpoint::Cell {
                    row: r1,
                    row_fixed: rf1,
                    column: c1,
                    column_fixed: cf1,
                },
                Endpoint::Cell {
                    row: r2,
                    row_fixed: rf2,
                    column: c2,
                    column_fixed: cf2,
                },
            ) => Self::new(
                Address::with_fixed(r1, c1, rf1, cf1),
                Address::with_fixed(r2, c2, rf2, cf2),
            ),
            (Endpoint::Row { row: r1, fixed: f1 }, Endpoint::Row { row: r2, fixed: f2 })
                if body.contains(':') =>
            {
                Self::new(
                    Address::with_fixed(r1, 1, f1, false),
                    Address::with_fixed(r2, MAX_COLS, f2, false),
                )
            }
            (
                Endpoint::Column {
                    column: c1,
                    fixed: f1,
                },
                Endpoint::Column {
                    column: c2,
                    fixed: f2,
                },
            ) if body.contains(':') => Self::new(
                Address::with_fixed(1, c1, false, f1),
                Address::with_fixed(MAX_ROWS, c2, false, f2),
            ),
            _ => return Err(Error::parse(text, "mismatched range endpoints")),
        };
        Ok(range.on_sheet(sheet))
    }

    /// Parse an absolute R1C1 range (`R1C1:R4C3`, `R2:R5`, `C3`)
    pub fn parse_r1c1(text: &str) -> Result<Self> {
        Self::parse_r1c1_with_base(text, None)
    }

    /// Parse an R1C1 range that may contain relative parts against `base`
    pub fn parse_r1c1_relative(text: &str, base: &Address) -> Result<Self> {
        Self::parse_r1c1_with_base(text, Some(base))
    }

    fn parse_r1c1_with_base(text: &str, base: Option<&Address>) -> Result<Self> {
        let (sheet, body) = split_sheet_prefix(text)?;
        if body.eq_ignore_ascii_case(REF_ERROR) {
            return Ok(Self::invalid().on_sheet(sheet));
        }

        let (start, end) = match body.split_once(':') {
            Some((a, b)) => (a, b),
            None => (body, body),
        };
        let (r1, c1) = parse_r1c1_endpoint(start, text, base)?;
        let (r2, c2) = parse_r1c1_endpoint(end, text, base)?;

        let range = match (r1, c1, r2, c2) {
            (Some(r1), Some(c1), Some(r2), Some(c2)) => Self::new(
                Address::with_fixed(r1.0, c1.0, r1.1, c1.1),
                Address::with_fixed(r2.0, c2.0, r2.1, c2.1),
            ),
            (Some(r1), None, Some(r2), None) => Self::new(
                Address::with_fixed(r1.0, 1, r1.1, false),
                Address::with_fixed(r2.0, MAX_COLS, r2.1, false),
            ),
            (None, Some(c1), None, Some(c2)) => Self::new(
                Address::with_fixed(1, c1.0, false, c1.1),
                Address::with_fixed(MAX_ROWS, c2.0, false, c2.1),
            ),
            _ => return Err(Error::parse(text, "mismatched range endpoints")),
        };
        Ok(range.on_sheet(sheet))
    }

    /// Parse a comma-separated list of ranges (`A1:B2, D4, 7:7`)
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        split_list(text)
            .into_iter()
            .map(|part| {
                if part.trim().is_empty() {
                    Err(Error::parse(text, "empty list item"))
                } else {
                    Self::parse(part)
                }
            })
            .collect()
    }

    /// Render a list of ranges separated by commas
    pub fn format_list(
        ranges: &[RangeAddress],
        options: FormatOptions,
        sheets: &dyn SheetResolver,
    ) -> String {
        ranges
            .iter()
            .map(|r| r.format(options, sheets))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// A1 text with own `$` flags and no sheet
    pub fn to_a1_string(&self) -> String {
        self.format_inner(FormatOptions::a1(), None)
    }

    /// Absolute R1C1 text
    pub fn to_r1c1_string(&self) -> String {
        self.format_inner(FormatOptions::r1c1(), None)
    }

    /// Render with the given options, resolving sheet names through `sheets`
    ///
    /// Whole rows render as `3:5`, whole columns as `A:C`; a single cell renders
    /// as one address.
    pub fn format(&self, options: FormatOptions, sheets: &dyn SheetResolver) -> String {
        self.format_inner(options, Some(sheets))
    }

    fn format_inner(&self, options: FormatOptions, sheets: Option<&dyn SheetResolver>) -> String {
        if !self.is_valid() {
            return REF_ERROR.to_string();
        }
        let body = match options.style {
            ReferenceStyle::A1 => self.a1_body(options.fixed),
            ReferenceStyle::R1C1 => self.r1c1_body(),
        };
        apply_sheet_prefix(self.sheet(), sheets, options.with_sheet, body)
    }

    fn a1_body(&self, force: bool) -> String {
        let (first, last) = (&self.first, &self.last);
        let mut out = String::with_capacity(16);
        if self.spans_all_columns() {
            a1_row(&mut out, first.row, force || first.row_fixed);
            out.push(':');
            a1_row(&mut out, last.row, force || last.row_fixed);
        } else if self.spans_all_rows() {
            a1_column(&mut out, first.column, force || first.column_fixed);
            out.push(':');
            a1_column(&mut out, last.column, force || last.column_fixed);
        } else {
            a1_column(&mut out, first.column, force || first.column_fixed);
            a1_row(&mut out, first.row, force || first.row_fixed);
            if !self.is_single_cell() {
                out.push(':');
                a1_column(&mut out, last.column, force || last.column_fixed);
                a1_row(&mut out, last.row, force || last.row_fixed);
            }
        }
        out
    }

    fn r1c1_body(&self) -> String {
        let (first, last) = (&self.first, &self.last);
        if self.spans_all_columns() {
            if first.row == last.row {
                format!("R{}", first.row)
            } else {
                format!("R{}:R{}", first.row, last.row)
            }
        } else if self.spans_all_rows() {
            if first.column == last.column {
                format!("C{}", first.column)
            } else {
                format!("C{}:C{}", first.column, last.column)
            }
        } else if self.is_single_cell() {
            format!("R{}C{}", first.row, first.column)
        } else {
            format!(
                "R{}C{}:R{}C{}",
                first.row, first.column, last.row, last.column
            )
        }
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for RangeAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Address> for RangeAddress {
    fn from(addr: Address) -> Self {
        Self::single(addr)
    }
}

/// Parsed reference text: a single cell or a range
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    /// `B3`
    Cell(Address),
    /// `B3:C4`, `3:5`, `A:C`
    Range(RangeAddress),
}

impl Reference {
    /// Parse A1 text into a cell or a range
    pub fn parse(text: &str) -> Result<Self> {
        if text.contains(':') {
            RangeAddress::parse(text).map(Reference::Range)
        } else {
            Address::parse(text).map(Reference::Cell)
        }
    }

    /// The reference as a range (a cell becomes a single-cell range)
    pub fn into_range(self) -> RangeAddress {
        match self {
            Reference::Cell(addr) => RangeAddress::single(addr),
            Reference::Range(range) => range,
        }
    }

    /// Whether the reference is valid
    pub fn is_valid(&self) -> bool {
        match self {
            Reference::Cell(addr) => addr.is_valid(),
            Reference::Range(range) => range.is_valid(),
        }
    }
}

impl FromStr for Reference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Cell(addr) => addr.fmt(f),
            Reference::Range(range) => range.fmt(f),
        }
    }
}

/// Split on commas that are not inside a quoted sheet name
fn split_list(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
