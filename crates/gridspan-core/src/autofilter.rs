//! Worksheet autofilter
//!
//! The autofilter is either disabled or enabled over a range whose first row is
//! the header. Each column of the range may carry an ordered list of
//! [`Filter`]s. [`AutoFilterMut::reapply`] evaluates every data row and hides
//! the rows that fail any active column.
//!
//! ```
//! use gridspan_core::{RangeAddress, Worksheet};
//!
//! let mut sheet = Worksheet::new("People");
//! for (row, name) in ["Names", "Manuel", "Carlos", "Dominic"].iter().enumerate() {
//!     sheet.set_cell_value_at(row as i32 + 1, 1, *name).unwrap();
//! }
//! sheet.set_autofilter(RangeAddress::parse("A1:A4").unwrap()).unwrap();
//!
//! let mut filter = sheet.autofilter_mut();
//! filter.column(1).unwrap().add_filter("Carlos");
//! filter.reapply().unwrap();
//! assert_eq!(filter.visible_rows(), vec![1, 3]);
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::cell::{CellData, CellStorage, CellValue, RangeAddress};
use crate::error::{Error, Result};
use crate::shift::{shift, Axis, Edit, RangeOutcome};
use crate::style::datetime_to_serial;

/// Comparison applied by a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterOperator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl FilterOperator {
    fn accepts(self, ord: Ordering) -> bool {
        match self {
            FilterOperator::Equal => ord == Ordering::Equal,
            FilterOperator::NotEqual => ord != Ordering::Equal,
            FilterOperator::GreaterThan => ord == Ordering::Greater,
            FilterOperator::LessThan => ord == Ordering::Less,
            FilterOperator::GreaterThanOrEqual => ord != Ordering::Less,
            FilterOperator::LessThanOrEqual => ord != Ordering::Greater,
        }
    }
}

/// How a filter combines with the result of the filters before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Connector {
    And,
    #[default]
    Or,
}

/// Typed value a filter compares against
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarValue {
    /// Compared with the cell's displayed text, ignoring case
    Text(String),
    /// Matches numeric cells only
    Number(f64),
    /// Matches date/time cells only
    DateTime(NaiveDateTime),
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Text(s.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(s: String) -> Self {
        ScalarValue::Text(s)
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

impl From<i32> for ScalarValue {
    fn from(n: i32) -> Self {
        ScalarValue::Number(f64::from(n))
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(dt: NaiveDateTime) -> Self {
        ScalarValue::DateTime(dt)
    }
}

/// Operator plus typed value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterPredicate {
    pub operator: FilterOperator,
    pub value: ScalarValue,
}

impl FilterPredicate {
    /// Create a predicate
    pub fn new(operator: FilterOperator, value: impl Into<ScalarValue>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }

    /// Test a cell given its value and displayed text
    ///
    /// Text predicates look at `display`. Number and date predicates need the
    /// cell to hold that same type; any other cell fails.
    pub fn evaluate(&self, cell: &CellValue, display: &str) -> bool {
        let ord = match (&self.value, cell) {
            (ScalarValue::Text(text), _) => Some(display.to_lowercase().cmp(&text.to_lowercase())),
            (ScalarValue::Number(n), CellValue::Number(v)) => v.partial_cmp(n),
            (ScalarValue::DateTime(dt), CellValue::DateTime(v)) => Some(v.cmp(dt)),
            _ => None,
        };
        ord.map_or(false, |ord| self.operator.accepts(ord))
    }
}

/// One filter of a column
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filter {
    pub predicate: FilterPredicate,
    pub connector: Connector,
}

/// Ordered filters of one column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterColumn {
    filters: Vec<Filter>,
}

impl FilterColumn {
    /// The filters in evaluation order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether this column filters anything
    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Combine the filters left to right
    ///
    /// The accumulator starts at `true` when the first filter is an AND and at
    /// `false` when it is an OR. An inactive column matches everything.
    pub fn matches(&self, cell: &CellValue, display: &str) -> bool {
        let Some(first) = self.filters.first() else {
            return true;
        };
        let mut acc = first.connector == Connector::And;
        for filter in &self.filters {
            acc = match filter.connector {
                Connector::And => acc && filter.predicate.evaluate(cell, display),
                Connector::Or => acc || filter.predicate.evaluate(cell, display),
            };
        }
        acc
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Last sort applied through the autofilter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    /// Absolute sheet column
    pub column: i32,
    pub order: SortOrder,
    pub match_case: bool,
    pub ignore_blanks: bool,
}

/// What a structural edit did to the autofilter
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AutoFilterShift {
    Unchanged,
    Changed,
    Discarded,
}

/// Autofilter state of a worksheet
#[derive(Debug, Clone, Default)]
pub struct AutoFilter {
    range: Option<RangeAddress>,
    /// Keyed by absolute sheet column
    columns: BTreeMap<i32, FilterColumn>,
    sort: Option<SortState>,
}

impl AutoFilter {
    /// Disabled autofilter
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the autofilter is enabled
    pub fn is_enabled(&self) -> bool {
        self.range.is_some()
    }

    /// Filtered range, header row included
    pub fn range(&self) -> Option<&RangeAddress> {
        self.range.as_ref()
    }

    /// Filters of the `n`th column of the range (1-based)
    pub fn column(&self, n: i32) -> Option<&FilterColumn> {
        let column = self.absolute_column(n).ok()?;
        self.columns.get(&column)
    }

    /// Active columns as (1-based position in the range, filters)
    pub fn filter_columns(&self) -> impl Iterator<Item = (i32, &FilterColumn)> {
        let origin = self.range.as_ref().map_or(1, |r| r.first.column);
        self.columns
            .iter()
            .filter(|(_, c)| c.is_active())
            .map(move |(&col, c)| (col - origin + 1, c))
    }

    /// Last sort applied
    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Whether a data row passes every active column
    pub fn row_matches(&self, cells: &CellStorage, row: i32, date_1904: bool) -> bool {
        self.columns
            .iter()
            .filter(|(_, c)| c.is_active())
            .all(|(&col, filters)| match cells.get(row, col) {
                Some(data) => filters.matches(&data.value, &display_text(cells, data, date_1904)),
                None => filters.matches(&CellValue::Empty, ""),
            })
    }

    /// Rows of the range that are not hidden, header included
    pub fn visible_rows(&self, cells: &CellStorage) -> Vec<i32> {
        match &self.range {
            Some(range) => (range.first.row..=range.last.row)
                .filter(|&row| !cells.is_row_hidden(row))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn set(&mut self, range: RangeAddress) -> Result<()> {
        if !range.is_valid() {
            return Err(Error::InvalidRange(range.to_string()));
        }
        self.range = Some(range);
        self.columns.clear();
        self.sort = None;
        Ok(())
    }

    pub(crate) fn clear(&mut self) -> Option<RangeAddress> {
        self.columns.clear();
        self.sort = None;
        self.range.take()
    }

    fn enabled_range(&self) -> Result<RangeAddress> {
        self.range
            .clone()
            .ok_or_else(|| Error::invalid_state("autofilter is not enabled"))
    }

    fn absolute_column(&self, n: i32) -> Result<i32> {
        let range = self.enabled_range()?;
        if n < 1 || n > range.column_count() {
            return Err(Error::ColumnOutOfRange(i64::from(n), range.column_count()));
        }
        Ok(range.first.column + n - 1)
    }

    /// Hide the data rows failing the filters; returns the number hidden
    pub(crate) fn reapply(&self, cells: &mut CellStorage, date_1904: bool) -> Result<usize> {
        let range = self.enabled_range()?;
        let mut hidden = 0;
        for row in (range.first.row + 1)..=range.last.row {
            let visible = self.row_matches(cells, row, date_1904);
            cells.set_row_hidden(row, !visible);
            hidden += usize::from(!visible);
        }
        debug!("autofilter {} reapplied, {} rows hidden", range, hidden);
        Ok(hidden)
    }

    /// Stable sort of the data rows by one column, then reapply
    pub(crate) fn sort(
        &mut self,
        cells: &mut CellStorage,
        n: i32,
        order: SortOrder,
        match_case: bool,
        ignore_blanks: bool,
        date_1904: bool,
    ) -> Result<()> {
        let column = self.absolute_column(n)?;
        let range = self.enabled_range()?;
        let (c1, c2) = (range.first.column, range.last.column);
        let first_data = range.first.row + 1;

        let mut rows: Vec<(CellValue, BTreeMap<i32, CellData>)> = (first_data..=range.last.row)
            .map(|row| {
                let segment = cells.take_row_segment(row, c1, c2);
                let key = match segment.get(&column).map(|c| &c.value) {
                    Some(CellValue::DateTime(dt)) => CellValue::Number(datetime_to_serial(dt, date_1904)),
                    Some(value) => value.clone(),
                    None => CellValue::Empty,
                };
                (key, segment)
            })
            .collect();

        rows.sort_by(|(a, _), (b, _)| {
            if ignore_blanks {
                match (a.is_empty(), b.is_empty()) {
                    (true, true) => return Ordering::Equal,
                    (true, false) => return Ordering::Greater,
                    (false, true) => return Ordering::Less,
                    _ => {}
                }
            }
            let ord = a.sort_cmp(b, match_case);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });

        for (offset, (_, segment)) in rows.into_iter().enumerate() {
            cells.put_row_segment(first_data + offset as i32, segment);
        }
        self.sort = Some(SortState {
            column,
            order,
            match_case,
            ignore_blanks,
        });
        self.reapply(cells, date_1904).map(|_| ())
    }

    /// Follow a structural edit
    pub(crate) fn shift(&mut self, edit: &Edit) -> AutoFilterShift {
        let Some(range) = self.range.clone() else {
            return AutoFilterShift::Unchanged;
        };
        let new_range = match shift(&range, edit) {
            RangeOutcome::Unchanged => return AutoFilterShift::Unchanged,
            RangeOutcome::Moved(r) | RangeOutcome::Truncated(r) => r,
            RangeOutcome::Invalidated => {
                warn!("{:?}: autofilter range {} invalidated, disabling it", edit, range);
                self.clear();
                return AutoFilterShift::Discarded;
            }
        };

        if edit.axis() == Axis::Columns {
            let columns = std::mem::take(&mut self.columns);
            self.columns = columns
                .into_iter()
                .filter_map(|(col, filters)| edit.shift_index(col).map(|c| (c, filters)))
                .collect();
            self.sort = self
                .sort
                .and_then(|s| edit.shift_index(s.column).map(|column| SortState { column, ..s }));
        }
        self.columns
            .retain(|&col, _| col >= new_range.first.column && col <= new_range.last.column);
        self.range = Some(new_range);
        AutoFilterShift::Changed
    }
}

/// Text shown for a cell under its number format
fn display_text(cells: &CellStorage, data: &CellData, date_1904: bool) -> String {
    cells
        .style_pool()
        .resolve(data.style)
        .number_format
        .format_value(&data.value, date_1904)
}

/// Mutable access to a worksheet's autofilter
pub struct AutoFilterMut<'a> {
    filter: &'a mut AutoFilter,
    cells: &'a mut CellStorage,
    date_1904: bool,
}

impl<'a> AutoFilterMut<'a> {
    pub(crate) fn new(filter: &'a mut AutoFilter, cells: &'a mut CellStorage, date_1904: bool) -> Self {
        Self {
            filter,
            cells,
            date_1904,
        }
    }

    /// Whether the autofilter is enabled
    pub fn is_enabled(&self) -> bool {
        self.filter.is_enabled()
    }

    /// Filtered range
    pub fn range(&self) -> Option<&RangeAddress> {
        self.filter.range()
    }

    /// Filters of the `n`th column of the range (1-based)
    pub fn column(&mut self, n: i32) -> Result<FilterColumnMut<'_>> {
        let column = self.filter.absolute_column(n)?;
        Ok(FilterColumnMut {
            column: self.filter.columns.entry(column).or_default(),
        })
    }

    /// Remove every column's filters and show all rows again
    pub fn clear_filters(&mut self) -> Result<()> {
        self.filter.enabled_range()?;
        self.filter.columns.clear();
        self.filter.reapply(self.cells, self.date_1904).map(|_| ())
    }

    /// Re-evaluate every data row; returns the number of hidden rows
    pub fn reapply(&mut self) -> Result<usize> {
        self.filter.reapply(self.cells, self.date_1904)
    }

    /// Sort the data rows by the `n`th column, then reapply
    pub fn sort(
        &mut self,
        n: i32,
        order: SortOrder,
        match_case: bool,
        ignore_blanks: bool,
    ) -> Result<()> {
        self.filter
            .sort(self.cells, n, order, match_case, ignore_blanks, self.date_1904)
    }

    /// Rows of the range that are not hidden, header included
    pub fn visible_rows(&self) -> Vec<i32> {
        self.filter.visible_rows(self.cells)
    }
}

/// Mutable access to one filter column
pub struct FilterColumnMut<'a> {
    column: &'a mut FilterColumn,
}

impl FilterColumnMut<'_> {
    /// Append a filter
    pub fn add(&mut self, predicate: FilterPredicate, connector: Connector) -> &mut Self {
        self.column.filters.push(Filter {
            predicate,
            connector,
        });
        self
    }

    /// Also show rows equal to `value`
    pub fn add_filter(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.add(FilterPredicate::new(FilterOperator::Equal, value), Connector::Or)
    }

    /// Only show rows equal to `value`
    pub fn equal_to(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.add(FilterPredicate::new(FilterOperator::Equal, value), Connector::And)
    }

    /// Only show rows not equal to `value`
    pub fn not_equal_to(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.add(FilterPredicate::new(FilterOperator::NotEqual, value), Connector::And)
    }

    /// Only show rows greater than `value`
    pub fn greater_than(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.add(FilterPredicate::new(FilterOperator::GreaterThan, value), Connector::And)
    }

    /// Only show rows less than `value`
    pub fn less_than(&mut self, value: impl Into<ScalarValue>) -> &mut Self {
        self.add(FilterPredicate::new(FilterOperator::LessThan, value), Connector::And)
    }

    /// Only show rows within `low..=high`
    pub fn between(
        &mut self,
        low: impl Into<ScalarValue>,
        high: impl Into<ScalarValue>,
    ) -> &mut Self {
        self.add(
            FilterPredicate::new(FilterOperator::GreaterThanOrEqual, low),
            Connector::And,
        )
        .add(
            FilterPredicate::new(FilterOperator::LessThanOrEqual, high),
            Connector::And,
        )
    }

    /// Remove this column's filters
    pub fn clear(&mut self) -> &mut Self {
        self.column.filters.clear();
        self
    }

    /// The filters in evaluation order
    pub fn filters(&self) -> &[Filter] {
        self.column.filters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{NumberFormat, Style};

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    fn people() -> (AutoFilter, CellStorage) {
        let mut cells = CellStorage::new();
        for (i, name) in ["Names", "Manuel", "Carlos", "Dominic"].iter().enumerate() {
            cells.set_value(i as i32 + 1, 1, CellValue::from(*name));
        }
        cells.set_value(1, 2, CellValue::from("Age"));
        cells.set_value(2, 2, CellValue::from(41));
        cells.set_value(3, 2, CellValue::from(29));
        cells.set_value(4, 2, CellValue::from(35));
        let mut filter = AutoFilter::new();
        filter.set(r("A1:B4")).unwrap();
        (filter, cells)
    }

    #[test]
    fn test_add_filter_shows_matching_rows() {
        let (mut filter, mut cells) = people();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.column(1).unwrap().add_filter("Carlos");
        assert_eq!(handle.reapply().unwrap(), 2);
        assert_eq!(handle.visible_rows(), vec![1, 3]);
    }

    #[test]
    fn test_or_filters_widen() {
        let (mut filter, mut cells) = people();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.column(1).unwrap().add_filter("carlos").add_filter("DOMINIC");
        handle.reapply().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 3, 4]);
    }

    #[test]
    fn test_between_numbers() {
        let (mut filter, mut cells) = people();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.column(2).unwrap().between(30, 40);
        handle.reapply().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 4]);
    }

    #[test]
    fn test_columns_combine_with_and() {
        let (mut filter, mut cells) = people();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.column(1).unwrap().not_equal_to("Manuel");
        handle.column(2).unwrap().greater_than(30);
        handle.reapply().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 4]);

        handle.clear_filters().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_numeric_filter_rejects_text_cells() {
        let predicate = FilterPredicate::new(FilterOperator::GreaterThan, 1);
        assert!(predicate.evaluate(&CellValue::Number(2.0), "2"));
        assert!(!predicate.evaluate(&CellValue::from("2"), "2"));
    }

    #[test]
    fn test_text_filter_uses_display_string() {
        let mut cells = CellStorage::new();
        let thousands = cells
            .style_pool_mut()
            .get_or_insert(Style::new().number_format(NumberFormat::thousands()));
        cells.set_value(1, 1, CellValue::from("Amount"));
        cells.set(2, 1, CellData::with_style(CellValue::Number(1234.0), thousands));
        cells.set_value(3, 1, CellValue::Number(1234.0));

        let mut filter = AutoFilter::new();
        filter.set(r("A1:A3")).unwrap();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.column(1).unwrap().equal_to("1,234");
        handle.reapply().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 2]);

        handle.column(1).unwrap().clear().equal_to(1234);
        handle.reapply().unwrap();
        assert_eq!(handle.visible_rows(), vec![1, 2, 3]);
    }

    #[test]
    fn test_disabled_autofilter_is_invalid_state() {
        let mut filter = AutoFilter::new();
        let mut cells = CellStorage::new();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        assert!(matches!(handle.column(1), Err(Error::InvalidState(_))));
        assert!(matches!(handle.reapply(), Err(Error::InvalidState(_))));
        assert!(matches!(
            handle.sort(1, SortOrder::Ascending, false, true),
            Err(Error::InvalidState(_))
        ));
        assert!(filter.clear().is_none());
    }

    #[test]
    fn test_column_out_of_range() {
        let (mut filter, mut cells) = people();
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        assert!(matches!(handle.column(3), Err(Error::ColumnOutOfRange(3, 2))));
        handle.column(2).unwrap().greater_than(30);

        assert!(filter.column(2).is_some());
        assert!(filter.column(3).is_none());
        assert!(filter.column(0).is_none());
        assert!(filter.column(i32::MAX).is_none());
        assert!(filter.column(i32::MIN).is_none());
    }

    #[test]
    fn test_sort_is_stable_and_keeps_rows_together() {
        let (mut filter, mut cells) = people();
        cells.set_value(5, 1, CellValue::from("Ana"));
        cells.set_value(5, 2, CellValue::from(29));
        filter.set(r("A1:B5")).unwrap();

        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.sort(2, SortOrder::Ascending, false, true).unwrap();
        let names: Vec<_> = (2..=5)
            .map(|row| cells.get(row, 1).unwrap().value.to_string())
            .collect();
        assert_eq!(names, vec!["Carlos", "Ana", "Dominic", "Manuel"]);
        assert_eq!(cells.get(1, 1).unwrap().value.as_string(), Some("Names"));
        assert_eq!(filter.sort_state().unwrap().column, 2);
    }

    #[test]
    fn test_sort_descending_with_blanks_last() {
        let (mut filter, mut cells) = people();
        cells.remove(3, 2);
        let mut handle = AutoFilterMut::new(&mut filter, &mut cells, false);
        handle.sort(2, SortOrder::Descending, false, true).unwrap();
        let names: Vec<_> = (2..=4)
            .map(|row| cells.get(row, 1).unwrap().value.to_string())
            .collect();
        assert_eq!(names, vec!["Manuel", "Dominic", "Carlos"]);
    }

    #[test]
    fn test_shift_follows_columns() {
        let (mut filter, _) = people();
        filter.columns.entry(2).or_default().filters.push(Filter {
            predicate: FilterPredicate::new(FilterOperator::Equal, 29),
            connector: Connector::Or,
        });

        assert_eq!(
            filter.shift(&Edit::InsertColumns { at: 2, count: 1 }),
            AutoFilterShift::Changed
        );
        assert_eq!(filter.range(), Some(&r("A1:C4")));
        assert!(filter.column(3).unwrap().is_active());
        assert!(filter.column(2).is_none());

        filter.shift(&Edit::DeleteColumns { at: 3, count: 1 });
        assert_eq!(filter.range(), Some(&r("A1:B4")));
        assert_eq!(filter.filter_columns().count(), 0);

        assert_eq!(
            filter.shift(&Edit::DeleteRows { at: 1, count: 4 }),
            AutoFilterShift::Discarded
        );
        assert!(!filter.is_enabled());
    }
}
