//! Worksheet type

use log::debug;

use crate::autofilter::{AutoFilter, AutoFilterMut, AutoFilterShift};
use crate::cell::{Address, CellData, CellStorage, CellValue, RangeAddress};
use crate::conditional_format::ConditionalFormatStore;
use crate::error::{Error, Result};
use crate::merged::MergedRegions;
use crate::notify::{Notification, NotificationQueue, StoreKind};
use crate::sheet_ref::{SheetId, SheetRef};
use crate::shift::Edit;
use crate::sparkline::SparklineStore;
use crate::style::{Style, StyleId};
use crate::table::{Table, TableStore};
use crate::validation::{DataValidation, ValidationStore};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
///
/// Owns the cell arena and every range-scoped annotation of the sheet. A
/// structural edit applied through [`Worksheet::apply_edit`] moves all of them
/// together.
#[derive(Debug, Clone)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Id assigned by the owning workbook
    id: Option<SheetId>,
    /// Sheet is visible
    visible: bool,
    /// Cell storage
    pub(crate) cells: CellStorage,
    /// Data validations
    pub(crate) validations: ValidationStore,
    /// Conditional formatting rules
    pub(crate) conditional_formats: ConditionalFormatStore,
    /// Sparkline groups
    pub(crate) sparklines: SparklineStore,
    /// Merged regions
    pub(crate) merged: MergedRegions,
    /// Tables
    pub(crate) tables: TableStore,
    /// Autofilter
    pub(crate) autofilter: AutoFilter,
    notifications: NotificationQueue,
    delivered: Vec<Notification>,
    pub(crate) date_1904: bool,
    pub(crate) consolidate_on_copy: bool,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            id: None,
            visible: true,
            cells: CellStorage::new(),
            validations: ValidationStore::new(),
            conditional_formats: ConditionalFormatStore::new(),
            sparklines: SparklineStore::new(),
            merged: MergedRegions::new(),
            tables: TableStore::new(),
            autofilter: AutoFilter::new(),
            notifications: NotificationQueue::new(),
            delivered: Vec::new(),
            date_1904: false,
            consolidate_on_copy: true,
        }
    }

    pub(crate) fn with_id<S: Into<String>>(name: S, id: SheetId) -> Self {
        let mut sheet = Self::new(name);
        sheet.id = Some(id);
        sheet
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    /// Id of this sheet in its workbook, `None` for a detached sheet
    pub fn id(&self) -> Option<SheetId> {
        self.id
    }

    /// Check if the sheet is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set sheet visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether dates use the 1904 system
    pub fn date_1904(&self) -> bool {
        self.date_1904
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = Address::parse(address)?;
        Ok(self.cells.get(addr.row, addr.column))
    }

    /// Get a cell by row and column (1-based)
    pub fn cell_at(&self, row: i32, col: i32) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = Address::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.column))
    }

    /// Get cell value by row and column
    pub fn get_value_at(&self, row: i32, col: i32) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Text shown for a cell under its number format
    pub fn display_text_at(&self, row: i32, col: i32) -> String {
        match self.cells.get(row, col) {
            Some(cell) => self
                .cells
                .style_pool()
                .resolve(cell.style)
                .number_format
                .format_value(&cell.value, self.date_1904),
            None => String::new(),
        }
    }

    /// Get the non-default style applied to a cell, if any
    pub fn cell_style_at(&self, row: i32, col: i32) -> Option<&Style> {
        self.cells
            .get(row, col)
            .filter(|c| !c.style.is_default())
            .and_then(|c| self.cells.style_pool().get(c.style))
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = Address::parse(address)?;
        self.set_cell_value_at(addr.row, addr.column, value)
    }

    /// Set a cell value by row and column
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: i32, col: i32, value: V) -> Result<()> {
        validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a cell style by row and column
    pub fn set_cell_style_at(&mut self, row: i32, col: i32, style: &Style) -> Result<()> {
        validate_cell_position(row, col)?;
        let id = self.intern_style(style.clone());
        self.cells.set_style(row, col, id);
        Ok(())
    }

    /// Intern a style in this sheet's pool
    pub fn intern_style(&mut self, style: Style) -> StyleId {
        self.cells.style_pool_mut().get_or_insert(style)
    }

    /// Look up an interned style
    pub fn style(&self, id: StyleId) -> &Style {
        self.cells.style_pool().resolve(id)
    }

    /// Clear a cell by row and column
    pub fn clear_cell_at(&mut self, row: i32, col: i32) {
        self.cells.remove(row, col);
    }

    /// Clear all cells in a range (annotations are kept)
    pub fn clear_range(&mut self, range: &RangeAddress) {
        self.cells.clear_range(range);
    }

    /// Get the used range (bounds of all non-empty cells)
    pub fn used_range(&self) -> Option<RangeAddress> {
        self.cells.used_range()
    }

    /// Number of stored cells
    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    /// Iterate stored cells in row order
    pub fn iter_cells(&self) -> impl Iterator<Item = (i32, i32, &CellData)> {
        self.cells.iter()
    }

    // === Row/Column Operations ===

    /// Get row height
    pub fn row_height(&self, row: i32) -> f64 {
        self.cells.row_height(row)
    }

    /// Set row height
    pub fn set_row_height(&mut self, row: i32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    /// Check if row is hidden
    pub fn is_row_hidden(&self, row: i32) -> bool {
        self.cells.is_row_hidden(row)
    }

    /// Set row hidden state
    pub fn set_row_hidden(&mut self, row: i32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    /// Get column width
    pub fn column_width(&self, col: i32) -> f64 {
        self.cells.column_width(col)
    }

    /// Set column width
    pub fn set_column_width(&mut self, col: i32, width: f64) {
        self.cells.set_column_width(col, width);
    }

    /// Check if column is hidden
    pub fn is_column_hidden(&self, col: i32) -> bool {
        self.cells.is_column_hidden(col)
    }

    /// Set column hidden state
    pub fn set_column_hidden(&mut self, col: i32, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    // === Data Validation ===

    /// Data validations of this sheet
    pub fn validations(&self) -> &ValidationStore {
        &self.validations
    }

    /// Data validations of this sheet, mutably
    pub fn validations_mut(&mut self) -> &mut ValidationStore {
        &mut self.validations
    }

    /// Validation governing a cell
    pub fn data_validation_at(&self, row: i32, col: i32) -> Option<&DataValidation> {
        self.validations.validation_at(row, col)
    }

    /// Whether a cell is covered by a data validation
    pub fn has_data_validation(&self, row: i32, col: i32) -> bool {
        self.validations.validation_at(row, col).is_some()
    }

    // === Conditional Formatting ===

    /// Conditional formats of this sheet
    pub fn conditional_formats(&self) -> &ConditionalFormatStore {
        &self.conditional_formats
    }

    /// Conditional formats of this sheet, mutably
    pub fn conditional_formats_mut(&mut self) -> &mut ConditionalFormatStore {
        &mut self.conditional_formats
    }

    // === Sparklines ===

    /// Sparkline groups of this sheet
    pub fn sparklines(&self) -> &SparklineStore {
        &self.sparklines
    }

    /// Sparkline groups of this sheet, mutably
    pub fn sparklines_mut(&mut self) -> &mut SparklineStore {
        &mut self.sparklines
    }

    /// Whether a cell holds a sparkline
    pub fn has_sparkline(&self, row: i32, col: i32) -> bool {
        self.sparklines.has_sparkline(row, col)
    }

    // === Merged Cells ===

    /// Merged regions
    pub fn merged_regions(&self) -> &MergedRegions {
        &self.merged
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: RangeAddress) -> Result<()> {
        self.merged.merge(range)
    }

    /// Unmerge cells
    pub fn unmerge_cells(&mut self, range: &RangeAddress) -> bool {
        self.merged.unmerge(range)
    }

    /// Merged region containing a cell
    pub fn merged_region_at(&self, row: i32, col: i32) -> Option<&RangeAddress> {
        self.merged.merged_region_at(row, col)
    }

    // === Tables ===

    /// Tables of this sheet
    pub fn tables(&self) -> &TableStore {
        &self.tables
    }

    /// Add a table
    ///
    /// Fails with [`Error::ConflictingStructure`] when the range overlaps another
    /// table or the autofilter, or the name is taken.
    pub fn add_table(&mut self, name: &str, range: RangeAddress, has_header: bool) -> Result<&Table> {
        if let Some(filter_range) = self.autofilter.range() {
            if filter_range.intersects(&range) {
                return Err(Error::conflict(format!(
                    "{} overlaps the autofilter range {}",
                    range.to_a1_string(),
                    filter_range.to_a1_string()
                )));
            }
        }
        self.tables.add(name, range, has_header).map(|t| &*t)
    }

    /// Show or hide a table's totals row
    ///
    /// Showing it claims the row below the table, which must not overlap
    /// another table or the autofilter.
    pub fn set_table_totals_row(&mut self, name: &str, show: bool) -> Result<()> {
        if let (Some(table), Some(filter_range)) = (self.tables.get(name), self.autofilter.range()) {
            let range = table.range();
            if show && !table.has_totals() && range.last.row < MAX_ROWS {
                let row = range.last.row + 1;
                let claimed = range.with_coords(row, range.first.column, row, range.last.column);
                if filter_range.intersects(&claimed) {
                    return Err(Error::conflict(format!(
                        "totals row of '{}' would overlap the autofilter range {}",
                        name,
                        filter_range.to_a1_string()
                    )));
                }
            }
        }
        self.tables.set_totals_row(name, show)
    }

    /// Remove a table
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }

    // === Autofilter ===

    /// Autofilter state
    pub fn autofilter(&self) -> &AutoFilter {
        &self.autofilter
    }

    /// Mutable autofilter handle
    pub fn autofilter_mut(&mut self) -> AutoFilterMut<'_> {
        AutoFilterMut::new(&mut self.autofilter, &mut self.cells, self.date_1904)
    }

    /// Enable the autofilter over `range`, replacing any previous one
    ///
    /// Fails with [`Error::ConflictingStructure`] when the range intersects a table.
    pub fn set_autofilter(&mut self, range: RangeAddress) -> Result<()> {
        if !range.is_valid() {
            return Err(Error::InvalidRange(range.to_string()));
        }
        if let Some(table) = self.tables.intersecting(&range) {
            return Err(Error::conflict(format!(
                "autofilter range {} overlaps table '{}'",
                range.to_a1_string(),
                table.name()
            )));
        }
        self.clear_autofilter();
        self.autofilter.set(range)
    }

    /// Disable the autofilter and show its rows again; no-op when disabled
    pub fn clear_autofilter(&mut self) {
        if let Some(range) = self.autofilter.clear() {
            for row in (range.first.row + 1)..=range.last.row {
                self.cells.set_row_hidden(row, false);
            }
        }
    }

    // === Structural edits ===

    /// Insert `count` rows before `row`
    pub fn insert_rows(&mut self, row: i32, count: i32) -> Result<()> {
        self.apply_edit(&Edit::InsertRows { at: row, count })
    }

    /// Delete `count` rows starting at `row`
    pub fn delete_rows(&mut self, row: i32, count: i32) -> Result<()> {
        self.apply_edit(&Edit::DeleteRows { at: row, count })
    }

    /// Insert `count` columns before `col`
    pub fn insert_columns(&mut self, col: i32, count: i32) -> Result<()> {
        self.apply_edit(&Edit::InsertColumns { at: col, count })
    }

    /// Delete `count` columns starting at `col`
    pub fn delete_columns(&mut self, col: i32, count: i32) -> Result<()> {
        self.apply_edit(&Edit::DeleteColumns { at: col, count })
    }

    /// Apply a structural edit to the cells and every store of this sheet
    ///
    /// The edit is validated first; nothing changes when it is out of range.
    /// Dependents are notified once, after every store has been shifted.
    pub fn apply_edit(&mut self, edit: &Edit) -> Result<()> {
        edit.validate()?;
        if edit.count() == 0 {
            return Ok(());
        }
        self.with_deferred_notifications(|ws| ws.shift_stores(edit))
    }

    fn shift_stores(&mut self, edit: &Edit) -> Result<()> {
        self.cells.apply_edit(edit);

        let validations = self.validations.shift(edit);
        if validations.is_lossy() {
            self.notify(Notification::EntriesInvalidated {
                store: StoreKind::Validations,
                ranges: validations.invalidated.len(),
            })?;
        }
        let formats = self.conditional_formats.shift(edit);
        if formats.is_lossy() {
            self.notify(Notification::EntriesInvalidated {
                store: StoreKind::ConditionalFormats,
                ranges: formats.invalidated.len(),
            })?;
        }

        let own_id = self.id;
        let sparklines = self.sparklines.shift(edit, |sheet| match sheet {
            SheetRef::Local => true,
            SheetRef::Live(id) => Some(*id) == own_id,
            _ => false,
        });
        if sparklines > 0 {
            self.notify(Notification::EntriesInvalidated {
                store: StoreKind::Sparklines,
                ranges: sparklines,
            })?;
        }

        let merged = self.merged.shift(edit);
        if !merged.is_empty() {
            self.notify(Notification::EntriesInvalidated {
                store: StoreKind::MergedRegions,
                ranges: merged.len(),
            })?;
        }

        let tables = self.tables.shift(edit);
        for name in tables.resized {
            self.notify(Notification::TableResized(name))?;
        }
        for name in tables.removed {
            self.notify(Notification::TableRemoved(name))?;
        }

        if self.autofilter.shift(edit) == AutoFilterShift::Changed {
            self.notify(Notification::AutoFilterStale)?;
        }

        debug!(
            "{}: applied {:?} ({} validations, {} formats, {} sparklines, {} merged, {} tables)",
            self.name,
            edit,
            self.validations.len(),
            self.conditional_formats.len(),
            self.sparklines.len(),
            self.merged.len(),
            self.tables.len()
        );
        Ok(())
    }

    // === Notifications ===

    /// Run `f` with notifications held back, then deliver them once
    ///
    /// Scopes nest; only the outermost one flushes. The flush happens even when
    /// `f` fails, and reapplying a stale autofilter may itself fail.
    pub fn with_deferred_notifications<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self) -> Result<R>,
    {
        self.notifications.suspend();
        let result = f(self);
        if self.notifications.resume() {
            self.flush_notifications()?;
        }
        result
    }

    /// Whether notifications are currently deferred
    pub fn notifications_deferred(&self) -> bool {
        self.notifications.is_deferred()
    }

    /// Take the notifications delivered since the last call
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.delivered)
    }

    pub(crate) fn notify(&mut self, notification: Notification) -> Result<()> {
        self.notifications.push(notification);
        if !self.notifications.is_deferred() {
            self.flush_notifications()?;
        }
        Ok(())
    }

    fn flush_notifications(&mut self) -> Result<()> {
        let pending = self.notifications.drain();
        if pending.is_empty() {
            return Ok(());
        }
        debug!("{}: flushing {} notifications", self.name, pending.len());
        for notification in &pending {
            if *notification == Notification::AutoFilterStale && self.autofilter.is_enabled() {
                self.autofilter.reapply(&mut self.cells, self.date_1904)?;
            }
        }
        self.delivered.extend(pending);
        Ok(())
    }
}

fn validate_cell_position(row: i32, col: i32) -> Result<()> {
    if !(1..=MAX_ROWS).contains(&row) {
        return Err(Error::RowOutOfRange(i64::from(row), MAX_ROWS));
    }
    if !(1..=MAX_COLS).contains(&col) {
        return Err(Error::ColumnOutOfRange(i64::from(col), MAX_COLS));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofilter::SortOrder;
    use crate::conditional_format::ConditionalFormatRule;
    use crate::sparkline::SparklineStyle;
    use crate::style::{Color, NumberFormat};
    use crate::validation::ValidationOperator;
    use pretty_assertions::assert_eq;

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    fn rs(text: &str) -> Vec<RangeAddress> {
        RangeAddress::parse_list(text).unwrap()
    }

    #[test]
    fn test_cell_values() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value_at(1, 2, 42.0).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value_at(1, 2).as_number(), Some(42.0));
        assert!(ws.get_value_at(5, 5).is_empty());
        assert_eq!(ws.used_range(), Some(r("A1:B1")));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut ws = Worksheet::new("Test");
        assert_eq!(
            ws.set_cell_value_at(0, 1, 1.0),
            Err(Error::RowOutOfRange(0, MAX_ROWS))
        );
        assert_eq!(
            ws.set_cell_value_at(1, MAX_COLS + 1, 1.0),
            Err(Error::ColumnOutOfRange(i64::from(MAX_COLS) + 1, MAX_COLS))
        );
        assert!(ws.insert_rows(0, 1).is_err());
        assert!(ws.delete_columns(MAX_COLS, 2).is_err());
    }

    #[test]
    fn test_styles_and_display_text() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(1, 1, 0.25).unwrap();
        ws.set_cell_style_at(1, 1, &Style::new().number_format(NumberFormat::percent()))
            .unwrap();
        assert_eq!(ws.display_text_at(1, 1), "25%");
        assert!(ws.cell_style_at(1, 1).is_some());
        assert!(ws.cell_style_at(2, 1).is_none());
        assert_eq!(ws.display_text_at(2, 1), "");
    }

    #[test]
    fn test_column_insert_shifts_every_store() {
        let mut ws = Worksheet::new("Test");
        let rule = DataValidation::whole_number(ValidationOperator::GreaterThan, "0");
        ws.validations_mut().add(rs("E7:F7"), rule.clone()).unwrap();
        ws.validations_mut().add(rs("A1"), rule.clone()).unwrap();
        ws.validations_mut().add(rs("A3:C3"), rule).unwrap();
        ws.merge_cells(r("E1:F2")).unwrap();
        ws.set_cell_value_at(7, 5, "x").unwrap();

        ws.insert_columns(3, 2).unwrap();

        let ranges: Vec<String> = ws
            .validations()
            .iter()
            .flat_map(|e| e.ranges().iter().map(|r| r.to_a1_string()))
            .collect();
        assert_eq!(ranges, vec!["G7:H7", "A1", "A3:E3"]);
        assert!(ws.has_data_validation(7, 8));
        assert!(!ws.has_data_validation(7, 6));
        assert_eq!(ws.merged_region_at(1, 7), Some(&r("G1:H2")));
        assert_eq!(ws.get_value_at(7, 7).as_string(), Some("x"));
    }

    #[test]
    fn test_row_delete_invalidates_and_notifies() {
        let mut ws = Worksheet::new("Test");
        let rule = DataValidation::list("a,b");
        ws.validations_mut().add(rs("B3:C4"), rule).unwrap();
        let style = ws.intern_style(Style::new().fill_color(Color::YELLOW));
        ws.conditional_formats_mut()
            .add(rs("A1:A10"), ConditionalFormatRule::contains_blanks().with_format(style))
            .unwrap();

        ws.delete_rows(3, 2).unwrap();

        assert!(ws.validations().is_empty());
        assert_eq!(
            ws.conditional_formats().iter().next().unwrap().ranges(),
            &[r("A1:A8")]
        );
        assert_eq!(
            ws.take_notifications(),
            vec![Notification::EntriesInvalidated {
                store: StoreKind::Validations,
                ranges: 1
            }]
        );
        assert!(ws.take_notifications().is_empty());
    }

    #[test]
    fn test_deferred_scope_flushes_once() {
        let mut ws = Worksheet::new("Test");
        ws.add_table("Sales", r("A1:B3"), true).unwrap();
        ws.with_deferred_notifications(|ws| {
            ws.insert_rows(2, 1)?;
            ws.insert_rows(2, 1)?;
            assert!(ws.notifications_deferred());
            assert!(ws.take_notifications().is_empty());
            Ok(())
        })
        .unwrap();
        assert_eq!(
            ws.take_notifications(),
            vec![Notification::TableResized("Sales".into())]
        );
        assert_eq!(ws.tables().get("Sales").unwrap().range(), &r("A1:B5"));
    }

    #[test]
    fn test_totals_row_cannot_overlap_autofilter() {
        let mut ws = Worksheet::new("Test");
        ws.add_table("Sales", r("A1:B3"), true).unwrap();
        ws.set_autofilter(r("A4:C6")).unwrap();

        assert!(matches!(
            ws.set_table_totals_row("Sales", true),
            Err(Error::ConflictingStructure(_))
        ));
        assert!(!ws.tables().get("Sales").unwrap().has_totals());

        ws.clear_autofilter();
        ws.set_table_totals_row("Sales", true).unwrap();
        assert_eq!(ws.tables().get("Sales").unwrap().range(), &r("A1:B4"));
    }

    #[test]
    fn test_deferred_scope_flushes_when_the_body_fails() {
        let mut ws = Worksheet::new("Test");
        ws.add_table("Sales", r("A1:B3"), true).unwrap();
        let result: Result<()> = ws.with_deferred_notifications(|ws| {
            ws.insert_rows(2, 1)?;
            ws.insert_rows(0, 1)
        });
        assert!(matches!(result, Err(Error::RowOutOfRange(..))));
        assert!(!ws.notifications_deferred());
        assert_eq!(
            ws.take_notifications(),
            vec![Notification::TableResized("Sales".into())]
        );
    }

    #[test]
    fn test_autofilter_and_tables_conflict() {
        let mut ws = Worksheet::new("Test");
        ws.add_table("Sales", r("A1:B5"), true).unwrap();
        assert!(matches!(
            ws.set_autofilter(r("B2:D9")),
            Err(Error::ConflictingStructure(_))
        ));
        ws.set_autofilter(r("D1:E9")).unwrap();
        assert!(matches!(
            ws.add_table("Costs", r("E5:F6"), true),
            Err(Error::ConflictingStructure(_))
        ));
        ws.clear_autofilter();
        ws.clear_autofilter();
        assert!(!ws.autofilter().is_enabled());
    }

    #[test]
    fn test_autofilter_reapplied_after_insert() {
        let mut ws = Worksheet::new("People");
        for (i, name) in ["Names", "Manuel", "Carlos", "Dominic"].iter().enumerate() {
            ws.set_cell_value_at(i as i32 + 1, 1, *name).unwrap();
        }
        ws.set_autofilter(r("A1:A4")).unwrap();
        {
            let mut filter = ws.autofilter_mut();
            filter.column(1).unwrap().add_filter("Carlos");
            filter.reapply().unwrap();
        }
        assert_eq!(ws.autofilter().visible_rows(&ws.cells), vec![1, 3]);

        ws.insert_rows(3, 1).unwrap();
        assert_eq!(ws.autofilter().range(), Some(&r("A1:A5")));
        // The new empty row fails the filter and is hidden on flush.
        assert!(ws.is_row_hidden(3));
        assert!(!ws.is_row_hidden(4));
        assert!(ws.take_notifications().contains(&Notification::AutoFilterStale));
    }

    #[test]
    fn test_sort_through_worksheet() {
        let mut ws = Worksheet::new("People");
        for (i, name) in ["Names", "Manuel", "Carlos", "Dominic"].iter().enumerate() {
            ws.set_cell_value_at(i as i32 + 1, 1, *name).unwrap();
        }
        ws.set_autofilter(r("A1:A4")).unwrap();
        ws.autofilter_mut()
            .sort(1, SortOrder::Ascending, false, true)
            .unwrap();
        let names: Vec<String> = (2..=4).map(|row| ws.display_text_at(row, 1)).collect();
        assert_eq!(names, vec!["Carlos", "Dominic", "Manuel"]);
    }

    #[test]
    fn test_sparklines_follow_edits() {
        let mut ws = Worksheet::new("Test");
        let group = ws.sparklines_mut().add_group(SparklineStyle::default());
        ws.sparklines_mut()
            .add(group, Address::new(2, 7), r("A2:F2"))
            .unwrap();
        ws.insert_rows(1, 1).unwrap();
        assert!(ws.has_sparkline(3, 7));
        assert_eq!(ws.sparklines().sparkline_at(3, 7).unwrap().source, r("A3:F3"));

        ws.delete_rows(3, 1).unwrap();
        assert!(ws.sparklines().is_empty());
    }
}
