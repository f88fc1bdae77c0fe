//! Workbook type
//!
//! The workbook owns the sheets, the [`SheetRegistry`] that names them and the
//! workbook-level [`NameStore`]. Structural edits go through the workbook when
//! references on other sheets (names, sparkline sources) must follow them.

use log::debug;

use crate::cell::{Address, FormatOptions, RangeAddress, ReferenceStyle};
use crate::clipboard::Snapshot;
use crate::error::{Error, Result};
use crate::named_range::{NameScope, NameStore};
use crate::notify::{Notification, StoreKind};
use crate::sheet_ref::{SheetId, SheetRef, SheetRegistry};
use crate::shift::Edit;
use crate::store::EntryId;
use crate::worksheet::Worksheet;

/// A workbook containing multiple worksheets
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Worksheets in tab order
    worksheets: Vec<Worksheet>,
    /// Sheet ids and names, including deleted sheets
    sheets: SheetRegistry,
    /// Defined names
    names: NameStore,
    /// Workbook settings
    settings: WorkbookSettings,
    /// Active sheet index
    active_sheet: usize,
}

impl Workbook {
    /// Create a new workbook with one empty sheet named "Sheet1"
    pub fn new() -> Self {
        let mut workbook = Self::empty();
        if let Ok(index) = workbook.add_worksheet() {
            workbook.active_sheet = index;
        }
        workbook
    }

    /// Create an empty workbook with no sheets
    pub fn empty() -> Self {
        Self::with_settings(WorkbookSettings::default())
    }

    /// Create an empty workbook with the given settings
    pub fn with_settings(settings: WorkbookSettings) -> Self {
        Self {
            worksheets: Vec::new(),
            sheets: SheetRegistry::new(),
            names: NameStore::new(),
            settings,
            active_sheet: 0,
        }
    }

    // === Sheets ===

    /// Number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name (case-insensitive)
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.worksheets[i])
    }

    /// Get a mutable worksheet by name (case-insensitive)
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        let index = self.sheet_index(name)?;
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by id
    pub fn worksheet_by_id(&self, id: SheetId) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.id() == Some(id))
    }

    /// Index of the sheet with the given name (case-insensitive)
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let id = self.sheets.id_of(name)?;
        self.worksheets.iter().position(|ws| ws.id() == Some(id))
    }

    /// Id of the sheet at `index`
    pub fn sheet_id(&self, index: usize) -> Result<SheetId> {
        self.worksheets
            .get(index)
            .and_then(Worksheet::id)
            .ok_or_else(|| sheet_not_found(index))
    }

    /// All worksheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// The sheet registry, also the resolver used to render sheet-qualified references
    pub fn sheets(&self) -> &SheetRegistry {
        &self.sheets
    }

    /// Add a worksheet with a generated `SheetN` name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.sheets.generate_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a worksheet with the given name, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        let id = self.sheets.register(name)?;
        let mut sheet = Worksheet::with_id(name, id);
        self.settings.apply_to(&mut sheet);
        self.worksheets.push(sheet);
        debug!("added sheet '{}' as {}", name, id);
        Ok(self.worksheets.len() - 1)
    }

    /// Remove the worksheet at `index`
    ///
    /// Workbook names scoped to the sheet are dropped. References to it held by
    /// other names and by sparkline sources on other sheets keep the sheet's last
    /// name and render as `#REF!A1` until [`Workbook::purge_deleted_sheets`].
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        let id = self.sheet_id(index)?;
        let last_name = self.sheets.remove(id)?;
        let worksheet = self.worksheets.remove(index);

        self.names.sheet_deleted(id, &last_name);
        for other in &mut self.worksheets {
            other
                .sparklines
                .sheet_deleted(|sheet| sheet.denotes(id, None), &last_name);
        }

        if index < self.active_sheet {
            self.active_sheet -= 1;
        }
        self.active_sheet = self.active_sheet.min(self.worksheets.len().saturating_sub(1));
        debug!("removed sheet '{}' ({})", last_name, id);
        Ok(worksheet)
    }

    /// Forget deleted sheets; references to them render as plain `#REF!` afterwards
    pub fn purge_deleted_sheets(&mut self) {
        self.sheets.purge_deleted();
    }

    /// Move a worksheet to a new position
    pub fn move_worksheet(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.worksheets.len() {
            return Err(sheet_not_found(from));
        }
        if to >= self.worksheets.len() {
            return Err(sheet_not_found(to));
        }
        let sheet = self.worksheets.remove(from);
        self.worksheets.insert(to, sheet);
        self.active_sheet = match self.active_sheet {
            active if active == from => to,
            active if from < active && active <= to => active - 1,
            active if to <= active && active < from => active + 1,
            active => active,
        };
        Ok(())
    }

    /// Rename the worksheet at `index`
    ///
    /// References hold sheet ids, so they follow the new name.
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        let id = self.sheet_id(index)?;
        self.sheets.rename(id, new_name)?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Index of the active sheet
    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    /// Set the active sheet
    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(sheet_not_found(index));
        }
        self.active_sheet = index;
        Ok(())
    }

    // === Settings ===

    /// Workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Replace the settings and push them to every sheet
    pub fn set_settings(&mut self, settings: WorkbookSettings) {
        self.settings = settings;
        for sheet in &mut self.worksheets {
            self.settings.apply_to(sheet);
        }
    }

    // === References ===

    /// Parse a range and bind a sheet name in it to the live sheet
    ///
    /// Fails with [`Error::SheetNotFound`] when the named sheet does not exist.
    pub fn parse_range(&self, text: &str) -> Result<RangeAddress> {
        let range = RangeAddress::parse(text)?;
        self.bind(range)
    }

    fn bind(&self, range: RangeAddress) -> Result<RangeAddress> {
        match self.sheets.resolve(range.sheet()) {
            SheetRef::Named(name) => Err(Error::SheetNotFound(name.to_string())),
            resolved => Ok(range.on_sheet(resolved)),
        }
    }

    /// Render a range in the workbook's reference style
    pub fn format_range(&self, range: &RangeAddress, with_sheet: bool) -> String {
        let options = match self.settings.reference_style {
            ReferenceStyle::A1 => FormatOptions::a1(),
            ReferenceStyle::R1C1 => FormatOptions::r1c1(),
        };
        range.format(options.with_sheet(with_sheet), &self.sheets)
    }

    // === Names ===

    /// Define a name from reference text such as `Sheet1!$A$1:$B$4,Sheet2!C3`
    ///
    /// Workbook-scoped names need sheet-qualified ranges. Unqualified ranges of
    /// a sheet-scoped name belong to that sheet.
    pub fn define_name(&mut self, name: &str, refers_to: &str, scope: NameScope) -> Result<EntryId> {
        if let NameScope::Sheet(id) = scope {
            if !self.sheets.is_live(id) {
                return Err(Error::SheetNotFound(id.to_string()));
            }
        }
        let ranges = RangeAddress::parse_list(refers_to)?
            .into_iter()
            .map(|r| self.bind(r))
            .collect::<Result<Vec<_>>>()?;
        self.names.define(name, scope, ranges)
    }

    /// Reference text of a name as seen from `current_sheet`
    pub fn name_refers_to(&self, name: &str, current_sheet: Option<SheetId>) -> Option<String> {
        let entry = self.names.get(name, current_sheet)?;
        Some(self.names.refers_to(entry, &self.sheets))
    }

    /// Defined names
    pub fn names(&self) -> &NameStore {
        &self.names
    }

    /// Mutable defined names
    pub fn names_mut(&mut self) -> &mut NameStore {
        &mut self.names
    }

    // === Structural edits ===

    /// Insert `count` rows before `row` on the sheet at `sheet`
    pub fn insert_rows(&mut self, sheet: usize, row: i32, count: i32) -> Result<()> {
        self.apply_edit(sheet, &Edit::InsertRows { at: row, count })
    }

    /// Delete `count` rows starting at `row` on the sheet at `sheet`
    pub fn delete_rows(&mut self, sheet: usize, row: i32, count: i32) -> Result<()> {
        self.apply_edit(sheet, &Edit::DeleteRows { at: row, count })
    }

    /// Insert `count` columns before `col` on the sheet at `sheet`
    pub fn insert_columns(&mut self, sheet: usize, col: i32, count: i32) -> Result<()> {
        self.apply_edit(sheet, &Edit::InsertColumns { at: col, count })
    }

    /// Delete `count` columns starting at `col` on the sheet at `sheet`
    pub fn delete_columns(&mut self, sheet: usize, col: i32, count: i32) -> Result<()> {
        self.apply_edit(sheet, &Edit::DeleteColumns { at: col, count })
    }

    /// Apply a structural edit to one sheet and every reference to it
    ///
    /// The edited sheet's notifications are delivered once, after its stores
    /// and the names pointing at it have been shifted.
    pub fn apply_edit(&mut self, sheet: usize, edit: &Edit) -> Result<()> {
        edit.validate()?;
        let id = self.sheet_id(sheet)?;
        if edit.count() == 0 {
            return Ok(());
        }

        let names = &mut self.names;
        let worksheet = &mut self.worksheets[sheet];
        worksheet.with_deferred_notifications(|ws| -> Result<()> {
            ws.apply_edit(edit)?;
            let report = names.shift(edit, id);
            if report.is_lossy() {
                ws.notify(Notification::EntriesInvalidated {
                    store: StoreKind::Names,
                    ranges: report.invalidated.len(),
                })?;
            }
            Ok(())
        })?;

        for other in self.worksheets.iter_mut().filter(|ws| ws.id() != Some(id)) {
            let dropped = other
                .sparklines
                .shift_sources(edit, |source| source.denotes(id, None));
            if dropped > 0 {
                other.notify(Notification::EntriesInvalidated {
                    store: StoreKind::Sparklines,
                    ranges: dropped,
                })?;
            }
        }
        debug!("{:?} applied to sheet {} and its references", edit, id);
        Ok(())
    }

    // === Copy / move ===

    /// Copy a range with its annotations from one sheet to another (or the same) sheet
    ///
    /// Returns the destination range.
    pub fn copy_range(
        &mut self,
        source: usize,
        range: &RangeAddress,
        target: usize,
        top_left: &Address,
    ) -> Result<RangeAddress> {
        let snapshot = self.snapshot(source, range)?;
        self.sheet_mut(target)?.paste(&snapshot, top_left)
    }

    /// Move a range with its annotations
    ///
    /// The source cells are cleared and the moved parts are removed from the
    /// source sheet's annotation entries. Nothing changes when the destination
    /// is rejected.
    pub fn move_range(
        &mut self,
        source: usize,
        range: &RangeAddress,
        target: usize,
        top_left: &Address,
    ) -> Result<RangeAddress> {
        let snapshot = self.snapshot(source, range)?;
        let vacated = (source == target).then(|| snapshot.range());
        self.sheet(target)?
            .paste_target(&snapshot, top_left, vacated)?;
        self.worksheets[source].erase_range(snapshot.range());
        self.worksheets[target].paste(&snapshot, top_left)
    }

    /// Copy a whole name into the scope of the sheet at `target`
    ///
    /// Copying a name onto the sheet it is already scoped to is rejected.
    pub fn copy_named_range(&mut self, name: &str, scope: NameScope, target: usize) -> Result<EntryId> {
        let target = self.sheet_id(target)?;
        self.names.copy_to_sheet(name, scope, target)
    }

    /// Copy a whole conditional format (all of its ranges) to another sheet
    ///
    /// The copy gets a fresh id and the lowest priority on the target sheet.
    /// Copying onto the sheet that already holds the format is rejected.
    pub fn copy_conditional_format(
        &mut self,
        source: usize,
        id: EntryId,
        target: usize,
    ) -> Result<EntryId> {
        if source == target {
            return Err(Error::conflict(
                "conditional format already exists on the target sheet",
            ));
        }
        let from = self.sheet(source)?;
        let entry = from
            .conditional_formats()
            .get(id)
            .ok_or(Error::EntryNotFound(id.get()))?;
        let ranges: Vec<_> = entry
            .ranges()
            .iter()
            .filter(|r| r.is_valid())
            .cloned()
            .collect();
        let mut rule = entry.payload().clone();
        let style = rule.format.map(|style| from.style(style).clone());

        let to = self.sheet_mut(target)?;
        rule.format = style.map(|style| to.intern_style(style));
        to.conditional_formats_mut().add(ranges, rule)
    }

    fn snapshot(&self, sheet: usize, range: &RangeAddress) -> Result<Snapshot> {
        let worksheet = self.sheet(sheet)?;
        if !range.sheet().denotes(self.sheet_id(sheet)?, None) && *range.sheet() != SheetRef::Local {
            return Err(Error::InvalidRange(format!(
                "{} does not belong to sheet '{}'",
                self.format_range(range, true),
                worksheet.name()
            )));
        }
        worksheet.snapshot(range)
    }

    fn sheet(&self, index: usize) -> Result<&Worksheet> {
        self.worksheets.get(index).ok_or_else(|| sheet_not_found(index))
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut Worksheet> {
        self.worksheets
            .get_mut(index)
            .ok_or_else(|| sheet_not_found(index))
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

fn sheet_not_found(index: usize) -> Error {
    Error::SheetNotFound(format!("index {}", index))
}

/// Workbook-level settings
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSettings {
    /// Use the 1904 date system when datetimes are compared with numbers
    pub date_1904: bool,
    /// Notation used by [`Workbook::format_range`]
    pub reference_style: ReferenceStyle,
    /// Consolidate validations and conditional formats after a paste
    pub consolidate_on_copy: bool,
}

impl Default for WorkbookSettings {
    fn default() -> Self {
        Self {
            date_1904: false,
            reference_style: ReferenceStyle::A1,
            consolidate_on_copy: true,
        }
    }
}

impl WorkbookSettings {
    fn apply_to(&self, sheet: &mut Worksheet) {
        sheet.date_1904 = self.date_1904;
        sheet.consolidate_on_copy = self.consolidate_on_copy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditional_format::ConditionalFormatRule;
    use crate::sparkline::SparklineStyle;
    use crate::style::{Color, Style};
    use crate::MAX_SHEET_NAME_LEN;
    use pretty_assertions::assert_eq;

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    fn two_sheets() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();
        wb
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.worksheet(0).unwrap().name(), "Sheet1");
        assert!(wb.worksheet(0).unwrap().id().is_some());
    }

    #[test]
    fn test_add_worksheets() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_worksheet().unwrap(), 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Sheet2");
        assert_eq!(wb.add_worksheet_with_name("Data").unwrap(), 2);
        assert_eq!(wb.sheet_index("DATA"), Some(2));
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::new();
        assert!(matches!(
            wb.add_worksheet_with_name("sheet1"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("Sheet/1").is_err());
        assert!(wb.add_worksheet_with_name("Sheet[1]").is_err());
        let long_name = "A".repeat(MAX_SHEET_NAME_LEN + 1);
        assert!(wb.add_worksheet_with_name(&long_name).is_err());
        assert_eq!(wb.sheet_count(), 1);
    }

    #[test]
    fn test_move_and_rename_worksheet() {
        let mut wb = two_sheets();
        wb.add_worksheet_with_name("Summary").unwrap();
        wb.move_worksheet(2, 0).unwrap();
        assert_eq!(wb.worksheet(0).unwrap().name(), "Summary");

        let id = wb.sheet_id(2).unwrap();
        wb.rename_worksheet(2, "Raw Data").unwrap();
        let range = r("A1:B2").on_sheet(SheetRef::Live(id));
        assert_eq!(wb.format_range(&range, true), "'Raw Data'!A1:B2");
        assert!(wb.rename_worksheet(2, "summary").is_err());
    }

    #[test]
    fn test_active_sheet_follows_moves_and_removals() {
        let mut wb = two_sheets();
        wb.add_worksheet_with_name("Summary").unwrap();
        wb.set_active_sheet(1).unwrap();

        wb.move_worksheet(1, 2).unwrap();
        assert_eq!(wb.active_sheet(), 2);
        wb.move_worksheet(0, 2).unwrap();
        assert_eq!(wb.active_sheet(), 1);
        wb.move_worksheet(2, 0).unwrap();
        assert_eq!(wb.active_sheet(), 2);
        let active_name = wb.worksheet(wb.active_sheet()).unwrap().name().to_string();

        wb.remove_worksheet(0).unwrap();
        assert_eq!(wb.active_sheet(), 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), active_name);

        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.active_sheet(), 0);
        wb.remove_worksheet(0).unwrap();
        assert_eq!(wb.active_sheet(), 0);
    }

    #[test]
    fn test_removed_sheet_renders_ref_error() {
        let mut wb = two_sheets();
        wb.define_name("Input", "Data!$A$1:$B$2", NameScope::Workbook)
            .unwrap();
        assert_eq!(
            wb.name_refers_to("Input", None).unwrap(),
            "Data!$A$1:$B$2"
        );

        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.name_refers_to("Input", None).unwrap(), "#REF!$A$1:$B$2");
        wb.purge_deleted_sheets();
        assert_eq!(wb.name_refers_to("Input", None).unwrap(), "#REF!$A$1:$B$2");
    }

    #[test]
    fn test_tombstone_and_purge_for_live_reference() {
        let mut wb = two_sheets();
        let id = wb.sheet_id(1).unwrap();
        let range = r("A1:B2").on_sheet(SheetRef::Live(id));
        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.format_range(&range, true), "#REF!A1:B2");
        wb.purge_deleted_sheets();
        assert_eq!(wb.format_range(&range, true), "#REF!");
    }

    #[test]
    fn test_sheet_scoped_names_go_with_their_sheet() {
        let mut wb = two_sheets();
        let data = wb.sheet_id(1).unwrap();
        wb.define_name("Local", "A1", NameScope::Sheet(data)).unwrap();
        assert!(wb.define_name("Global", "A1", NameScope::Workbook).is_err());
        assert!(matches!(
            wb.define_name("Other", "Missing!A1", NameScope::Workbook),
            Err(Error::SheetNotFound(_))
        ));

        wb.remove_worksheet(1).unwrap();
        assert!(wb.names().is_empty());
    }

    #[test]
    fn test_row_insert_shifts_names_on_edited_sheet_only() {
        let mut wb = two_sheets();
        wb.define_name("Top", "Sheet1!$A$2:$A$4", NameScope::Workbook)
            .unwrap();
        wb.define_name("Side", "Data!$A$2:$A$4", NameScope::Workbook)
            .unwrap();

        wb.insert_rows(0, 3, 2).unwrap();
        assert_eq!(wb.name_refers_to("Top", None).unwrap(), "Sheet1!$A$2:$A$6");
        assert_eq!(wb.name_refers_to("Side", None).unwrap(), "Data!$A$2:$A$4");
    }

    #[test]
    fn test_deleted_name_range_becomes_ref_error() {
        let mut wb = Workbook::new();
        wb.define_name("Gone", "Sheet1!$B$2,Sheet1!$D$2", NameScope::Workbook)
            .unwrap();
        wb.delete_columns(0, 2, 1).unwrap();

        assert_eq!(wb.name_refers_to("Gone", None).unwrap(), "#REF!,Sheet1!$C$2");
        let notes = wb.worksheet_mut(0).unwrap().take_notifications();
        assert!(notes.contains(&Notification::EntriesInvalidated {
            store: StoreKind::Names,
            ranges: 1
        }));
    }

    #[test]
    fn test_out_of_range_edit_changes_nothing() {
        let mut wb = Workbook::new();
        wb.define_name("Top", "Sheet1!$A$2", NameScope::Workbook).unwrap();
        assert!(matches!(
            wb.insert_rows(0, 0, 1),
            Err(Error::RowOutOfRange(_, _))
        ));
        assert!(wb.insert_rows(5, 1, 1).is_err());
        assert_eq!(wb.name_refers_to("Top", None).unwrap(), "Sheet1!$A$2");
    }

    #[test]
    fn test_foreign_sparkline_sources_follow_edits() {
        let mut wb = two_sheets();
        let data = wb.sheet_id(1).unwrap();
        let summary = wb.worksheet_mut(0).unwrap();
        let group = summary.sparklines_mut().add_group(SparklineStyle::default());
        summary
            .sparklines_mut()
            .add(group, Address::new(1, 1), r("B2:B10").on_sheet(SheetRef::Live(data)))
            .unwrap();

        wb.insert_rows(1, 1, 3).unwrap();
        let sparkline = wb.worksheet(0).unwrap().sparklines().sparkline_at(1, 1).unwrap();
        assert_eq!(wb.format_range(&sparkline.source, true), "Data!B5:B13");

        wb.remove_worksheet(1).unwrap();
        let sparkline = wb.worksheet(0).unwrap().sparklines().sparkline_at(1, 1).unwrap();
        assert_eq!(wb.format_range(&sparkline.source, true), "#REF!B5:B13");
    }

    #[test]
    fn test_format_range_uses_reference_style() {
        let mut wb = Workbook::new();
        let id = wb.sheet_id(0).unwrap();
        wb.set_settings(WorkbookSettings {
            reference_style: ReferenceStyle::R1C1,
            ..WorkbookSettings::default()
        });
        let range = r("B3:C4").on_sheet(SheetRef::Live(id));
        assert_eq!(wb.format_range(&range, false), "R3C2:R4C3");
        assert_eq!(wb.format_range(&range, true), "Sheet1!R3C2:R4C3");
    }

    #[test]
    fn test_copy_range_across_sheets() {
        let mut wb = two_sheets();
        wb.worksheet_mut(0).unwrap().set_cell_value("A1", 5.0).unwrap();
        let dest = wb.copy_range(0, &r("A1:B2"), 1, &Address::new(3, 3)).unwrap();
        assert_eq!(dest, r("C3:D4"));
        assert_eq!(wb.worksheet(1).unwrap().get_value_at(3, 3).as_number(), Some(5.0));
        assert_eq!(wb.worksheet(0).unwrap().cell_count(), 1);
    }

    #[test]
    fn test_move_range_clears_source() {
        let mut wb = Workbook::new();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", "x").unwrap();
        let style = sheet.intern_style(Style::new().fill_color(Color::YELLOW));
        sheet
            .conditional_formats_mut()
            .add(vec![r("A1:A4")], ConditionalFormatRule::duplicate_values().with_format(style))
            .unwrap();

        wb.move_range(0, &r("A1:A2"), 0, &Address::new(1, 3)).unwrap();
        let sheet = wb.worksheet(0).unwrap();
        assert!(sheet.cell_at(1, 1).is_none());
        assert_eq!(sheet.get_value_at(1, 3).as_string(), Some("x"));
        assert!(sheet.conditional_formats().rules_at(1, 1).is_empty());
        assert_eq!(sheet.conditional_formats().rules_at(3, 1).len(), 1);
        assert_eq!(sheet.conditional_formats().rules_at(2, 3).len(), 1);
    }

    #[test]
    fn test_move_range_rejected_leaves_source() {
        let mut wb = Workbook::new();
        wb.worksheet_mut(0).unwrap().set_cell_value("A1", 1.0).unwrap();
        let last = Address::new(crate::MAX_ROWS, 1);
        assert!(wb.move_range(0, &r("A1:A2"), 0, &last).is_err());
        assert!(wb.worksheet(0).unwrap().cell_at(1, 1).is_some());
    }

    #[test]
    fn test_copy_named_range() {
        let mut wb = two_sheets();
        let sheet1 = wb.sheet_id(0).unwrap();
        let data = wb.sheet_id(1).unwrap();
        wb.define_name("Block", "$A$1:$B$2,$D$4", NameScope::Sheet(sheet1))
            .unwrap();

        assert!(matches!(
            wb.copy_named_range("Block", NameScope::Sheet(sheet1), 0),
            Err(Error::ConflictingStructure(_))
        ));
        wb.copy_named_range("Block", NameScope::Sheet(sheet1), 1).unwrap();
        assert_eq!(
            wb.name_refers_to("Block", Some(data)).unwrap(),
            "Data!$A$1:$B$2,Data!$D$4"
        );
        assert_eq!(wb.names().len(), 2);
    }

    #[test]
    fn test_copy_conditional_format() {
        let mut wb = two_sheets();
        let sheet = wb.worksheet_mut(0).unwrap();
        let red = sheet.intern_style(Style::new().fill_color(Color::LIGHT_RED));
        let id = sheet
            .conditional_formats_mut()
            .add(
                RangeAddress::parse_list("A1:A5,C1:C5").unwrap(),
                ConditionalFormatRule::cell_is_greater_than("100").with_format(red),
            )
            .unwrap();

        assert!(matches!(
            wb.copy_conditional_format(0, id, 0),
            Err(Error::ConflictingStructure(_))
        ));
        let copy = wb.copy_conditional_format(0, id, 1).unwrap();

        let data = wb.worksheet(1).unwrap();
        let entry = data.conditional_formats().get(copy).unwrap();
        assert_eq!(entry.ranges().len(), 2);
        let style = entry.payload().format.map(|s| data.style(s).clone());
        assert_eq!(style, Some(Style::new().fill_color(Color::LIGHT_RED)));
    }

    #[test]
    fn test_settings_reach_sheets() {
        let mut wb = Workbook::new();
        wb.set_settings(WorkbookSettings {
            date_1904: true,
            ..WorkbookSettings::default()
        });
        wb.add_worksheet().unwrap();
        assert!(wb.worksheets().all(Worksheet::date_1904));
    }
}
