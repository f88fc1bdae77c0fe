//! Copy and paste of worksheet areas
//!
//! A [`Snapshot`] captures the cells of a range together with every annotation
//! that intersects it, clipped to the range. Styles are captured by value so a
//! snapshot can be pasted into a sheet with a different style pool.

use log::{debug, warn};

use crate::cell::{Address, CellData, CellValue, RangeAddress};
use crate::conditional_format::ConditionalFormatRule;
use crate::error::{Error, Result};
use crate::sheet_ref::SheetRef;
use crate::sparkline::SparklineStyle;
use crate::style::Style;
use crate::validation::DataValidation;
use crate::worksheet::Worksheet;
use crate::{MAX_COLS, MAX_ROWS};

/// Copied contents of a worksheet area
#[derive(Debug, Clone)]
pub struct Snapshot {
    range: RangeAddress,
    /// (row offset, column offset, value, style)
    cells: Vec<(i32, i32, CellValue, Style)>,
    validations: Vec<(Vec<RangeAddress>, DataValidation)>,
    conditional_formats: Vec<(Vec<RangeAddress>, ConditionalFormatRule, Option<Style>)>,
    merged: Vec<RangeAddress>,
    sparklines: Vec<(Address, SparklineStyle, RangeAddress)>,
}

impl Snapshot {
    /// Area the snapshot was taken from
    pub fn range(&self) -> &RangeAddress {
        &self.range
    }

    /// Number of captured cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing but empty cells was captured
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
            && self.validations.is_empty()
            && self.conditional_formats.is_empty()
            && self.merged.is_empty()
            && self.sparklines.is_empty()
    }
}

impl Worksheet {
    /// Capture the cells and annotations of `range`
    pub fn snapshot(&self, range: &RangeAddress) -> Result<Snapshot> {
        if !range.is_valid() {
            return Err(Error::InvalidRange(range.to_string()));
        }
        let range = range.clone().on_sheet(SheetRef::Local);
        let (r1, c1) = (range.first.row, range.first.column);

        let cells = self
            .cells
            .iter_range(&range)
            .map(|(row, col, data)| {
                (
                    row - r1,
                    col - c1,
                    data.value.clone(),
                    self.cells.style_pool().resolve(data.style).clone(),
                )
            })
            .collect();

        let conditional_formats = self
            .conditional_formats
            .clip(&range)
            .into_iter()
            .map(|(ranges, rule)| {
                let style = rule.format.map(|id| self.style(id).clone());
                (ranges, rule, style)
            })
            .collect();

        Ok(Snapshot {
            cells,
            validations: self.validations.clip(&range),
            conditional_formats,
            merged: self.merged.regions_within(&range).cloned().collect(),
            sparklines: self.sparklines.clip(&range),
            range,
        })
    }

    /// Paste a snapshot with its top-left corner at `top_left`
    ///
    /// Existing cells and annotations of the destination area are replaced. Data
    /// validations and conditional formats touching the destination are then
    /// consolidated unless disabled in the workbook settings. Returns the
    /// destination range.
    pub fn paste(&mut self, snapshot: &Snapshot, top_left: &Address) -> Result<RangeAddress> {
        let from = &snapshot.range.first;
        let dest = self.paste_target(snapshot, top_left, None)?;

        self.cells.clear_range(&dest);
        for (dr, dc, value, style) in &snapshot.cells {
            let style = self.intern_style(style.clone());
            self.cells.set(
                dest.first.row + dr,
                dest.first.column + dc,
                CellData::with_style(value.clone(), style),
            );
        }

        self.validations.clear_range(&dest);
        for (ranges, rule) in &snapshot.validations {
            let moved = rebase_all(ranges, from, top_left);
            if !moved.is_empty() {
                self.validations.add(moved, rule.clone())?;
            }
        }

        self.conditional_formats.clear_range(&dest);
        for (ranges, rule, style) in &snapshot.conditional_formats {
            let moved = rebase_all(ranges, from, top_left);
            if moved.is_empty() {
                continue;
            }
            let mut rule = rule.clone();
            rule.format = style.clone().map(|s| self.intern_style(s));
            self.conditional_formats.add(moved, rule)?;
        }

        if self.consolidate_on_copy {
            self.validations.consolidate_touching(&dest);
            self.conditional_formats.consolidate_touching(&dest);
        }

        self.merged.unmerge_intersecting(&dest);
        for region in &snapshot.merged {
            if let Some(moved) = region.rebase(from, top_left) {
                self.merged.merge(moved)?;
            }
        }

        self.sparklines.clear_range(&dest);
        for (location, style, source) in &snapshot.sparklines {
            let Some(location) = location.offset(top_left.row - from.row, top_left.column - from.column)
            else {
                continue;
            };
            let source = if *source.sheet() == SheetRef::Local {
                match source.rebase(from, top_left) {
                    Some(moved) => moved,
                    None => {
                        warn!(
                            "sparkline source {} falls off the sheet when pasted at {}",
                            source, top_left
                        );
                        continue;
                    }
                }
            } else {
                source.clone()
            };
            let group = self.sparklines.find_or_add_group(style);
            self.sparklines.add(group, location, source)?;
        }

        debug!(
            "{}: pasted {} cells from {} into {}",
            self.name(),
            snapshot.cells.len(),
            snapshot.range,
            dest
        );
        Ok(dest)
    }

    /// Destination of pasting `snapshot` at `top_left`, checked against the grid and merged regions
    ///
    /// Merged regions intersecting `vacated` are about to be erased and do not conflict.
    pub(crate) fn paste_target(
        &self,
        snapshot: &Snapshot,
        top_left: &Address,
        vacated: Option<&RangeAddress>,
    ) -> Result<RangeAddress> {
        let dest = snapshot
            .range
            .rebase(&snapshot.range.first, top_left)
            .ok_or_else(|| out_of_grid(&snapshot.range, top_left))?;
        if let Some(region) = self.merged.iter().find(|r| {
            r.intersects(&dest)
                && !dest.contains_range(r)
                && !vacated.is_some_and(|v| r.intersects(v))
        })
        {
            return Err(Error::conflict(format!(
                "cannot paste over part of merged region {}",
                region.to_a1_string()
            )));
        }
        Ok(dest)
    }

    /// Remove the cells and every annotation from `range`
    pub fn erase_range(&mut self, range: &RangeAddress) {
        self.cells.clear_range(range);
        self.validations.clear_range(range);
        self.conditional_formats.clear_range(range);
        self.merged.unmerge_intersecting(range);
        self.sparklines.clear_range(range);
    }
}

fn rebase_all(ranges: &[RangeAddress], from: &Address, to: &Address) -> Vec<RangeAddress> {
    ranges.iter().filter_map(|r| r.rebase(from, to)).collect()
}

fn out_of_grid(range: &RangeAddress, top_left: &Address) -> Error {
    let last_row = i64::from(top_left.row) + i64::from(range.row_count()) - 1;
    if top_left.row < 1 || last_row > i64::from(MAX_ROWS) {
        Error::RowOutOfRange(last_row.max(i64::from(top_left.row)), MAX_ROWS)
    } else {
        let last_col = i64::from(top_left.column) + i64::from(range.column_count()) - 1;
        Error::ColumnOutOfRange(last_col.max(i64::from(top_left.column)), MAX_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, NumberFormat};
    use crate::validation::ValidationOperator;
    use pretty_assertions::assert_eq;

    fn r(text: &str) -> RangeAddress {
        RangeAddress::parse(text).unwrap()
    }

    fn rs(text: &str) -> Vec<RangeAddress> {
        RangeAddress::parse_list(text).unwrap()
    }

    fn ranges_text(ranges: &[RangeAddress]) -> String {
        RangeAddress::format_list(ranges, crate::cell::FormatOptions::a1(), &crate::sheet_ref::NoSheets)
    }

    #[test]
    fn test_copy_cells_with_styles_across_sheets() {
        let mut src = Worksheet::new("Src");
        src.set_cell_value_at(1, 1, 1234.25).unwrap();
        src.set_cell_style_at(1, 1, &Style::new().number_format(NumberFormat::thousands()))
            .unwrap();
        src.set_cell_value_at(2, 2, "text").unwrap();

        let snapshot = src.snapshot(&r("A1:B2")).unwrap();
        assert_eq!(snapshot.cell_count(), 2);

        let mut dst = Worksheet::new("Dst");
        let dest = dst.paste(&snapshot, &Address::new(5, 3)).unwrap();
        assert_eq!(dest, r("C5:D6"));
        assert_eq!(dst.display_text_at(5, 3), "1,234");
        assert_eq!(dst.get_value_at(6, 4).as_string(), Some("text"));
    }

    #[test]
    fn test_paste_merges_into_adjacent_format() {
        let mut ws = Worksheet::new("Test");
        let style = ws.intern_style(Style::new().fill_color(Color::LIGHT_GREEN));
        let rule = ConditionalFormatRule::cell_is_greater_than("10").with_format(style);
        ws.conditional_formats_mut().add(rs("B2:C3"), rule).unwrap();

        let snapshot = ws.snapshot(&r("B3:C3")).unwrap();
        ws.paste(&snapshot, &Address::new(4, 2)).unwrap();

        assert_eq!(ws.conditional_formats().len(), 1);
        let entry = ws.conditional_formats().iter().next().unwrap();
        assert_eq!(ranges_text(entry.ranges()), "B2:C4");
    }

    #[test]
    fn test_paste_leaves_distant_equal_rules_alone() {
        let mut ws = Worksheet::new("Test");
        let pick = DataValidation::list("x");
        let yes_no = DataValidation::list("Yes,No");
        let source = ws.validations_mut().add(rs("A1"), pick).unwrap();
        let k1 = ws.validations_mut().add(rs("K1"), yes_no.clone()).unwrap();
        let k2 = ws.validations_mut().add(rs("K2"), yes_no).unwrap();

        let snapshot = ws.snapshot(&r("A1")).unwrap();
        ws.paste(&snapshot, &Address::new(2, 1)).unwrap();

        let validations = ws.validations();
        assert_eq!(validations.len(), 3);
        assert_eq!(validations.ranges(source).unwrap(), &rs("A1:A2")[..]);
        assert_eq!(validations.ranges(k1).unwrap(), &rs("K1")[..]);
        assert_eq!(validations.ranges(k2).unwrap(), &rs("K2")[..]);
    }

    #[test]
    fn test_paste_replaces_destination_validations() {
        let mut ws = Worksheet::new("Test");
        let positive = DataValidation::decimal(ValidationOperator::GreaterThan, "0");
        let list = DataValidation::list("a,b");
        ws.validations_mut().add(rs("A1:A2"), positive.clone()).unwrap();
        ws.validations_mut().add(rs("C1:C4"), list.clone()).unwrap();

        let snapshot = ws.snapshot(&r("A1:A2")).unwrap();
        ws.paste(&snapshot, &Address::new(2, 3)).unwrap();

        assert_eq!(ws.data_validation_at(1, 3), Some(&list));
        assert_eq!(ws.data_validation_at(2, 3), Some(&positive));
        assert_eq!(ws.data_validation_at(3, 3), Some(&positive));
        assert_eq!(ws.data_validation_at(4, 3), Some(&list));
    }

    #[test]
    fn test_paste_out_of_grid_is_rejected() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(1, 1, 1.0).unwrap();
        let snapshot = ws.snapshot(&r("A1:A3")).unwrap();
        assert!(matches!(
            ws.paste(&snapshot, &Address::new(MAX_ROWS - 1, 1)),
            Err(Error::RowOutOfRange(_, _))
        ));
        assert_eq!(ws.cell_count(), 1);
    }

    #[test]
    fn test_paste_over_partial_merge_conflicts() {
        let mut ws = Worksheet::new("Test");
        ws.merge_cells(r("D1:E2")).unwrap();
        let snapshot = ws.snapshot(&r("A1:A2")).unwrap();
        assert!(matches!(
            ws.paste(&snapshot, &Address::new(1, 4)),
            Err(Error::ConflictingStructure(_))
        ));
    }

    #[test]
    fn test_merged_regions_and_sparklines_are_copied() {
        let mut ws = Worksheet::new("Test");
        ws.merge_cells(r("A1:B1")).unwrap();
        let group = ws.sparklines_mut().add_group(SparklineStyle::default());
        ws.sparklines_mut()
            .add(group, Address::new(2, 1), r("C2:F2"))
            .unwrap();

        let snapshot = ws.snapshot(&r("A1:B2")).unwrap();
        ws.paste(&snapshot, &Address::new(10, 1)).unwrap();

        assert_eq!(ws.merged_region_at(10, 2), Some(&r("A10:B10")));
        assert_eq!(ws.sparklines().sparkline_at(11, 1).unwrap().source, r("C11:F11"));
        assert_eq!(ws.sparklines().groups().len(), 1);
    }

    #[test]
    fn test_erase_range() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(1, 1, 1.0).unwrap();
        ws.validations_mut()
            .add(rs("A1:A4"), DataValidation::list("x"))
            .unwrap();
        ws.erase_range(&r("A1:A2"));
        assert_eq!(ws.cell_count(), 0);
        assert!(!ws.has_data_validation(2, 1));
        assert!(ws.has_data_validation(3, 1));
    }
}
