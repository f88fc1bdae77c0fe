//! Sparkline groups
//!
//! A sparkline is a tiny chart drawn inside one cell (its *location*) from a
//! one-row or one-column *source* range. Sparklines belong to a group sharing one
//! [`SparklineStyle`]. The source may live on another sheet.
//!
//! Locations are kept in a split-mode [`RangeStore`], so adding a sparkline at an
//! occupied location replaces the old one.

use log::warn;

use crate::cell::{Address, RangeAddress};
use crate::error::{Error, Result};
use crate::sheet_ref::SheetRef;
use crate::shift::{shift, Edit, RangeOutcome};
use crate::store::{Annotation, Entry, EntryId, OverlapMode, RangeStore};
use crate::style::Color;

/// Chart type of a sparkline group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SparklineKind {
    #[default]
    Line,
    Column,
    WinLoss,
}

/// Look shared by every sparkline of a group
#[derive(Debug, Clone, PartialEq)]
pub struct SparklineStyle {
    pub kind: SparklineKind,
    pub color: Color,
    /// Color of negative points, if highlighted
    pub negative_color: Option<Color>,
    pub show_markers: bool,
    /// Line width in points (line sparklines only)
    pub line_weight: f64,
}

impl SparklineStyle {
    /// Style of the given kind with default colors
    pub fn new(kind: SparklineKind) -> Self {
        Self {
            kind,
            color: Color::rgb(0x37, 0x60, 0x92),
            negative_color: None,
            show_markers: false,
            line_weight: 0.75,
        }
    }

    /// Set the series color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Highlight negative points
    pub fn with_negative_color(mut self, color: Color) -> Self {
        self.negative_color = Some(color);
        self
    }

    /// Show point markers
    pub fn with_markers(mut self, show: bool) -> Self {
        self.show_markers = show;
        self
    }
}

impl Default for SparklineStyle {
    fn default() -> Self {
        Self::new(SparklineKind::Line)
    }
}

/// Handle to a sparkline group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SparklineGroupId(u32);

/// A group of sparklines sharing a style
#[derive(Debug, Clone, PartialEq)]
pub struct SparklineGroup {
    id: SparklineGroupId,
    pub style: SparklineStyle,
}

impl SparklineGroup {
    /// Group handle
    pub fn id(&self) -> SparklineGroupId {
        self.id
    }
}

/// Store payload: the group and the data source of the sparkline at a location
#[derive(Debug, Clone, PartialEq)]
pub struct Sparkline {
    pub group: SparklineGroupId,
    pub source: RangeAddress,
}

impl Annotation for Sparkline {}

/// Every sparkline of one worksheet
#[derive(Debug, Clone)]
pub struct SparklineStore {
    groups: Vec<SparklineGroup>,
    next_group: u32,
    locations: RangeStore<Sparkline>,
}

impl Default for SparklineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SparklineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            next_group: 0,
            locations: RangeStore::new(OverlapMode::Split),
        }
    }

    /// Create a group
    pub fn add_group(&mut self, style: SparklineStyle) -> SparklineGroupId {
        let id = SparklineGroupId(self.next_group);
        self.next_group += 1;
        self.groups.push(SparklineGroup { id, style });
        id
    }

    /// Group with exactly this style, created if missing
    pub fn find_or_add_group(&mut self, style: &SparklineStyle) -> SparklineGroupId {
        match self.groups.iter().find(|g| &g.style == style) {
            Some(group) => group.id,
            None => self.add_group(style.clone()),
        }
    }

    /// Look up a group
    pub fn group(&self, id: SparklineGroupId) -> Option<&SparklineGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Look up a group mutably
    pub fn group_mut(&mut self, id: SparklineGroupId) -> Option<&mut SparklineGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// All groups
    pub fn groups(&self) -> &[SparklineGroup] {
        &self.groups
    }

    /// Remove a group and its sparklines
    pub fn remove_group(&mut self, id: SparklineGroupId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        self.locations.retain(|e| e.payload().group != id);
        before != self.groups.len()
    }

    /// Add a sparkline drawn at `location` from `source`
    ///
    /// A sparkline already at `location` is replaced. The source must be a
    /// valid single row or single column.
    pub fn add(
        &mut self,
        group: SparklineGroupId,
        location: Address,
        source: RangeAddress,
    ) -> Result<EntryId> {
        if self.group(group).is_none() {
            return Err(Error::EntryNotFound(group.0));
        }
        if !location.is_valid() {
            return Err(Error::InvalidRange(location.to_string()));
        }
        if !source.is_valid() || !source.is_linear() {
            return Err(Error::InvalidRange(format!(
                "sparkline source {} must be one row or one column",
                source
            )));
        }
        let cell = RangeAddress::from_coords(location.row, location.column, location.row, location.column);
        self.locations.add(vec![cell], Sparkline { group, source })
    }

    /// Sparkline drawn in the cell
    pub fn sparkline_at(&self, row: i32, column: i32) -> Option<&Sparkline> {
        self.locations.entry_at(row, column).map(|e| e.payload())
    }

    /// Whether the cell holds a sparkline
    pub fn has_sparkline(&self, row: i32, column: i32) -> bool {
        self.locations.entry_at(row, column).is_some()
    }

    /// Remove the sparkline in the cell
    pub fn remove_at(&mut self, row: i32, column: i32) -> bool {
        match self.locations.entry_at(row, column).map(|e| e.id()) {
            Some(id) => self.locations.remove(id).is_some(),
            None => false,
        }
    }

    /// Remove every sparkline located in `range`
    pub fn clear_range(&mut self, range: &RangeAddress) {
        self.locations.clear_range(range);
    }

    /// Locations and sparklines of one group
    pub fn sparklines_in_group(
        &self,
        group: SparklineGroupId,
    ) -> impl Iterator<Item = (Address, &Sparkline)> {
        self.locations
            .iter()
            .filter(move |e| e.payload().group == group)
            .filter_map(|e| e.ranges().first().map(|r| (r.first.clone(), e.payload())))
    }

    /// Every sparkline entry
    pub fn iter(&self) -> impl Iterator<Item = &Entry<Sparkline>> {
        self.locations.iter()
    }

    /// Number of sparklines
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether there are no sparklines
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Sparklines located in `range` with their group style
    pub(crate) fn clip(&self, range: &RangeAddress) -> Vec<(Address, SparklineStyle, RangeAddress)> {
        self.locations
            .iter()
            .filter(|e| e.intersects(range))
            .filter_map(|e| {
                let style = self.group(e.payload().group)?.style.clone();
                let location = e.ranges().first()?.first.clone();
                Some((location, style, e.payload().source.clone()))
            })
            .collect()
    }

    /// Apply an edit made to this store's own sheet
    ///
    /// Locations shift with the edit; sources for which `on_edited_sheet` holds
    /// shift too. Returns the number of sparklines discarded.
    pub(crate) fn shift<F>(&mut self, edit: &Edit, on_edited_sheet: F) -> usize
    where
        F: Fn(&SheetRef) -> bool,
    {
        let report = self.locations.shift_all(edit);
        for (_, sparkline) in &report.removed {
            warn!(
                "{:?}: sparkline location invalidated, dropping sparkline over {}",
                edit, sparkline.source
            );
        }
        report.removed.len() + self.shift_sources(edit, on_edited_sheet)
    }

    /// Shift the sources for which `on_edited_sheet` holds
    ///
    /// Used directly by the workbook for sparklines whose source lives on
    /// another sheet than their location.
    pub(crate) fn shift_sources<F>(&mut self, edit: &Edit, on_edited_sheet: F) -> usize
    where
        F: Fn(&SheetRef) -> bool,
    {
        let mut doomed = Vec::new();
        for entry in self.locations.iter_mut() {
            let source = &entry.payload().source;
            if !on_edited_sheet(source.sheet()) {
                continue;
            }
            let shifted = match shift(source, edit) {
                RangeOutcome::Unchanged => continue,
                RangeOutcome::Moved(r) | RangeOutcome::Truncated(r) => r,
                RangeOutcome::Invalidated => {
                    warn!(
                        "{:?}: sparkline source {} invalidated, dropping sparkline",
                        edit, source
                    );
                    doomed.push(entry.id());
                    continue;
                }
            };
            entry.payload_mut().source = shifted;
        }
        for id in &doomed {
            self.locations.remove(*id);
        }
        doomed.len()
    }

    /// Re-point sources on a deleted sheet at its tombstone
    pub(crate) fn sheet_deleted<F>(&mut self, on_deleted_sheet: F, last_name: &str)
    where
        F: Fn(&SheetRef) -> bool,
    {
        for entry in self.locations.iter_mut() {
            if on_deleted_sheet(entry.payload().source.sheet()) {
                let source = entry.payload().source.clone();
                entry.payload_mut().source = source.on_sheet(SheetRef::deleted(last_name));
            }
        }
    }
}
