//! Merged cell regions

use log::trace;

use crate::cell::RangeAddress;
use crate::error::{Error, Result};
use crate::shift::{shift, Edit, RangeOutcome};

/// Non-overlapping merged regions of one worksheet
#[derive(Debug, Clone, Default)]
pub struct MergedRegions {
    regions: Vec<RangeAddress>,
}

impl MergedRegions {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a range
    ///
    /// Fails with [`Error::ConflictingStructure`] when the range overlaps an
    /// existing region, and with [`Error::InvalidRange`] for single cells.
    pub fn merge(&mut self, range: RangeAddress) -> Result<()> {
        if !range.is_valid() {
            return Err(Error::InvalidRange(range.to_string()));
        }
        if range.is_single_cell() {
            return Err(Error::InvalidRange(format!(
                "{} is a single cell",
                range.to_a1_string()
            )));
        }
        if let Some(existing) = self.regions.iter().find(|r| r.intersects(&range)) {
            return Err(Error::conflict(format!(
                "{} overlaps merged region {}",
                range.to_a1_string(),
                existing.to_a1_string()
            )));
        }
        self.regions.push(range);
        Ok(())
    }

    /// Unmerge the region exactly matching `range`; returns whether one was found
    pub fn unmerge(&mut self, range: &RangeAddress) -> bool {
        let before = self.regions.len();
        self.regions
            .retain(|r| !(r.first.row == range.first.row
                && r.first.column == range.first.column
                && r.last.row == range.last.row
                && r.last.column == range.last.column));
        before != self.regions.len()
    }

    /// Unmerge every region intersecting `range`
    pub fn unmerge_intersecting(&mut self, range: &RangeAddress) -> usize {
        let before = self.regions.len();
        self.regions.retain(|r| !r.intersects(range));
        before - self.regions.len()
    }

    /// Region containing the cell
    pub fn merged_region_at(&self, row: i32, column: i32) -> Option<&RangeAddress> {
        self.regions.iter().find(|r| r.contains(row, column))
    }

    /// Regions lying inside `range`
    pub fn regions_within<'a>(
        &'a self,
        range: &'a RangeAddress,
    ) -> impl Iterator<Item = &'a RangeAddress> + 'a {
        self.regions.iter().filter(move |r| range.contains_range(r))
    }

    /// All regions
    pub fn iter(&self) -> impl Iterator<Item = &RangeAddress> {
        self.regions.iter()
    }

    /// Number of regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether there are no regions
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Apply a structural edit; returns the regions that were dropped
    ///
    /// Regions are dropped when invalidated or when they shrink to one cell.
    pub(crate) fn shift(&mut self, edit: &Edit) -> Vec<RangeAddress> {
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.regions.len());
        for region in self.regions.drain(..) {
            match shift(&region, edit) {
                RangeOutcome::Unchanged => kept.push(region),
                RangeOutcome::Moved(r) => kept.push(r),
                RangeOutcome::Truncated(r) if !r.is_single_cell() => kept.push(r),
                RangeOutcome::Truncated(_) | RangeOutcome::Invalidated => {
                    trace!("{:?}: merged region {} dropped", edit, region);
                    dropped.push(region);
                }
            }
        }
        self.regions = kept;
        dropped
    }
}
