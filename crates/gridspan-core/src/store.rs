//! Range-indexed annotation store
//!
//! [`RangeStore`] maps sets of rectangular ranges to payloads. Every feature that
//! attaches something to an area of a sheet (validations, conditional formats,
//! names, sparklines) is a thin wrapper around one of these.
//!
//! Entries are kept in priority order: the first entry wins a point lookup and
//! intersecting lookups return entries in store order. Callers hold [`EntryId`]
//! handles; splitting or removing one entry never disturbs another entry's id.

use log::trace;

use crate::cell::{Address, RangeAddress};
use crate::error::{Error, Result};
use crate::shift::{shift, Edit, RangeOutcome};

/// Payload stored in a [`RangeStore`]
///
/// `same_payload` decides whether two entries may be consolidated. It compares
/// payloads only, never ranges; wrappers override it to ignore bookkeeping fields
/// such as priorities.
pub trait Annotation: Clone + PartialEq {
    /// Whether two payloads are interchangeable for consolidation
    fn same_payload(&self, other: &Self) -> bool {
        self == other
    }
}

/// Stable handle to a store entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    /// Raw id value
    pub fn get(self) -> u32 {
        self.0
    }
}

/// How a new range treats existing entries it overlaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMode {
    /// Existing entries are split around the new range; no cell is covered twice
    #[default]
    Split,
    /// Entries may overlap; store order decides precedence
    Overlap,
}

/// What happens to a range invalidated by a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationPolicy {
    /// Remove the range; an entry without ranges is destroyed
    #[default]
    Drop,
    /// Keep the range marked invalid so it renders as `#REF!`
    Keep,
}

/// One annotation: its ranges and payload
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    id: EntryId,
    ranges: Vec<RangeAddress>,
    payload: T,
}

impl<T> Entry<T> {
    /// Entry handle
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Ranges covered by this entry
    pub fn ranges(&self) -> &[RangeAddress] {
        &self.ranges
    }

    /// Payload
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Mutable payload
    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Whether any valid range of this entry contains the cell
    pub fn covers(&self, row: i32, column: i32) -> bool {
        self.ranges
            .iter()
            .any(|r| r.is_valid() && r.contains(row, column))
    }

    /// Whether any valid range of this entry intersects `range`
    pub fn intersects(&self, range: &RangeAddress) -> bool {
        self.ranges
            .iter()
            .any(|r| r.is_valid() && r.intersects(range))
    }

    pub(crate) fn ranges_mut(&mut self) -> &mut Vec<RangeAddress> {
        &mut self.ranges
    }
}

/// Result of applying an edit to a whole store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftReport<T> {
    /// Entries destroyed because none of their ranges survived
    pub removed: Vec<(EntryId, T)>,
    /// Ranges invalidated by the edit, as they were before it
    pub invalidated: Vec<RangeAddress>,
    /// Number of ranges that lost cells
    pub truncated: usize,
}

impl<T> ShiftReport<T> {
    /// Whether the edit removed or invalidated anything
    pub fn is_lossy(&self) -> bool {
        !self.removed.is_empty() || !self.invalidated.is_empty()
    }
}

/// Ordered collection of range-scoped annotations
#[derive(Debug, Clone)]
pub struct RangeStore<T> {
    entries: Vec<Entry<T>>,
    next_id: u32,
    mode: OverlapMode,
    policy: InvalidationPolicy,
}

impl<T: Annotation> Default for RangeStore<T> {
    fn default() -> Self {
        Self::new(OverlapMode::Split)
    }
}

impl<T: Annotation> RangeStore<T> {
    /// Create an empty store
    pub fn new(mode: OverlapMode) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            mode,
            policy: InvalidationPolicy::Drop,
        }
    }

    /// Set the invalidation policy
    pub fn with_policy(mut self, policy: InvalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overlap mode
    pub fn mode(&self) -> OverlapMode {
        self.mode
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter()
    }

    /// Iterate entries mutably in priority order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entry<T>> {
        self.entries.iter_mut()
    }

    /// Look up an entry
    pub fn get(&self, id: EntryId) -> Option<&Entry<T>> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Look up an entry mutably
    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut Entry<T>> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    /// Position of an entry in priority order
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Add a new entry covering `ranges`
    ///
    /// In [`OverlapMode::Split`] every existing entry overlapping one of the new
    /// ranges is split around it first, so the new entry owns those cells alone.
    pub fn add(&mut self, ranges: Vec<RangeAddress>, payload: T) -> Result<EntryId> {
        check_ranges(&ranges)?;
        if self.mode == OverlapMode::Split {
            for range in &ranges {
                self.carve(range, None);
            }
        }
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            ranges,
            payload,
        });
        Ok(id)
    }

    /// Add one more range to an existing entry
    pub fn add_range(&mut self, id: EntryId, range: RangeAddress) -> Result<()> {
        check_ranges(std::slice::from_ref(&range))?;
        if self.get(id).is_none() {
            return Err(Error::EntryNotFound(id.0));
        }
        if self.mode == OverlapMode::Split {
            self.carve(&range, Some(id));
        }
        if let Some(entry) = self.get_mut(id) {
            entry.ranges.push(range);
        }
        Ok(())
    }

    /// Replace an entry's payload
    pub fn set_payload(&mut self, id: EntryId, payload: T) -> Result<()> {
        let entry = self.get_mut(id).ok_or(Error::EntryNotFound(id.0))?;
        entry.payload = payload;
        Ok(())
    }

    /// Remove `range` from one entry; the entry is destroyed when nothing is left
    pub fn remove_range(&mut self, id: EntryId, range: &RangeAddress) -> Result<()> {
        let pos = self.position(id).ok_or(Error::EntryNotFound(id.0))?;
        let entry = &mut self.entries[pos];
        entry.ranges = entry
            .ranges
            .iter()
            .flat_map(|r| r.subtract(range))
            .collect();
        if entry.ranges.is_empty() {
            self.entries.remove(pos);
        }
        Ok(())
    }

    /// Remove `range` from every entry
    pub fn clear_range(&mut self, range: &RangeAddress) {
        self.carve(range, None);
    }

    /// Remove an entry
    pub fn remove(&mut self, id: EntryId) -> Option<T> {
        let pos = self.position(id)?;
        Some(self.entries.remove(pos).payload)
    }

    /// Keep only the entries matching the predicate
    pub fn retain<F: FnMut(&Entry<T>) -> bool>(&mut self, f: F) {
        self.entries.retain(f);
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Payload of the first entry covering the address
    pub fn find_covering(&self, addr: &Address) -> Option<&T> {
        self.entry_at(addr.row, addr.column).map(|e| &e.payload)
    }

    /// First entry covering the cell
    pub fn entry_at(&self, row: i32, column: i32) -> Option<&Entry<T>> {
        self.entries.iter().find(|e| e.covers(row, column))
    }

    /// Every entry covering the cell, in priority order
    pub fn entries_at(&self, row: i32, column: i32) -> Vec<&Entry<T>> {
        self.entries.iter().filter(|e| e.covers(row, column)).collect()
    }

    /// Payloads of every entry intersecting `range`, in priority order
    pub fn find_intersecting(&self, range: &RangeAddress) -> Vec<&T> {
        self.entries_intersecting(range)
            .into_iter()
            .map(|e| &e.payload)
            .collect()
    }

    /// Every entry intersecting `range`, in priority order
    pub fn entries_intersecting(&self, range: &RangeAddress) -> Vec<&Entry<T>> {
        self.entries.iter().filter(|e| e.intersects(range)).collect()
    }

    /// Entries intersecting `range`, with their ranges clipped to it
    pub fn clip(&self, range: &RangeAddress) -> Vec<(Vec<RangeAddress>, T)> {
        self.entries
            .iter()
            .filter_map(|e| {
                let parts: Vec<_> = e
                    .ranges
                    .iter()
                    .filter(|r| r.is_valid())
                    .filter_map(|r| r.intersection(range))
                    .collect();
                (!parts.is_empty()).then(|| (parts, e.payload.clone()))
            })
            .collect()
    }

    /// Merge entries with equal payloads whose ranges touch
    ///
    /// Two entries merge when their payloads are the same and some range of one
    /// overlaps, contains or shares a full edge with some range of the other. The
    /// merged entry keeps the id and position of whichever was added first; the
    /// other entries keep their relative order. Within an entry, ranges are
    /// combined only where the result is still exactly a rectangle, so the covered
    /// cells never change.
    pub fn consolidate(&mut self) {
        self.consolidate_where(|_| true);
    }

    /// Like [`consolidate`](Self::consolidate), restricted to merges involving an
    /// entry that overlaps or borders `area`
    ///
    /// Equal entries elsewhere in the store stay separate.
    pub fn consolidate_touching(&mut self, area: &RangeAddress) {
        let area = std::slice::from_ref(area);
        self.consolidate_where(|ranges| touches(ranges, area));
    }

    fn consolidate_where<F>(&mut self, involved: F)
    where
        F: Fn(&[RangeAddress]) -> bool,
    {
        for entry in &mut self.entries {
            if involved(&entry.ranges) {
                normalize_ranges(&mut entry.ranges);
            }
        }

        'restart: loop {
            for i in 0..self.entries.len() {
                for j in (i + 1)..self.entries.len() {
                    let (a, b) = (&self.entries[i], &self.entries[j]);
                    let mergeable = (involved(&a.ranges) || involved(&b.ranges))
                        && a.payload.same_payload(&b.payload)
                        && touches(&a.ranges, &b.ranges);
                    if mergeable {
                        let later = self.entries.remove(j);
                        let earlier = &mut self.entries[i];
                        earlier.ranges.extend(later.ranges);
                        normalize_ranges(&mut earlier.ranges);
                        continue 'restart;
                    }
                }
            }
            break;
        }
    }

    /// Apply a structural edit to every range in the store
    pub fn shift_all(&mut self, edit: &Edit) -> ShiftReport<T> {
        self.shift_matching(edit, |_| true)
    }

    /// Apply a structural edit to the ranges selected by `filter`
    ///
    /// Used by stores holding ranges from several sheets, which shift only the
    /// ranges on the edited sheet.
    pub fn shift_matching<F>(&mut self, edit: &Edit, filter: F) -> ShiftReport<T>
    where
        F: Fn(&RangeAddress) -> bool,
    {
        let mut report = ShiftReport {
            removed: Vec::new(),
            invalidated: Vec::new(),
            truncated: 0,
        };
        let policy = self.policy;

        for entry in &mut self.entries {
            let mut kept = Vec::with_capacity(entry.ranges.len());
            for range in entry.ranges.drain(..) {
                if !filter(&range) {
                    kept.push(range);
                    continue;
                }
                match shift(&range, edit) {
                    RangeOutcome::Unchanged => kept.push(range),
                    RangeOutcome::Moved(r) => kept.push(r),
                    RangeOutcome::Truncated(r) => {
                        report.truncated += 1;
                        kept.push(r);
                    }
                    RangeOutcome::Invalidated => {
                        trace!("{:?}: range {} invalidated", edit, range);
                        if policy == InvalidationPolicy::Keep {
                            kept.push(range.invalidated());
                        }
                        report.invalidated.push(range);
                    }
                }
            }
            entry.ranges = kept;
        }

        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].ranges.is_empty() {
                let entry = self.entries.remove(i);
                report.removed.push((entry.id, entry.payload));
            } else {
                i += 1;
            }
        }
        report
    }

    /// Split every entry (other than `keep`) around `range`
    fn carve(&mut self, range: &RangeAddress, keep: Option<EntryId>) {
        for entry in &mut self.entries {
            if Some(entry.id) == keep || !entry.intersects(range) {
                continue;
            }
            entry.ranges = entry
                .ranges
                .iter()
                .flat_map(|r| {
                    if r.is_valid() {
                        r.subtract(range)
                    } else {
                        vec![r.clone()]
                    }
                })
                .collect();
        }
        self.entries.retain(|e| !e.ranges.is_empty());
    }
}

fn check_ranges(ranges: &[RangeAddress]) -> Result<()> {
    if ranges.is_empty() {
        return Err(Error::InvalidRange("no ranges given".into()));
    }
    if let Some(bad) = ranges.iter().find(|r| !r.is_valid()) {
        return Err(Error::InvalidRange(format!("{} is not a valid range", bad)));
    }
    Ok(())
}

fn touches(a: &[RangeAddress], b: &[RangeAddress]) -> bool {
    a.iter().filter(|r| r.is_valid()).any(|ra| {
        b.iter()
            .filter(|r| r.is_valid())
            .any(|rb| ra.intersects(rb) || ra.is_adjacent(rb))
    })
}

/// Drop contained ranges and join pairs whose union is a rectangle, then order row-major
fn normalize_ranges(ranges: &mut Vec<RangeAddress>) {
    'restart: loop {
        for i in 0..ranges.len() {
            for j in 0..ranges.len() {
                if i == j || !ranges[i].is_valid() || !ranges[j].is_valid() {
                    continue;
                }
                if ranges[i].union_is_rectangle(&ranges[j]) {
                    let merged = ranges[i].bounding_union(&ranges[j]);
                    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                    ranges.remove(hi);
                    ranges[lo] = merged;
                    continue 'restart;
                }
            }
        }
        break;
    }
    ranges.sort_by_key(|r| (!r.is_valid(), r.first.row, r.first.column));
    ranges.dedup();
}
