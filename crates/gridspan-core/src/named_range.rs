//! Named range definitions
//!
//! Named ranges assign meaningful names to one or more ranges of cells. Names
//! are case-insensitive and live either in the workbook scope or in the scope of
//! one sheet; a sheet-scoped name hides a workbook name of the same spelling on
//! that sheet.
//!
//! Unlike the other stores, a name keeps ranges that a structural edit
//! invalidated: they render as `#REF!` in [`NameStore::refers_to`] so the
//! definition survives for the caller to repair.

use ahash::AHashMap;

use crate::cell::{FormatOptions, RangeAddress};
use crate::error::{Error, Result};
use crate::sheet_ref::{SheetId, SheetRef, SheetResolver};
use crate::shift::Edit;
use crate::store::{
    Annotation, Entry, EntryId, InvalidationPolicy, OverlapMode, RangeStore, ShiftReport,
};

const MAX_NAME_LEN: usize = 255;

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Available throughout the workbook (global)
    Workbook,
    /// Scoped to a specific sheet (local)
    Sheet(SheetId),
}

/// A named range definition
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRange {
    /// The name as written (e.g., "SalesData")
    pub name: String,
    /// Scope of this name
    pub scope: NameScope,
    /// Optional comment
    pub comment: Option<String>,
    /// Whether this name is hidden from the UI
    pub hidden: bool,
}

impl Annotation for NamedRange {}

impl NamedRange {
    fn new(name: &str, scope: NameScope) -> Self {
        Self {
            name: name.to_string(),
            scope,
            comment: None,
            hidden: false,
        }
    }
}

/// Check a defined name against the naming rules
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let first = chars
        .next()
        .ok_or_else(|| Error::InvalidName("name cannot be empty".into()))?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidName(format!(
            "'{}' is longer than {} characters",
            name, MAX_NAME_LEN
        )));
    }
    if !(first.is_alphabetic() || first == '_' || first == '\\') {
        return Err(Error::InvalidName(format!(
            "'{}' must start with a letter, '_' or '\\'",
            name
        )));
    }
    if let Some(c) = chars.find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '\\'))) {
        return Err(Error::InvalidName(format!(
            "'{}' contains invalid character '{}'",
            name, c
        )));
    }
    let looks_like_reference = crate::cell::Address::parse(name).is_ok()
        || crate::cell::RangeAddress::parse_r1c1(name).is_ok()
        || name.eq_ignore_ascii_case("r")
        || name.eq_ignore_ascii_case("c");
    if looks_like_reference {
        return Err(Error::InvalidName(format!(
            "'{}' looks like a cell reference",
            name
        )));
    }
    Ok(())
}

/// The defined names of a workbook
#[derive(Debug, Clone)]
pub struct NameStore {
    store: RangeStore<NamedRange>,
    index: AHashMap<(String, NameScope), EntryId>,
}

impl Default for NameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NameStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            store: RangeStore::new(OverlapMode::Overlap).with_policy(InvalidationPolicy::Keep),
            index: AHashMap::new(),
        }
    }

    fn key(name: &str, scope: NameScope) -> (String, NameScope) {
        (name.to_lowercase(), scope)
    }

    /// Define a name
    ///
    /// Unqualified ranges of a sheet-scoped name belong to that sheet; a
    /// workbook-scoped name needs sheet-qualified ranges.
    pub fn define(
        &mut self,
        name: &str,
        scope: NameScope,
        ranges: Vec<RangeAddress>,
    ) -> Result<EntryId> {
        validate_name(name)?;
        let key = Self::key(name, scope);
        if self.index.contains_key(&key) {
            return Err(Error::conflict(format!(
                "name '{}' already exists in this scope",
                name
            )));
        }

        let ranges = ranges
            .into_iter()
            .map(|r| {
                if *r.sheet() != SheetRef::Local {
                    return Ok(r);
                }
                match scope {
                    NameScope::Sheet(id) => Ok(r.on_sheet(SheetRef::Live(id))),
                    NameScope::Workbook => Err(Error::InvalidRange(format!(
                        "workbook name '{}' needs a sheet-qualified range",
                        name
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let id = self.store.add(ranges, NamedRange::new(name, scope))?;
        self.index.insert(key, id);
        Ok(id)
    }

    /// Look up a name as seen from `current_sheet`: sheet scope first, then workbook scope
    pub fn get(&self, name: &str, current_sheet: Option<SheetId>) -> Option<&Entry<NamedRange>> {
        current_sheet
            .and_then(|sheet| self.get_exact(name, NameScope::Sheet(sheet)))
            .or_else(|| self.get_exact(name, NameScope::Workbook))
    }

    /// Look up a name in exactly one scope
    pub fn get_exact(&self, name: &str, scope: NameScope) -> Option<&Entry<NamedRange>> {
        let id = self.index.get(&Self::key(name, scope))?;
        self.store.get(*id)
    }

    /// Whether the name exists in the given scope
    pub fn contains(&self, name: &str, scope: NameScope) -> bool {
        self.index.contains_key(&Self::key(name, scope))
    }

    /// Remove a name
    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedRange> {
        let id = self.index.remove(&Self::key(name, scope))?;
        self.store.remove(id)
    }

    /// Rename a name within its scope
    pub fn rename(&mut self, name: &str, scope: NameScope, new_name: &str) -> Result<()> {
        validate_name(new_name)?;
        let old_key = Self::key(name, scope);
        let new_key = Self::key(new_name, scope);
        let id = *self
            .index
            .get(&old_key)
            .ok_or_else(|| Error::InvalidName(format!("name '{}' not found", name)))?;
        if new_key != old_key && self.index.contains_key(&new_key) {
            return Err(Error::conflict(format!(
                "name '{}' already exists in this scope",
                new_name
            )));
        }

        let mut payload = self
            .store
            .get(id)
            .map(|e| e.payload().clone())
            .ok_or(Error::EntryNotFound(id.get()))?;
        payload.name = new_name.to_string();
        self.store.set_payload(id, payload)?;
        self.index.remove(&old_key);
        self.index.insert(new_key, id);
        Ok(())
    }

    /// Set the comment of a name
    pub fn set_comment(&mut self, name: &str, scope: NameScope, comment: Option<String>) -> Result<()> {
        let id = *self
            .index
            .get(&Self::key(name, scope))
            .ok_or_else(|| Error::InvalidName(format!("name '{}' not found", name)))?;
        if let Some(entry) = self.store.get_mut(id) {
            entry.payload_mut().comment = comment;
        }
        Ok(())
    }

    /// Reference text of a name (`Sheet1!$B$2,Sheet1!$B$3:$C$3`)
    pub fn refers_to(&self, entry: &Entry<NamedRange>, sheets: &dyn SheetResolver) -> String {
        RangeAddress::format_list(entry.ranges(), FormatOptions::a1().with_sheet(true), sheets)
    }

    /// Copy a whole name into the scope of another sheet
    ///
    /// Every range of the copy is moved to `target`. Copying onto the sheet the
    /// name is already scoped to would collide with itself and is rejected.
    pub fn copy_to_sheet(&mut self, name: &str, scope: NameScope, target: SheetId) -> Result<EntryId> {
        if scope == NameScope::Sheet(target) {
            return Err(Error::conflict(format!(
                "name '{}' already belongs to the target sheet",
                name
            )));
        }
        let source = self
            .get_exact(name, scope)
            .ok_or_else(|| Error::InvalidName(format!("name '{}' not found", name)))?;
        let payload = source.payload().clone();
        let ranges: Vec<_> = source
            .ranges()
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.clone().on_sheet(SheetRef::Live(target)))
            .collect();

        let id = self.define(&payload.name, NameScope::Sheet(target), ranges)?;
        if let Some(entry) = self.store.get_mut(id) {
            entry.payload_mut().comment = payload.comment;
            entry.payload_mut().hidden = payload.hidden;
        }
        Ok(id)
    }

    /// Number of names
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether there are no names
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Iterate over all names in definition order
    pub fn iter(&self) -> impl Iterator<Item = &Entry<NamedRange>> {
        self.store.iter()
    }

    /// Names scoped to one sheet
    pub fn sheet_names(&self, sheet: SheetId) -> impl Iterator<Item = &Entry<NamedRange>> {
        self.store
            .iter()
            .filter(move |e| e.payload().scope == NameScope::Sheet(sheet))
    }

    /// Apply a structural edit made on `sheet`
    pub(crate) fn shift(&mut self, edit: &Edit, sheet: SheetId) -> ShiftReport<NamedRange> {
        self.store
            .shift_matching(edit, |r| r.sheet().denotes(sheet, None))
    }

    /// Drop names scoped to a deleted sheet and point the rest of its references at the tombstone
    pub(crate) fn sheet_deleted(&mut self, sheet: SheetId, last_name: &str) {
        self.store
            .retain(|e| e.payload().scope != NameScope::Sheet(sheet));
        self.index.retain(|(_, scope), _| *scope != NameScope::Sheet(sheet));
        for entry in self.store.iter_mut() {
            for range in entry.ranges_mut() {
                if range.sheet().denotes(sheet, None) {
                    *range = range.clone().on_sheet(SheetRef::deleted(last_name));
                }
            }
        }
    }
}
