//! Sheet identity
//!
//! References never own the sheet they point at. A reference either carries no
//! sheet at all ([`SheetRef::Local`], resolved against whatever sheet holds it),
//! a live [`SheetId`], a name that was parsed but not yet resolved, or the last
//! known name of a sheet that has since been deleted.
//!
//! The [`SheetRegistry`] owned by the workbook hands out ids, enforces the
//! naming rules and remembers deleted sheets until [`SheetRegistry::purge_deleted`].

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::MAX_SHEET_NAME_LEN;

/// Opaque, never-reused sheet identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(u32);

impl SheetId {
    /// Raw id value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// The sheet a reference belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SheetRef {
    /// Unqualified; belongs to the sheet holding the reference
    #[default]
    Local,
    /// A sheet known to the workbook
    Live(SheetId),
    /// Qualified by name, not resolved against a workbook yet
    Named(Arc<str>),
    /// The sheet was deleted; keeps its last known name
    Deleted(Arc<str>),
}

impl SheetRef {
    /// Reference by sheet name
    pub fn named<S: AsRef<str>>(name: S) -> Self {
        SheetRef::Named(Arc::from(name.as_ref()))
    }

    /// Dangling reference to a deleted sheet
    pub fn deleted<S: AsRef<str>>(last_name: S) -> Self {
        SheetRef::Deleted(Arc::from(last_name.as_ref()))
    }

    /// Whether the sheet this points at was deleted
    pub fn is_deleted(&self) -> bool {
        matches!(self, SheetRef::Deleted(_))
    }

    /// The live sheet id, if any
    pub fn sheet_id(&self) -> Option<SheetId> {
        match self {
            SheetRef::Live(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether this reference, held by a structure living on `holder`, denotes `sheet`
    pub fn denotes(&self, sheet: SheetId, holder: Option<SheetId>) -> bool {
        match self {
            SheetRef::Local => holder == Some(sheet),
            SheetRef::Live(id) => *id == sheet,
            SheetRef::Named(_) | SheetRef::Deleted(_) => false,
        }
    }
}

/// What a [`SheetResolver`] knows about a sheet id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetStatus<'a> {
    /// Sheet exists under this name
    Live(&'a str),
    /// Sheet was deleted but is still remembered
    Deleted(&'a str),
    /// Sheet is not known at all
    Unknown,
}

/// Looks up sheet names for reference formatting
pub trait SheetResolver {
    /// Status of the sheet with the given id
    fn status(&self, id: SheetId) -> SheetStatus<'_>;
}

/// Resolver that knows no sheets
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSheets;

impl SheetResolver for NoSheets {
    fn status(&self, _id: SheetId) -> SheetStatus<'_> {
        SheetStatus::Unknown
    }
}

/// Sheet id allocation and naming
#[derive(Debug, Default, Clone)]
pub struct SheetRegistry {
    next_id: u32,
    live: AHashMap<SheetId, String>,
    tombstones: AHashMap<SheetId, String>,
}

impl SheetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new sheet name and return its id
    pub fn register(&mut self, name: &str) -> Result<SheetId> {
        self.validate_name(name, None)?;
        let id = SheetId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, name.to_string());
        Ok(id)
    }

    /// Rename a live sheet
    pub fn rename(&mut self, id: SheetId, new_name: &str) -> Result<()> {
        if !self.live.contains_key(&id) {
            return Err(Error::SheetNotFound(id.to_string()));
        }
        self.validate_name(new_name, Some(id))?;
        self.live.insert(id, new_name.to_string());
        Ok(())
    }

    /// Mark a sheet as deleted, returning its last name
    pub fn remove(&mut self, id: SheetId) -> Result<String> {
        let name = self
            .live
            .remove(&id)
            .ok_or_else(|| Error::SheetNotFound(id.to_string()))?;
        self.tombstones.insert(id, name.clone());
        Ok(name)
    }

    /// Forget every deleted sheet
    pub fn purge_deleted(&mut self) {
        self.tombstones.clear();
    }

    /// Name of a live sheet
    pub fn name(&self, id: SheetId) -> Option<&str> {
        self.live.get(&id).map(String::as_str)
    }

    /// Find a live sheet by name (case-insensitive)
    pub fn id_of(&self, name: &str) -> Option<SheetId> {
        self.live
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }

    /// Whether the id belongs to a live sheet
    pub fn is_live(&self, id: SheetId) -> bool {
        self.live.contains_key(&id)
    }

    /// Number of live sheets
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no sheet is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Resolve a [`SheetRef::Named`] to a live reference when the name is known
    pub fn resolve(&self, sheet: &SheetRef) -> SheetRef {
        match sheet {
            SheetRef::Named(name) => match self.id_of(name) {
                Some(id) => SheetRef::Live(id),
                None => sheet.clone(),
            },
            other => other.clone(),
        }
    }

    /// Generate an unused `SheetN` name
    pub fn generate_name(&self) -> String {
        let mut n = self.live.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.validate_name(&name, None).is_ok() {
                return name;
            }
            n += 1;
        }
    }

    /// Validate a sheet name, optionally ignoring one sheet in the duplicate check
    pub fn validate_name(&self, name: &str, exclude: Option<SheetId>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(Error::InvalidSheetName(
                "Sheet name cannot start or end with an apostrophe".into(),
            ));
        }

        let clash = self
            .live
            .iter()
            .any(|(id, n)| Some(*id) != exclude && n.eq_ignore_ascii_case(name));
        if clash {
            return Err(Error::DuplicateSheetName(name.into()));
        }
        Ok(())
    }
}

impl SheetResolver for SheetRegistry {
    fn status(&self, id: SheetId) -> SheetStatus<'_> {
        if let Some(name) = self.live.get(&id) {
            SheetStatus::Live(name)
        } else if let Some(name) = self.tombstones.get(&id) {
            SheetStatus::Deleted(name)
        } else {
            SheetStatus::Unknown
        }
    }
}
