//! Cell address type and A1 / R1C1 reference text

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::sheet_ref::{SheetRef, SheetResolver, SheetStatus};
use crate::{MAX_COLS, MAX_ROWS};

use super::range::RangeAddress;

/// Text written in place of an unrecoverable reference
pub const REF_ERROR: &str = "#REF!";

/// Reference notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferenceStyle {
    /// `B3`, `$B$3`, `A1:C4`
    #[default]
    A1,
    /// `R3C2`, `R1C1:R4C3`
    R1C1,
}

/// How an address or range is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatOptions {
    /// Notation
    pub style: ReferenceStyle,
    /// Force `$` markers on every component (A1 only)
    pub fixed: bool,
    /// Prefix the sheet name
    pub with_sheet: bool,
}

impl FormatOptions {
    /// A1 notation, own `$` flags, no sheet
    pub fn a1() -> Self {
        Self::default()
    }

    /// R1C1 notation, no sheet
    pub fn r1c1() -> Self {
        Self {
            style: ReferenceStyle::R1C1,
            ..Self::default()
        }
    }

    /// Force absolute markers
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Include the sheet prefix
    pub fn with_sheet(mut self, with_sheet: bool) -> Self {
        self.with_sheet = with_sheet;
        self
    }
}

/// A cell address (e.g. `B2`, `$C$7`, `Data!A1`)
///
/// Rows and columns are 1-based. An address is valid while both coordinates are
/// within the grid and it has not been invalidated by a structural edit. An
/// invalidated address keeps its last coordinates but always renders as `#REF!`.
///
/// Equality and hashing consider coordinates, sheet and validity only; the `$`
/// flags are presentation and do not take part.
#[derive(Debug, Clone)]
pub struct Address {
    /// Row number (1-based)
    pub row: i32,
    /// Column number (1-based, A = 1)
    pub column: i32,
    /// Row reference is absolute (`$`)
    pub row_fixed: bool,
    /// Column reference is absolute (`$`)
    pub column_fixed: bool,
    /// Sheet this address belongs to
    pub sheet: SheetRef,
    invalidated: bool,
}

impl Address {
    /// Create a relative address on the holder's sheet
    pub fn new(row: i32, column: i32) -> Self {
        Self::with_fixed(row, column, false, false)
    }

    /// Create an absolute address (`$A$1` style)
    pub fn fixed(row: i32, column: i32) -> Self {
        Self::with_fixed(row, column, true, true)
    }

    /// Create an address with explicit `$` flags
    pub fn with_fixed(row: i32, column: i32, row_fixed: bool, column_fixed: bool) -> Self {
        Self {
            row,
            column,
            row_fixed,
            column_fixed,
            sheet: SheetRef::Local,
            invalidated: false,
        }
    }

    /// The canonical invalid address (`#REF!`)
    pub fn invalid() -> Self {
        Self {
            row: 0,
            column: 0,
            row_fixed: false,
            column_fixed: false,
            sheet: SheetRef::Local,
            invalidated: true,
        }
    }

    /// Same address on another sheet
    pub fn on_sheet(mut self, sheet: SheetRef) -> Self {
        self.sheet = sheet;
        self
    }

    /// Copy of this address marked invalid
    pub fn invalidated(&self) -> Self {
        let mut addr = self.clone();
        addr.invalidated = true;
        addr
    }

    /// Whether both coordinates are inside the grid and the address was not invalidated
    pub fn is_valid(&self) -> bool {
        !self.invalidated && in_grid(self.row, self.column)
    }

    /// Whether the owning sheet was deleted
    pub fn is_sheet_deleted(&self) -> bool {
        self.sheet.is_deleted()
    }

    /// Address moved by a row/column delta, or `None` when it would leave the grid
    pub fn offset(&self, rows: i32, columns: i32) -> Option<Self> {
        let row = self.row.checked_add(rows)?;
        let column = self.column.checked_add(columns)?;
        if !in_grid(row, column) {
            return None;
        }
        let mut addr = self.clone();
        addr.row = row;
        addr.column = column;
        Some(addr)
    }

    /// Range from this address to another
    pub fn to(&self, other: &Address) -> RangeAddress {
        RangeAddress::new(self.clone(), other.clone())
    }

    /// Single-cell range at this address
    pub fn as_range(&self) -> RangeAddress {
        RangeAddress::single(self.clone())
    }

    /// Parse an A1 reference, optionally sheet-qualified
    ///
    /// # Examples
    /// ```
    /// use gridspan_core::Address;
    ///
    /// let addr = Address::parse("$B$2").unwrap();
    /// assert_eq!((addr.row, addr.column), (2, 2));
    /// assert!(addr.row_fixed && addr.column_fixed);
    ///
    /// assert!(!Address::parse("#REF!").unwrap().is_valid());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let (sheet, body) = split_sheet_prefix(text)?;
        if body.eq_ignore_ascii_case(REF_ERROR) {
            return Ok(Address::invalid().on_sheet(sheet));
        }
        match parse_a1_endpoint(body, text)? {
            Endpoint::Cell {
                row,
                row_fixed,
                column,
                column_fixed,
            } => Ok(Address::with_fixed(row, column, row_fixed, column_fixed).on_sheet(sheet)),
            _ => Err(Error::parse(text, "expected a single cell")),
        }
    }

    /// Parse an absolute R1C1 reference (`R2C3`)
    pub fn parse_r1c1(text: &str) -> Result<Self> {
        Self::parse_r1c1_with_base(text, None)
    }

    /// Parse an R1C1 reference that may contain relative parts (`R[-1]C[2]`, `RC`)
    pub fn parse_r1c1_relative(text: &str, base: &Address) -> Result<Self> {
        Self::parse_r1c1_with_base(text, Some(base))
    }

    fn parse_r1c1_with_base(text: &str, base: Option<&Address>) -> Result<Self> {
        let (sheet, body) = split_sheet_prefix(text)?;
        if body.eq_ignore_ascii_case(REF_ERROR) {
            return Ok(Address::invalid().on_sheet(sheet));
        }
        match parse_r1c1_endpoint(body, text, base)? {
            (Some((row, row_fixed)), Some((column, column_fixed))) => {
                Ok(Address::with_fixed(row, column, row_fixed, column_fixed).on_sheet(sheet))
            }
            _ => Err(Error::parse(text, "expected a single cell")),
        }
    }

    /// Convert a column number to letters (1 = A, 27 = AA)
    pub fn column_to_letters(column: i32) -> String {
        let mut result = Vec::new();
        let mut n = column.max(1) as u32;
        while n > 0 {
            n -= 1;
            result.push((n % 26) as u8 + b'A');
            n /= 26;
        }
        result.reverse();
        String::from_utf8(result).unwrap_or_default()
    }

    /// Convert column letters to a column number (A = 1, XFD = 16384)
    pub fn letters_to_column(letters: &str) -> Result<i32> {
        if letters.is_empty() {
            return Err(Error::parse(letters, "empty column letters"));
        }
        let mut column: i64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::parse(letters, format!("invalid column letter '{}'", c)));
            }
            column = column * 26 + (c.to_ascii_uppercase() as i64 - 'A' as i64 + 1);
            if column > MAX_COLS as i64 {
                return Err(Error::ColumnOutOfRange(column, MAX_COLS));
            }
        }
        Ok(column as i32)
    }

    /// A1 text with the address's own `$` flags and no sheet
    pub fn to_a1_string(&self) -> String {
        self.format_unresolved(FormatOptions::a1())
    }

    /// Absolute R1C1 text (`R2C3`)
    pub fn to_r1c1_string(&self) -> String {
        self.format_unresolved(FormatOptions::r1c1())
    }

    /// R1C1 text with relative parts expressed against `base` (`R[-1]C2`)
    pub fn to_r1c1_relative(&self, base: &Address) -> String {
        if !self.is_valid() {
            return REF_ERROR.to_string();
        }
        format!(
            "{}{}",
            r1c1_component('R', self.row, self.row_fixed, base.row),
            r1c1_component('C', self.column, self.column_fixed, base.column)
        )
    }

    /// Render with the given options, resolving sheet names through `sheets`
    ///
    /// Invalid addresses always render as `#REF!`. An address whose sheet was
    /// deleted renders with a `#REF!` prefix in place of the sheet name; one whose
    /// sheet id is completely unknown renders as plain `#REF!`.
    pub fn format(&self, options: FormatOptions, sheets: &dyn SheetResolver) -> String {
        self.format_inner(options, Some(sheets))
    }

    fn format_unresolved(&self, options: FormatOptions) -> String {
        self.format_inner(options, None)
    }

    fn format_inner(&self, options: FormatOptions, sheets: Option<&dyn SheetResolver>) -> String {
        if !self.is_valid() {
            return REF_ERROR.to_string();
        }
        let body = match options.style {
            ReferenceStyle::A1 => a1_cell(self, options.fixed),
            ReferenceStyle::R1C1 => format!("R{}C{}", self.row, self.column),
        };
        apply_sheet_prefix(&self.sheet, sheets, options.with_sheet, body)
    }

    pub(crate) fn set_coordinates(&mut self, row: i32, column: i32) {
        self.row = row;
        self.column = column;
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.is_valid() == other.is_valid()
            && self.row == other.row
            && self.column == other.column
            && self.sheet == other.sheet
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_valid().hash(state);
        self.row.hash(state);
        self.column.hash(state);
        self.sheet.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

pub(crate) fn in_grid(row: i32, column: i32) -> bool {
    (1..=MAX_ROWS).contains(&row) && (1..=MAX_COLS).contains(&column)
}

fn a1_cell(addr: &Address, force_fixed: bool) -> String {
    let mut out = String::with_capacity(10);
    a1_column(&mut out, addr.column, force_fixed || addr.column_fixed);
    a1_row(&mut out, addr.row, force_fixed || addr.row_fixed);
    out
}

pub(crate) fn a1_column(out: &mut String, column: i32, fixed: bool) {
    if fixed {
        out.push('$');
    }
    out.push_str(&Address::column_to_letters(column));
}

pub(crate) fn a1_row(out: &mut String, row: i32, fixed: bool) {
    if fixed {
        out.push('$');
    }
    out.push_str(&row.to_string());
}

fn r1c1_component(tag: char, value: i32, fixed: bool, base: i32) -> String {
    if fixed {
        format!("{}{}", tag, value)
    } else if value == base {
        tag.to_string()
    } else {
        format!("{}[{}]", tag, value - base)
    }
}

/// Prefix `body` with the sheet part. `sheets == None` means "no registry at hand":
/// live ids are then rendered without a name.
pub(crate) fn apply_sheet_prefix(
    sheet: &SheetRef,
    sheets: Option<&dyn SheetResolver>,
    with_sheet: bool,
    body: String,
) -> String {
    match sheet {
        SheetRef::Local => body,
        SheetRef::Named(name) => {
            if with_sheet {
                format!("{}!{}", quote_sheet_name(name), body)
            } else {
                body
            }
        }
        SheetRef::Deleted(_) => format!("{}{}", REF_ERROR, body),
        SheetRef::Live(id) => match sheets.map(|s| s.status(*id)) {
            None => body,
            Some(SheetStatus::Live(name)) => {
                if with_sheet {
                    format!("{}!{}", quote_sheet_name(name), body)
                } else {
                    body
                }
            }
            Some(SheetStatus::Deleted(_)) => format!("{}{}", REF_ERROR, body),
            Some(SheetStatus::Unknown) => REF_ERROR.to_string(),
        },
    }
}

/// Quote a sheet name when it cannot appear bare in a reference
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !matches!(parse_a1_endpoint(name, name), Ok(Endpoint::Cell { .. }));
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    }
}

/// Split `Sheet!body`, `'My Sheet'!body` and `#REF!body` into sheet and body
pub(crate) fn split_sheet_prefix(text: &str) -> Result<(SheetRef, &str)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::parse(text, "empty reference"));
    }

    if let Some(quoted) = text.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\'' {
                if matches!(chars.peek(), Some((_, '\''))) {
                    chars.next();
                    name.push('\'');
                    continue;
                }
                let rest = &quoted[i + 1..];
                return match rest.strip_prefix('!') {
                    Some(body) if !name.is_empty() => Ok((SheetRef::named(&name), body)),
                    _ => Err(Error::parse(text, "expected '!' after quoted sheet name")),
                };
            }
            name.push(c);
        }
        return Err(Error::parse(text, "unterminated sheet name"));
    }

    match text.find('!') {
        None => Ok((SheetRef::Local, text)),
        Some(0) => Err(Error::parse(text, "empty sheet name")),
        Some(pos) => {
            let prefix = &text[..pos];
            let body = &text[pos + 1..];
            if prefix.eq_ignore_ascii_case("#REF") {
                if body.is_empty() {
                    // bare `#REF!`
                    return Ok((SheetRef::Local, REF_ERROR));
                }
                Ok((SheetRef::deleted(""), body))
            } else {
                Ok((SheetRef::named(prefix), body))
            }
        }
    }
}

/// One side of an A1 reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Cell {
        row: i32,
        row_fixed: bool,
        column: i32,
        column_fixed: bool,
    },
    Row {
        row: i32,
        fixed: bool,
    },
    Column {
        column: i32,
        fixed: bool,
    },
}

fn take_fixed(s: &str) -> (bool, &str) {
    match s.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, s),
    }
}

fn check_row(value: i64, text: &str) -> Result<i32> {
    if value < 1 {
        return Err(Error::parse(text, "row number must be >= 1"));
    }
    if value > MAX_ROWS as i64 {
        return Err(Error::RowOutOfRange(value, MAX_ROWS));
    }
    Ok(value as i32)
}

fn check_column(value: i64, text: &str) -> Result<i32> {
    if value < 1 {
        return Err(Error::parse(text, "column number must be >= 1"));
    }
    if value > MAX_COLS as i64 {
        return Err(Error::ColumnOutOfRange(value, MAX_COLS));
    }
    Ok(value as i32)
}

/// Parse a run of digits; values too long for `i64` saturate so the row or
/// column check reports them against the right axis
fn parse_digits(s: &str, text: &str) -> Result<i64> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.trim_start_matches('0').len() > 18 {
        return Ok(i64::MAX);
    }
    s.parse::<i64>()
        .map_err(|_| Error::parse(text, format!("invalid number '{}'", s)))
}

pub(crate) fn parse_a1_endpoint(s: &str, text: &str) -> Result<Endpoint> {
    let (column_fixed, rest) = take_fixed(s);
    let letters_len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .count();
    let (letters, rest) = rest.split_at(letters_len);

    if letters.is_empty() {
        // `$3` / `3`: whole-row endpoint; a `$` here belongs to the row
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::parse(text, "no column letters"));
        }
        let row = check_row(parse_digits(rest, text)?, text)?;
        return Ok(Endpoint::Row {
            row,
            fixed: column_fixed,
        });
    }

    let column = Address::letters_to_column(letters)
        .map_err(|e| match e {
            Error::Parse { .. } => Error::parse(text, "invalid column letters"),
            other => other,
        })?;

    if rest.is_empty() {
        return Ok(Endpoint::Column {
            column,
            fixed: column_fixed,
        });
    }

    let (row_fixed, digits) = take_fixed(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(text, "invalid row number"));
    }
    let row = check_row(parse_digits(digits, text)?, text)?;
    Ok(Endpoint::Cell {
        row,
        row_fixed,
        column,
        column_fixed,
    })
}

/// Parse `R2C3`, `R[1]C`, `R2` or `C3`; returns the (value, fixed) pairs present
pub(crate) fn parse_r1c1_endpoint(
    s: &str,
    text: &str,
    base: Option<&Address>,
) -> Result<(Option<(i32, bool)>, Option<(i32, bool)>)> {
    let mut rest = s;
    let mut row = None;
    let mut column = None;

    if let Some(r) = rest.strip_prefix(['R', 'r']) {
        let (part, after) = r1c1_number(r, text, base.map(|b| b.row))?;
        row = Some((check_row(part.0, text)?, part.1));
        rest = after;
    }
    if let Some(c) = rest.strip_prefix(['C', 'c']) {
        let (part, after) = r1c1_number(c, text, base.map(|b| b.column))?;
        column = Some((check_column(part.0, text)?, part.1));
        rest = after;
    }
    if !rest.is_empty() || (row.is_none() && column.is_none()) {
        return Err(Error::parse(text, "invalid R1C1 reference"));
    }
    Ok((row, column))
}

fn r1c1_number<'a>(s: &'a str, text: &str, base: Option<i32>) -> Result<((i64, bool), &'a str)> {
    if let Some(inner) = s.strip_prefix('[') {
        let end = inner
            .find(']')
            .ok_or_else(|| Error::parse(text, "unterminated relative offset"))?;
        let offset: i64 = inner[..end]
            .parse()
            .map_err(|_| Error::parse(text, "invalid relative offset"))?;
        let base = base.ok_or_else(|| Error::parse(text, "relative reference needs a base"))?;
        let value = i64::from(base)
            .checked_add(offset)
            .ok_or_else(|| Error::parse(text, "relative offset out of range"))?;
        return Ok(((value, false), &inner[end + 1..]));
    }

    let digits_len = s.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        let base = base.ok_or_else(|| Error::parse(text, "relative reference needs a base"))?;
        return Ok(((base as i64, false), s));
    }
    let value = parse_digits(&s[..digits_len], text)?;
    Ok(((value, true), &s[digits_len..]))
}
