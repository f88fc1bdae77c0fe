//! # gridspan-core
//!
//! In-memory spreadsheet model built around range-scoped annotations.
//!
//! This crate provides:
//! - [`Address`] and [`RangeAddress`] - A1 / R1C1 references that survive edits
//!   as `#REF!` instead of disappearing
//! - [`shift`] - the pure engine mapping a range through a row/column insert or delete
//! - [`RangeStore`] - the generic store behind data validations, conditional
//!   formats, names and sparklines
//! - [`Worksheet`] and [`Workbook`] - sheets that move cells, merged regions,
//!   tables, the autofilter and every annotation together on structural edits
//!
//! ## Example
//!
//! ```rust
//! use gridspan_core::{DataValidation, RangeAddress, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet
//!     .validations_mut()
//!     .add(vec![RangeAddress::parse("B2:B10").unwrap()], DataValidation::list("Yes,No"))
//!     .unwrap();
//!
//! // Inserting two rows above moves the validation down.
//! workbook.insert_rows(0, 1, 2).unwrap();
//! let sheet = workbook.worksheet(0).unwrap();
//! assert!(sheet.has_data_validation(12, 2));
//! assert!(!sheet.has_data_validation(2, 2));
//! ```

pub mod autofilter;
pub mod cell;
pub mod clipboard;
pub mod conditional_format;
pub mod error;
pub mod merged;
pub mod named_range;
pub mod notify;
pub mod sheet_ref;
pub mod shift;
pub mod sparkline;
pub mod store;
pub mod style;
pub mod table;
pub mod validation;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use autofilter::{
    AutoFilter, AutoFilterMut, Connector, Filter, FilterColumn, FilterColumnMut, FilterOperator,
    FilterPredicate, ScalarValue, SortOrder, SortState,
};
pub use cell::{
    Address, CellData, CellError, CellValue, FormatOptions, RangeAddress, Reference,
    ReferenceStyle, REF_ERROR,
};
pub use clipboard::Snapshot;
pub use conditional_format::{
    CfOperator, CfRuleType, CfValue, CfValueType, ConditionalFormatRule, ConditionalFormatStore,
    TextOperator,
};
pub use error::{Error, Result};
pub use merged::MergedRegions;
pub use named_range::{NameScope, NameStore, NamedRange};
pub use notify::{Notification, StoreKind};
pub use sheet_ref::{NoSheets, SheetId, SheetRef, SheetRegistry, SheetResolver, SheetStatus};
pub use shift::{shift, shift_address, Axis, Edit, RangeOutcome};
pub use sparkline::{
    Sparkline, SparklineGroup, SparklineGroupId, SparklineKind, SparklineStore, SparklineStyle,
};
pub use store::{Annotation, Entry, EntryId, InvalidationPolicy, OverlapMode, RangeStore, ShiftReport};
pub use style::{Color, NumberFormat, Style, StyleId, StylePool};
pub use table::{Table, TableStore};
pub use validation::{
    DataValidation, ValidationErrorStyle, ValidationOperator, ValidationStore, ValidationType,
};
pub use workbook::{Workbook, WorkbookSettings};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: i32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: i32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
