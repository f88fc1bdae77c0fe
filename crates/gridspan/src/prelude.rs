//! Prelude module - common imports for gridspan users
//!
//! ```rust
//! use gridspan::prelude::*;
//! ```

pub use crate::{
    // References
    Address,
    RangeAddress,
    Reference,
    ReferenceStyle,
    FormatOptions,
    SheetId,
    SheetRef,

    // Structural edits
    shift,
    Edit,
    RangeOutcome,

    // Cells and styles
    CellValue,
    CellError,
    Color,
    NumberFormat,
    Style,

    // Annotations
    ConditionalFormatRule,
    DataValidation,
    EntryId,
    NameScope,
    SparklineStyle,
    ValidationOperator,

    // Autofilter
    Connector,
    FilterOperator,
    FilterPredicate,
    SortOrder,

    // Main types
    Notification,
    Workbook,
    WorkbookSettings,
    Worksheet,

    // Error types
    Error,
    Result,
};
