//! Cell-related types and utilities
//!
//! This module contains:
//! - [`Address`] - A cell's location (e.g., "A1", "Sheet1!$B$2")
//! - [`RangeAddress`] - A rectangular range of cells (e.g., "A1:B10", "3:5")
//! - [`CellValue`] - The value stored in a cell
//! - [`CellData`] / [`CellStorage`] - The sparse cell arena of a worksheet

mod address;
mod range;
mod storage;
mod value;

pub use address::{quote_sheet_name, Address, FormatOptions, ReferenceStyle, REF_ERROR};
pub use range::{RangeAddress, Reference};
pub use storage::{CellData, CellStorage};
pub use value::{CellError, CellValue, SharedString, StringPool};
