//! # gridspan
//!
//! An in-memory spreadsheet model whose references survive structural edits.
//!
//! Every range-scoped piece of a sheet (data validations, conditional formats,
//! defined names, sparklines, merged regions, tables and the autofilter) moves
//! with the cells when rows or columns are inserted or deleted. Ranges that an
//! edit removes entirely become `#REF!` instead of silently vanishing.
//!
//! ## Features
//!
//! - A1 and R1C1 references, sheet-qualified and comma-separated lists
//! - A pure shift engine for insert/delete of rows and columns
//! - A generic range-indexed annotation store with split-on-add and consolidation
//! - Copy and move of ranges with their annotations, across sheets
//! - Autofilter with per-column predicates, reapply and stable sort
//! - Deferred notifications delivered once per structural edit
//!
//! ## Example
//!
//! ```rust
//! use gridspan::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! workbook
//!     .define_name("Totals", "Sheet1!$B$2:$B$5", NameScope::Workbook)
//!     .unwrap();
//!
//! workbook.insert_rows(0, 3, 2).unwrap();
//! assert_eq!(
//!     workbook.name_refers_to("Totals", None).unwrap(),
//!     "Sheet1!$B$2:$B$7"
//! );
//!
//! workbook.delete_rows(0, 1, 10).unwrap();
//! assert_eq!(workbook.name_refers_to("Totals", None).unwrap(), "#REF!");
//! ```

pub mod prelude;

pub use gridspan_core::*;
