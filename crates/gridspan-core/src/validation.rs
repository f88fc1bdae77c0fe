//! Data validation
//!
//! Data validation restricts what may be entered into cells. A sheet keeps its
//! rules in a [`ValidationStore`]; no cell is ever governed by two rules, so
//! adding a rule over cells that already have one splits the older rule around
//! the new area.
//!
//! ## Example
//!
//! ```rust
//! use gridspan_core::{DataValidation, RangeAddress, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! let rule = DataValidation::list("Yes,No,Maybe")
//!     .with_error_message("Invalid value", "Please select from the list");
//!
//! sheet
//!     .validations_mut()
//!     .add(vec![RangeAddress::parse("A1:A10").unwrap()], rule)
//!     .unwrap();
//! assert!(sheet.has_data_validation(5, 1));
//! ```

use crate::cell::RangeAddress;
use crate::error::Result;
use crate::shift::Edit;
use crate::store::{Annotation, Entry, EntryId, OverlapMode, RangeStore, ShiftReport};

/// Data validation rule
///
/// Controls what data can be entered into cells, and can display input
/// messages and error alerts.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValidation {
    /// Type of validation
    pub validation_type: ValidationType,
    /// Allow blank/empty cells
    pub allow_blank: bool,
    /// Show dropdown for list validation
    pub show_dropdown: bool,
    /// Input message (title, text) shown when a cell is selected
    pub input_message: Option<(String, String)>,
    /// Error alert style
    pub error_style: ValidationErrorStyle,
    /// Error alert (title, text) shown when invalid data is entered
    pub error_message: Option<(String, String)>,
}

impl Default for DataValidation {
    fn default() -> Self {
        Self {
            validation_type: ValidationType::None,
            allow_blank: true,
            show_dropdown: true,
            input_message: None,
            error_style: ValidationErrorStyle::Stop,
            error_message: None,
        }
    }
}

impl Annotation for DataValidation {}

impl DataValidation {
    /// Create a new data validation with no restrictions
    pub fn new() -> Self {
        Self::default()
    }

    fn of(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            ..Self::default()
        }
    }

    /// Create a list validation (dropdown)
    ///
    /// `source` is either a comma-separated list of values (`"Yes,No"`) or a
    /// range reference (`"=Sheet1!$A$1:$A$10"`).
    pub fn list(source: impl Into<String>) -> Self {
        Self::of(ValidationType::List {
            source: source.into(),
        })
    }

    /// Create a whole number validation
    pub fn whole_number(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self::of(ValidationType::Whole(Criterion::new(operator, value1)))
    }

    /// Create a whole number validation with between/not between operator
    pub fn whole_number_between(
        operator: ValidationOperator,
        value1: impl Into<String>,
        value2: impl Into<String>,
    ) -> Self {
        Self::of(ValidationType::Whole(
            Criterion::new(operator, value1).and(value2),
        ))
    }

    /// Create a decimal number validation
    pub fn decimal(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self::of(ValidationType::Decimal(Criterion::new(operator, value1)))
    }

    /// Create a decimal number validation with between/not between operator
    pub fn decimal_between(
        operator: ValidationOperator,
        value1: impl Into<String>,
        value2: impl Into<String>,
    ) -> Self {
        Self::of(ValidationType::Decimal(
            Criterion::new(operator, value1).and(value2),
        ))
    }

    /// Create a date validation
    pub fn date(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self::of(ValidationType::Date(Criterion::new(operator, value1)))
    }

    /// Create a text length validation
    pub fn text_length(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self::of(ValidationType::TextLength(Criterion::new(operator, value1)))
    }

    /// Create a custom formula validation
    ///
    /// The formula returns TRUE for valid values.
    pub fn custom(formula: impl Into<String>) -> Self {
        Self::of(ValidationType::Custom {
            formula: formula.into(),
        })
    }

    /// Set whether blank cells are allowed
    pub fn with_allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Set whether to show dropdown for list validation
    pub fn with_dropdown(mut self, show: bool) -> Self {
        self.show_dropdown = show;
        self
    }

    /// Set an input message (shown when cell is selected)
    pub fn with_input_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.input_message = Some((title.into(), message.into()));
        self
    }

    /// Set an error message (shown when invalid data entered)
    pub fn with_error_message(
        mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.error_message = Some((title.into(), message.into()));
        self
    }

    /// Set the error style
    pub fn with_error_style(mut self, style: ValidationErrorStyle) -> Self {
        self.error_style = style;
        self
    }
}

/// Comparison with one or two operand formulas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub operator: ValidationOperator,
    pub value1: String,
    pub value2: Option<String>,
}

impl Criterion {
    fn new(operator: ValidationOperator, value1: impl Into<String>) -> Self {
        Self {
            operator,
            value1: value1.into(),
            value2: None,
        }
    }

    fn and(mut self, value2: impl Into<String>) -> Self {
        self.value2 = Some(value2.into());
        self
    }
}

/// Types of data validation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValidationType {
    /// No validation (any value allowed)
    #[default]
    None,
    /// Must be a whole number
    Whole(Criterion),
    /// Must be a decimal number
    Decimal(Criterion),
    /// Must be from a list
    List {
        /// Either comma-separated values or a range reference
        source: String,
    },
    /// Must be a date
    Date(Criterion),
    /// Text length constraint
    TextLength(Criterion),
    /// Custom formula validation
    Custom {
        /// Formula that returns TRUE/FALSE
        formula: String,
    },
}

/// Comparison operators for validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationOperator {
    /// Value must be between value1 and value2
    #[default]
    Between,
    /// Value must NOT be between value1 and value2
    NotBetween,
    /// Value must equal value1
    Equal,
    /// Value must NOT equal value1
    NotEqual,
    /// Value must be greater than value1
    GreaterThan,
    /// Value must be less than value1
    LessThan,
    /// Value must be greater than or equal to value1
    GreaterThanOrEqual,
    /// Value must be less than or equal to value1
    LessThanOrEqual,
}

/// Error alert style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationErrorStyle {
    /// Reject the value
    #[default]
    Stop,
    /// Warn, allow the user to continue
    Warning,
    /// Inform only
    Information,
}

/// The data validations of one sheet
#[derive(Debug, Clone)]
pub struct ValidationStore {
    store: RangeStore<DataValidation>,
}

impl Default for ValidationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            store: RangeStore::new(OverlapMode::Split),
        }
    }

    /// Apply a rule to `ranges`, splitting older rules out of the way
    pub fn add(&mut self, ranges: Vec<RangeAddress>, rule: DataValidation) -> Result<EntryId> {
        self.store.add(ranges, rule)
    }

    /// The rule governing a cell
    pub fn validation_at(&self, row: i32, column: i32) -> Option<&DataValidation> {
        self.store.entry_at(row, column).map(|e| e.payload())
    }

    /// The entry governing a cell
    pub fn entry_at(&self, row: i32, column: i32) -> Option<&Entry<DataValidation>> {
        self.store.entry_at(row, column)
    }

    /// Rules intersecting `range`
    pub fn find_intersecting(&self, range: &RangeAddress) -> Vec<&DataValidation> {
        self.store.find_intersecting(range)
    }

    /// Ranges of one rule
    pub fn ranges(&self, id: EntryId) -> Option<&[RangeAddress]> {
        self.store.get(id).map(|e| e.ranges())
    }

    /// Remove part of one rule's area
    pub fn remove_range(&mut self, id: EntryId, range: &RangeAddress) -> Result<()> {
        self.store.remove_range(id, range)
    }

    /// Remove every rule from `range`
    pub fn clear_range(&mut self, range: &RangeAddress) {
        self.store.clear_range(range);
    }

    /// Remove a rule entirely
    pub fn remove(&mut self, id: EntryId) -> Option<DataValidation> {
        self.store.remove(id)
    }

    /// Merge equal rules whose areas touch
    pub fn consolidate(&mut self) {
        self.store.consolidate();
    }

    /// Merge equal rules, only where one of them overlaps or borders `area`
    pub fn consolidate_touching(&mut self, area: &RangeAddress) {
        self.store.consolidate_touching(area);
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Iterate rules in order
    pub fn iter(&self) -> impl Iterator<Item = &Entry<DataValidation>> {
        self.store.iter()
    }

    pub(crate) fn clip(&self, range: &RangeAddress) -> Vec<(Vec<RangeAddress>, DataValidation)> {
        self.store.clip(range)
    }

    pub(crate) fn shift(&mut self, edit: &Edit) -> ShiftReport<DataValidation> {
        self.store.shift_all(edit)
    }
}
