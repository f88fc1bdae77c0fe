//! Conditional formatting
//!
//! Conditional formats apply a style to cells whose values match a rule. Unlike
//! data validations, rules may overlap: a cell can be covered by several rules and
//! the store order is their priority (first = highest).
//!
//! ## Example
//!
//! ```rust
//! use gridspan_core::{ConditionalFormatRule, RangeAddress, Worksheet};
//! use gridspan_core::style::{Color, Style};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! let highlight = sheet.intern_style(Style::new().fill_color(Color::LIGHT_RED));
//!
//! let rule = ConditionalFormatRule::cell_is_greater_than("100").with_format(highlight);
//! sheet
//!     .conditional_formats_mut()
//!     .add(vec![RangeAddress::parse("A1:A10").unwrap()], rule)
//!     .unwrap();
//! assert_eq!(sheet.conditional_formats().rules_at(3, 1).len(), 1);
//! ```

use crate::cell::RangeAddress;
use crate::error::Result;
use crate::shift::Edit;
use crate::store::{Annotation, Entry, EntryId, OverlapMode, RangeStore, ShiftReport};
use crate::style::{Color, StyleId};

/// A conditional formatting rule
///
/// `format` is a handle into the owning sheet's style pool, so two rules with the
/// same look compare equal by handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFormatRule {
    /// Rule type
    pub rule_type: CfRuleType,
    /// Stop evaluating lower-priority rules when this one matches
    pub stop_if_true: bool,
    /// Style applied when the rule matches
    pub format: Option<StyleId>,
}

impl Annotation for ConditionalFormatRule {}

impl ConditionalFormatRule {
    /// Create a new conditional format rule
    pub fn new(rule_type: CfRuleType) -> Self {
        Self {
            rule_type,
            stop_if_true: false,
            format: None,
        }
    }

    fn cell_is(operator: CfOperator, formula1: impl Into<String>, formula2: Option<String>) -> Self {
        Self::new(CfRuleType::CellIs {
            operator,
            formula1: formula1.into(),
            formula2,
        })
    }

    /// Cell value greater than
    pub fn cell_is_greater_than(value: impl Into<String>) -> Self {
        Self::cell_is(CfOperator::GreaterThan, value, None)
    }

    /// Cell value less than
    pub fn cell_is_less_than(value: impl Into<String>) -> Self {
        Self::cell_is(CfOperator::LessThan, value, None)
    }

    /// Cell value equal to
    pub fn cell_is_equal_to(value: impl Into<String>) -> Self {
        Self::cell_is(CfOperator::Equal, value, None)
    }

    /// Cell value between two values (inclusive)
    pub fn cell_is_between(value1: impl Into<String>, value2: impl Into<String>) -> Self {
        Self::cell_is(CfOperator::Between, value1, Some(value2.into()))
    }

    /// Formula-based rule
    pub fn expression(formula: impl Into<String>) -> Self {
        Self::new(CfRuleType::Expression {
            formula: formula.into(),
        })
    }

    /// Two-color scale from the lowest to the highest value
    pub fn color_scale_2(min_color: Color, max_color: Color) -> Self {
        Self::new(CfRuleType::ColorScale {
            points: vec![(CfValue::min(), min_color), (CfValue::max(), max_color)],
        })
    }

    /// Three-color scale with the midpoint at the 50th percentile
    pub fn color_scale_3(min_color: Color, mid_color: Color, max_color: Color) -> Self {
        Self::new(CfRuleType::ColorScale {
            points: vec![
                (CfValue::min(), min_color),
                (CfValue::percentile("50"), mid_color),
                (CfValue::max(), max_color),
            ],
        })
    }

    /// Data bar
    pub fn data_bar(color: Color) -> Self {
        Self::new(CfRuleType::DataBar {
            color,
            min: CfValue::min(),
            max: CfValue::max(),
        })
    }

    /// Top N values
    pub fn top_n(rank: u32) -> Self {
        Self::new(CfRuleType::Top10 {
            rank,
            percent: false,
            bottom: false,
        })
    }

    /// Bottom N values
    pub fn bottom_n(rank: u32) -> Self {
        Self::new(CfRuleType::Top10 {
            rank,
            percent: false,
            bottom: true,
        })
    }

    /// Top N percent
    pub fn top_percent(rank: u32) -> Self {
        Self::new(CfRuleType::Top10 {
            rank,
            percent: true,
            bottom: false,
        })
    }

    /// Text contains
    pub fn contains_text(text: impl Into<String>) -> Self {
        Self::new(CfRuleType::Text {
            operator: TextOperator::Contains,
            text: text.into(),
        })
    }

    /// Text begins with
    pub fn begins_with(text: impl Into<String>) -> Self {
        Self::new(CfRuleType::Text {
            operator: TextOperator::BeginsWith,
            text: text.into(),
        })
    }

    /// Text ends with
    pub fn ends_with(text: impl Into<String>) -> Self {
        Self::new(CfRuleType::Text {
            operator: TextOperator::EndsWith,
            text: text.into(),
        })
    }

    /// Duplicate values
    pub fn duplicate_values() -> Self {
        Self::new(CfRuleType::DuplicateValues)
    }

    /// Unique values
    pub fn unique_values() -> Self {
        Self::new(CfRuleType::UniqueValues)
    }

    /// Blank cells
    pub fn contains_blanks() -> Self {
        Self::new(CfRuleType::ContainsBlanks)
    }

    /// Error cells
    pub fn contains_errors() -> Self {
        Self::new(CfRuleType::ContainsErrors)
    }

    /// Set the style applied on match
    pub fn with_format(mut self, style: StyleId) -> Self {
        self.format = Some(style);
        self
    }

    /// Set stop-if-true
    pub fn with_stop_if_true(mut self, stop: bool) -> Self {
        self.stop_if_true = stop;
        self
    }
}

/// Conditional format rule types
#[derive(Debug, Clone, PartialEq)]
pub enum CfRuleType {
    /// Compare the cell value
    CellIs {
        operator: CfOperator,
        formula1: String,
        formula2: Option<String>,
    },
    /// Formula evaluating to TRUE/FALSE
    Expression { formula: String },
    /// Color gradient across value thresholds
    ColorScale { points: Vec<(CfValue, Color)> },
    /// In-cell bar
    DataBar { color: Color, min: CfValue, max: CfValue },
    /// Top/bottom N or N percent
    Top10 { rank: u32, percent: bool, bottom: bool },
    /// Text match
    Text { operator: TextOperator, text: String },
    /// Values occurring more than once
    DuplicateValues,
    /// Values occurring once
    UniqueValues,
    /// Blank cells
    ContainsBlanks,
    /// Non-blank cells
    NotContainsBlanks,
    /// Error cells
    ContainsErrors,
    /// Non-error cells
    NotContainsErrors,
}

/// Comparison operators for cell-is rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfOperator {
    #[default]
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

/// Text rule operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOperator {
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

/// Threshold of a color scale or data bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CfValue {
    pub value_type: CfValueType,
    pub value: Option<String>,
}

impl CfValue {
    /// Lowest value in the range
    pub fn min() -> Self {
        Self {
            value_type: CfValueType::Min,
            value: None,
        }
    }

    /// Highest value in the range
    pub fn max() -> Self {
        Self {
            value_type: CfValueType::Max,
            value: None,
        }
    }

    /// Fixed number
    pub fn number(n: impl Into<String>) -> Self {
        Self {
            value_type: CfValueType::Number,
            value: Some(n.into()),
        }
    }

    /// Percentile of the range
    pub fn percentile(p: impl Into<String>) -> Self {
        Self {
            value_type: CfValueType::Percentile,
            value: Some(p.into()),
        }
    }
}

/// Threshold kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfValueType {
    Min,
    Max,
    Number,
    Percent,
    Percentile,
    Formula,
}

/// The conditional formats of one sheet, in priority order
#[derive(Debug, Clone)]
pub struct ConditionalFormatStore {
    store: RangeStore<ConditionalFormatRule>,
}

impl Default for ConditionalFormatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionalFormatStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            store: RangeStore::new(OverlapMode::Overlap),
        }
    }

    /// Add a rule with the lowest priority so far
    pub fn add(&mut self, ranges: Vec<RangeAddress>, rule: ConditionalFormatRule) -> Result<EntryId> {
        self.store.add(ranges, rule)
    }

    /// Rules covering a cell, highest priority first
    pub fn rules_at(&self, row: i32, column: i32) -> Vec<&ConditionalFormatRule> {
        self.store
            .entries_at(row, column)
            .into_iter()
            .map(|e| e.payload())
            .collect()
    }

    /// Rules that apply to a cell after `stop_if_true` cuts the list short
    pub fn effective_rules_at(&self, row: i32, column: i32) -> Vec<&ConditionalFormatRule> {
        let mut out = Vec::new();
        for rule in self.rules_at(row, column) {
            out.push(rule);
            if rule.stop_if_true {
                break;
            }
        }
        out
    }

    /// Rules intersecting `range`, highest priority first
    pub fn find_intersecting(&self, range: &RangeAddress) -> Vec<&ConditionalFormatRule> {
        self.store.find_intersecting(range)
    }

    /// 1-based priority of a rule
    pub fn priority(&self, id: EntryId) -> Option<usize> {
        self.store.position(id).map(|p| p + 1)
    }

    /// Look up a rule entry
    pub fn get(&self, id: EntryId) -> Option<&Entry<ConditionalFormatRule>> {
        self.store.get(id)
    }

    /// Remove part of one rule's area
    pub fn remove_range(&mut self, id: EntryId, range: &RangeAddress) -> Result<()> {
        self.store.remove_range(id, range)
    }

    /// Remove every rule from `range`
    pub fn clear_range(&mut self, range: &RangeAddress) {
        self.store.clear_range(range);
    }

    /// Remove a rule
    pub fn remove(&mut self, id: EntryId) -> Option<ConditionalFormatRule> {
        self.store.remove(id)
    }

    /// Merge equal rules whose areas touch, keeping the earlier priority
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

    /// Iterate rules in priority order
    pub fn iter(&self) -> impl Iterator<Item = &Entry<ConditionalFormatRule>> {
        self.store.iter()
    }

    pub(crate) fn clip(
        &self,
        range: &RangeAddress,
    ) -> Vec<(Vec<RangeAddress>, ConditionalFormatRule)> {
        self.store.clip(range)
    }

    pub(crate) fn shift(&mut self, edit: &Edit) -> ShiftReport<ConditionalFormatRule> {
        self.store.shift_all(edit)
    }
}
