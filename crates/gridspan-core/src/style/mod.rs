//! Cell styling types
//!
//! - [`Style`] - Complete cell style
//! - [`StylePool`] - Deduplicating style arena addressed by [`StyleId`]
//! - [`NumberFormat`] - Display format for values
//! - [`Color`] - Color representation

mod color;
mod number_format;
mod pool;

pub use color::Color;
pub use number_format::{datetime_to_serial, serial_to_datetime, NumberFormat};
pub use pool::{StyleId, StylePool};

/// Complete cell style
///
/// Styles are deduplicated via [`StylePool`]; cells and conditional formats
/// hold a [`StyleId`] handle instead of the style itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style {
    /// Bold font
    pub bold: bool,
    /// Italic font
    pub italic: bool,
    /// Font color
    pub font_color: Color,
    /// Solid background fill
    pub fill_color: Option<Color>,
    /// Number format
    pub number_format: NumberFormat,
}

impl Style {
    /// Create a new default style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set font to bold
    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set font to italic
    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Set font color
    pub fn font_color(mut self, color: Color) -> Self {
        self.font_color = color;
        self
    }

    /// Set fill color (solid fill)
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    /// Set number format
    pub fn number_format(mut self, format: NumberFormat) -> Self {
        self.number_format = format;
        self
    }
}
