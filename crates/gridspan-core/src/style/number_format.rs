//! Number format types and display rendering
//!
//! Only the formats needed to produce the text shown for a cell are rendered;
//! unknown custom formats fall back to General.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::cell::CellValue;

/// Number format for cell display
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    /// 1 - 0
    pub const ID_NUMBER_INT: u32 = 1;
    /// 2 - 0.00
    pub const ID_NUMBER_DEC2: u32 = 2;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 15 - d-mmm-yy
    pub const ID_DATE_MEDIUM: u32 = 15;
    /// 20 - h:mm
    pub const ID_TIME_24H: u32 = 20;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Create a number format from a format string
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        NumberFormat::Custom(format.into())
    }

    /// Integer format (0)
    pub fn integer() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_INT)
    }

    /// Decimal format (0.00)
    pub fn decimal() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_DEC2)
    }

    /// Number with thousands separator (#,##0)
    pub fn thousands() -> Self {
        NumberFormat::BuiltIn(Self::ID_NUMBER_SEP)
    }

    /// Percentage (0%)
    pub fn percent() -> Self {
        NumberFormat::BuiltIn(Self::ID_PERCENT_INT)
    }

    /// Short date (mm-dd-yy)
    pub fn date_short() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATE_SHORT)
    }

    /// Date and time (m/d/yy h:mm)
    pub fn datetime() -> Self {
        NumberFormat::BuiltIn(Self::ID_DATETIME)
    }

    /// Text format (@)
    pub fn text() -> Self {
        NumberFormat::BuiltIn(Self::ID_TEXT)
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            9 => "0%",
            10 => "0.00%",
            14 => "mm-dd-yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    pub fn is_date_format(&self) -> bool {
        date_pattern(self.format_string()).is_some()
    }

    /// Render a cell value the way it is displayed
    ///
    /// Numbers under a date format are read as serial dates (1900 system, or
    /// 1904 when `date_1904` is set).
    pub fn format_value(&self, value: &CellValue, date_1904: bool) -> String {
        let code = self.format_string();
        match value {
            CellValue::Empty => String::new(),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::String(s) => s.as_str().to_string(),
            CellValue::Error(e) => e.as_str().to_string(),
            CellValue::DateTime(dt) => match date_pattern(code) {
                Some(pattern) => dt.format(pattern).to_string(),
                None => format_general_datetime(dt),
            },
            CellValue::Number(n) => {
                if let Some(pattern) = date_pattern(code) {
                    return match serial_to_datetime(*n, date_1904) {
                        Some(dt) => dt.format(pattern).to_string(),
                        None => format_general(*n),
                    };
                }
                format_number(*n, code)
            }
        }
    }
}

fn date_pattern(code: &str) -> Option<&'static str> {
    let pattern = match code.to_ascii_lowercase().as_str() {
        "mm-dd-yy" => "%m-%d-%y",
        "d-mmm-yy" => "%-d-%b-%y",
        "d-mmm" => "%-d-%b",
        "mmm-yy" => "%b-%y",
        "h:mm am/pm" => "%-I:%M %p",
        "h:mm:ss am/pm" => "%-I:%M:%S %p",
        "h:mm" => "%-H:%M",
        "h:mm:ss" => "%-H:%M:%S",
        "m/d/yy h:mm" => "%-m/%-d/%y %-H:%M",
        "m/d/yyyy" => "%-m/%-d/%Y",
        "yyyy-mm-dd" => "%Y-%m-%d",
        "dd/mm/yyyy" => "%d/%m/%Y",
        "yyyy-mm-dd hh:mm:ss" => "%Y-%m-%d %H:%M:%S",
        _ => return None,
    };
    Some(pattern)
}

fn format_number(n: f64, code: &str) -> String {
    match code {
        "0" => format!("{:.0}", n),
        "0.00" => format!("{:.2}", n),
        "#,##0" => with_thousands(&format!("{:.0}", n)),
        "#,##0.00" => with_thousands(&format!("{:.2}", n)),
        "0%" => format!("{:.0}%", n * 100.0),
        "0.00%" => format!("{:.2}%", n * 100.0),
        _ => format_general(n),
    }
}

/// General number rendering: integers without a fraction, others with up to ten
/// significant decimals and no trailing zeros
pub(crate) fn format_general(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let text = format!("{:.10}", n);
    let text = text.trim_end_matches('0');
    text.trim_end_matches('.').to_string()
}

fn format_general_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == chrono::NaiveTime::MIN {
        dt.format("%-m/%-d/%Y").to_string()
    } else {
        dt.format("%-m/%-d/%Y %-H:%M").to_string()
    }
}

fn with_thousands(digits: &str) -> String {
    let (sign, rest) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Convert a serial date number to a date/time
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Convert a date/time to its serial date number
pub fn datetime_to_serial(dt: &NaiveDateTime, date_1904: bool) -> f64 {
    let epoch = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    match epoch.and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(epoch) => (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0,
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_serial_round_trip() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let serial = datetime_to_serial(&dt, false);
        assert_eq!(serial, 45352.5);
        assert_eq!(serial_to_datetime(serial, false), Some(dt));
        assert_eq!(datetime_to_serial(&dt, true), 45352.5 - 1462.0);
    }

    #[test]
    fn test_format_numbers() {
        let v = CellValue::Number(1234.5);
        assert_eq!(NumberFormat::General.format_value(&v, false), "1234.5");
        assert_eq!(NumberFormat::integer().format_value(&v, false), "1234");
        assert_eq!(NumberFormat::decimal().format_value(&v, false), "1234.50");
        assert_eq!(NumberFormat::thousands().format_value(&v, false), "1,234");
        assert_eq!(
            NumberFormat::from_string("#,##0.00").format_value(&CellValue::Number(-1234567.891), false),
            "-1,234,567.89"
        );
        assert_eq!(
            NumberFormat::percent().format_value(&CellValue::Number(0.256), false),
            "26%"
        );
        assert_eq!(NumberFormat::General.format_value(&CellValue::Number(3.0), false), "3");
    }

    #[test]
    fn test_format_dates() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let v = CellValue::DateTime(dt);
        assert_eq!(NumberFormat::date_short().format_value(&v, false), "03-05-24");
        assert_eq!(
            NumberFormat::from_string("yyyy-mm-dd").format_value(&v, false),
            "2024-03-05"
        );
        assert_eq!(NumberFormat::General.format_value(&v, false), "3/5/2024 14:30");

        // 45356 = 2024-03-05 in the 1900 system
        let serial = CellValue::Number(45356.0);
        assert_eq!(
            NumberFormat::from_string("yyyy-mm-dd").format_value(&serial, false),
            "2024-03-05"
        );
    }

    #[test]
    fn test_format_other_values() {
        let fmt = NumberFormat::General;
        assert_eq!(fmt.format_value(&CellValue::Empty, false), "");
        assert_eq!(fmt.format_value(&CellValue::Boolean(true), false), "TRUE");
        assert_eq!(fmt.format_value(&CellValue::string("abc"), false), "abc");
    }

    #[test]
    fn test_is_date_format() {
        assert!(NumberFormat::date_short().is_date_format());
        assert!(NumberFormat::from_string("yyyy-mm-dd").is_date_format());
        assert!(!NumberFormat::thousands().is_date_format());
        assert!(!NumberFormat::General.is_date_format());
    }
}
