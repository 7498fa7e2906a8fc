//! Cell values and the row accessor trait.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use chrono::DateTime;
use chrono::Utc;

/// Filter key used for empty or absent cells.
pub const UNDEFINED: &str = "undefined";

/// The value of one cell as seen by sorting, filtering and rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing or blank.
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl CellValue {
    /// Returns `true` for absent values and blank text.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            Self::Number(_) | Self::Timestamp(_) => false,
        }
    }

    /// Human-readable form used in table cells.
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) => format_number(*n),
            Self::Timestamp(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }

    /// Literal used by categorical filters; empty cells map to [`UNDEFINED`].
    pub fn filter_key(&self) -> String {
        if self.is_empty() {
            UNDEFINED.to_string()
        } else {
            self.display()
        }
    }

    /// Numeric view used by range filters.
    ///
    /// Text is parsed leniently; timestamps become epoch milliseconds.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Timestamp(at) => Some(at.timestamp_millis() as f64),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

// =============================================================================
// TableRow Trait
// =============================================================================

/// Trait for rows that can be displayed by the table browser.
///
/// The table never inspects a row except through [`TableRow::cell`].
///
/// # Example
///
/// ```ignore
/// impl TableRow for Sensor {
///     type Key = u32;
///
///     fn key(&self) -> u32 {
///         self.id
///     }
///
///     fn cell(&self, column_id: &str) -> CellValue {
///         match column_id {
///             "name" => self.name.as_str().into(),
///             "reading" => self.reading.into(),
///             _ => CellValue::Empty,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// The key type used to identify this row.
    type Key: Clone + Eq + Hash + ToString + Send + Sync + 'static;

    /// Return a unique key for this row.
    fn key(&self) -> Self::Key;

    /// Return the cell value for the given column.
    fn cell(&self, column_id: &str) -> CellValue;
}

/// A free-form row keyed by column id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    key: String,
    cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Sets a cell, builder style.
    pub fn with(mut self, column_id: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column_id.into(), value.into());
        self
    }

    pub fn set(&mut self, column_id: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column_id.into(), value.into());
    }
}

impl TableRow for Record {
    type Key = String;

    fn key(&self) -> String {
        self.key.clone()
    }

    fn cell(&self, column_id: &str) -> CellValue {
        self.cells.get(column_id).cloned().unwrap_or_default()
    }
}
