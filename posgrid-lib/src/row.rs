//! Row binding.
//!
//! The engine never inspects host rows directly. Everything it needs (a stable
//! key for selection, text for search, a typed value for sorting) goes through
//! [`TableRow`].

use std::cmp::Ordering;
use std::hash::Hash;

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Trait for rows that can be displayed in a data table.
///
/// # Example
///
/// ```
/// use posgrid_lib::{CellValue, TableRow};
///
/// #[derive(Clone)]
/// struct Device {
///     serial: String,
///     name: String,
///     battery: i64,
/// }
///
/// impl TableRow for Device {
///     type Key = String;
///
///     fn key(&self) -> String {
///         self.serial.clone()
///     }
///
///     fn cell_text(&self, column_id: &str) -> String {
///         match column_id {
///             "name" => self.name.clone(),
///             "battery" => self.battery.to_string(),
///             _ => String::new(),
///         }
///     }
///
///     fn cell_value(&self, column_id: &str) -> CellValue {
///         match column_id {
///             "battery" => CellValue::Integer(self.battery),
///             other => CellValue::Text(self.cell_text(other)),
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// The key type used to identify this row across refetches.
    type Key: Clone + Eq + Hash + ToString + Send + Sync + 'static;

    /// Return a stable business key for this row.
    fn key(&self) -> Self::Key;

    /// Plain text of the cell. Search and display use it for columns
    /// without a renderer.
    fn cell_text(&self, column_id: &str) -> String;

    /// Typed value of the cell, used for sorting.
    fn cell_value(&self, column_id: &str) -> CellValue {
        CellValue::Text(self.cell_text(column_id))
    }
}

/// A typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Integer(i64),
    Number(f64),
    /// Exact amounts such as prices and totals.
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl CellValue {
    /// Ordering between values of unrelated kinds. Empty cells sort last.
    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Integer(_) | Self::Number(_) | Self::Decimal(_) => 1,
            Self::Date(_) => 2,
            Self::Timestamp(_) => 3,
            Self::Text(_) => 4,
            Self::Empty => 5,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Number(v) => Some(*v),
            Self::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Total order used by the row pipeline.
    ///
    /// Text compares case-insensitively first so `apple` and `Apple` sit
    /// together; NaN compares equal to everything.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Empty, Self::Empty) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => a.rank().cmp(&b.rank()),
            },
        }
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

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Decimal> for CellValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or(Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_numeric_compare() {
        let price = CellValue::Decimal(Decimal::new(1250, 2));
        assert_eq!(price.compare(&CellValue::Integer(12)), Ordering::Greater);
        assert_eq!(CellValue::Number(12.5).compare(&price), Ordering::Equal);
    }

    #[test]
    fn test_text_is_case_insensitive() {
        let a = CellValue::from("apple");
        let b = CellValue::from("Banana");
        assert_eq!(a.compare(&b), Ordering::Less);
    }

    #[test]
    fn test_empty_sorts_last() {
        assert_eq!(
            CellValue::Empty.compare(&CellValue::from("zzz")),
            Ordering::Greater
        );
        assert_eq!(CellValue::from(None::<i64>), CellValue::Empty);
    }
}
