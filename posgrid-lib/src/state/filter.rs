//! Per-column structured filter values.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::column::FilterKind;

/// Inclusive numeric bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Inclusive date bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

/// Value of one column filter.
///
/// Serializes as a single-key object: `{"text": ".."}`, `{"range": {..}}`,
/// `{"dateRange": {..}}` or `{"multiSelect": [..]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterValue {
    Text(String),
    Range(NumberRange),
    DateRange(DateRange),
    MultiSelect(Vec<String>),
}

impl FilterValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range(NumberRange { min, max })
    }

    pub fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self::DateRange(DateRange { start, end })
    }

    pub fn multi_select<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect(values.into_iter().map(Into::into).collect())
    }

    /// A filter that constrains nothing. Setting one clears the column filter.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Range(range) => range.min.is_none() && range.max.is_none(),
            Self::DateRange(range) => range.start.is_none() && range.end.is_none(),
            Self::MultiSelect(values) => values.is_empty(),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Text(_) => FilterKind::Text,
            Self::Range(_) => FilterKind::NumberRange,
            Self::DateRange(_) => FilterKind::DateRange,
            Self::MultiSelect(_) => FilterKind::MultiSelect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json_shape() {
        let value = FilterValue::range(Some(1.0), None);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"range":{"min":1.0}}"#
        );

        let value = FilterValue::multi_select(["open", "closed"]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"multiSelect":["open","closed"]}"#
        );

        let parsed: FilterValue =
            serde_json::from_str(r#"{"dateRange":{"start":"2024-05-01"}}"#).unwrap();
        assert_eq!(
            parsed,
            FilterValue::date_range(NaiveDate::from_ymd_opt(2024, 5, 1), None)
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(FilterValue::text("  ").is_empty());
        assert!(FilterValue::range(None, None).is_empty());
        assert!(!FilterValue::range(None, Some(3.0)).is_empty());
        assert!(FilterValue::multi_select(Vec::<String>::new()).is_empty());
    }
}
