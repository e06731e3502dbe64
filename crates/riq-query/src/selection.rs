//! Selection algebra
//!
//! A [`Selection`] is the per-dimension selector of a query: `all`, an
//! explicit item list, or a numeric range. Resolution is total and never
//! fails: malformed numeric input fails open to "no filter", because query
//! specs arrive as loosely typed JSON from exploratory clients.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Per-dimension selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "lowercase")]
pub enum Selection {
    /// No restriction; callers enumerate reference data instead
    All,
    /// Explicit list of values
    Item {
        /// Selected values
        #[serde(default, deserialize_with = "lenient_strings")]
        values: Vec<String>,
    },
    /// Inclusive numeric range
    Range {
        /// Lower bound (number or numeric string)
        #[serde(default)]
        from: Value,
        /// Upper bound (number or numeric string)
        #[serde(default)]
        to: Value,
    },
}

/// Outcome of resolving a selection
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<T> {
    /// No filter
    All,
    /// Concrete values
    Items(Vec<T>),
    /// Inclusive bound
    Range(NumericRange),
}

impl<T> Resolved<T> {
    /// Whether this resolution applies no filter
    #[inline]
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Resolved::All)
    }

    /// Concrete values, if any
    #[inline]
    #[must_use]
    pub fn items(&self) -> Option<&[T]> {
        match self {
            Resolved::Items(items) => Some(items),
            _ => None,
        }
    }
}

/// Inclusive numeric bound with finite ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    /// Lower bound
    pub from: f64,
    /// Upper bound
    pub to: f64,
}

impl NumericRange {
    /// Create range; `None` unless both ends are finite
    #[must_use]
    pub fn new(from: f64, to: f64) -> Option<Self> {
        if from.is_finite() && to.is_finite() {
            Some(Self { from, to })
        } else {
            None
        }
    }

    /// Integer year bounds, ordered low to high
    #[must_use]
    pub fn year_bounds(&self) -> (i32, i32) {
        let (lo, hi) = if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        };
        (clamp_year(lo.ceil()), clamp_year(hi.floor()))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_year(v: f64) -> i32 {
    v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

impl Selection {
    /// Select everything
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Selection::All
    }

    /// Select explicit values
    #[inline]
    #[must_use]
    pub fn items<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Item {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Select a numeric range
    #[inline]
    #[must_use]
    pub fn range(from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Selection::Range {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Resolve with item values passed through verbatim
    #[must_use]
    pub fn resolve(&self) -> Resolved<String> {
        match self {
            Selection::All => Resolved::All,
            Selection::Item { values } => Resolved::Items(values.clone()),
            Selection::Range { from, to } => resolve_range(from, to),
        }
    }

    /// Resolve as years
    ///
    /// Item values are parsed to integers, deduplicated and sorted ascending.
    /// Unparseable values are dropped; if none survive the selection is
    /// treated as absent.
    #[must_use]
    pub fn resolve_years(&self) -> Resolved<i32> {
        match self {
            Selection::All => Resolved::All,
            Selection::Item { values } => {
                let mut years: Vec<i32> = values.iter().filter_map(|v| parse_year(v)).collect();
                years.sort_unstable();
                years.dedup();
                if years.is_empty() {
                    Resolved::All
                } else {
                    Resolved::Items(years)
                }
            }
            Selection::Range { from, to } => resolve_range(from, to),
        }
    }
}

fn resolve_range<T>(from: &Value, to: &Value) -> Resolved<T> {
    match (coerce_number(from), coerce_number(to)) {
        (Some(from), Some(to)) => NumericRange::new(from, to).map_or(Resolved::All, Resolved::Range),
        _ => Resolved::All,
    }
}

/// Coerce a loosely typed JSON scalar to a finite number
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Parse a year; integral numeric strings such as `"2020.0"` are accepted
#[must_use]
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let n = raw.parse::<f64>().ok()?;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= f64::from(i32::MAX) {
        Some(clamp_year(n))
    } else {
        None
    }
}

/// Render a JSON scalar as a selection value
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(scalar_to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn year_items_are_parsed_deduplicated_and_sorted() {
        let sel = Selection::items(["2021", "2020", "2021", " 2019 "]);
        assert_eq!(sel.resolve_years(), Resolved::Items(vec![2019, 2020, 2021]));
    }

    #[test]
    fn year_items_fail_open_when_nothing_parses() {
        let sel = Selection::items(["soon", ""]);
        assert!(sel.resolve_years().is_all());
    }

    #[test]
    fn generic_items_are_verbatim() {
        let sel = Selection::items(["UKI", "UKI", "ukm"]);
        assert_eq!(
            sel.resolve(),
            Resolved::Items(vec!["UKI".to_string(), "UKI".to_string(), "ukm".to_string()])
        );
    }

    #[test]
    fn range_coerces_strings_and_numbers() {
        let sel = Selection::range("2020", 2030);
        match sel.resolve_years() {
            Resolved::Range(r) => assert_eq!(r.year_bounds(), (2020, 2030)),
            other => panic!("expected range, got {other:?}"),
        }
    }

    #[test]
    fn malformed_range_is_absent() {
        assert!(Selection::range("abc", 2030).resolve().is_all());
        assert!(Selection::range(json!(null), json!(2030)).resolve().is_all());
        assert!(Selection::range("inf", "2030").resolve().is_all());
    }

    #[test]
    fn reversed_range_bounds_are_ordered() {
        let range = NumericRange::new(2030.0, 2020.5).unwrap();
        assert_eq!(range.year_bounds(), (2021, 2030));
    }

    #[test]
    fn deserialize_tagged_selection() {
        let all: Selection = serde_json::from_value(json!({"filter": "all"})).unwrap();
        assert_eq!(all, Selection::All);

        let items: Selection =
            serde_json::from_value(json!({"filter": "item", "values": ["a", 2020, 1.5]})).unwrap();
        assert_eq!(items, Selection::items(["a", "2020", "1.5"]));

        let range: Selection =
            serde_json::from_value(json!({"filter": "range", "from": "1991", "to": 2050})).unwrap();
        assert!(matches!(range.resolve(), Resolved::Range(_)));
    }

    #[test]
    fn unknown_filter_is_rejected_by_serde() {
        let result: Result<Selection, _> = serde_json::from_value(json!({"filter": "top", "n": 5}));
        assert!(result.is_err());
    }

    #[test]
    fn parse_year_accepts_integral_floats_only() {
        assert_eq!(parse_year("2020.0"), Some(2020));
        assert_eq!(parse_year("2020.5"), None);
        assert_eq!(parse_year("NaN"), None);
    }
}
