//! Declarative query
//!
//! [`QuerySpec`] is the typed form of an inbound request: at most one
//! [`Selection`] per [`Dimension`], in request order. It is built once per
//! request and read-only afterwards.
//!
//! The inbound JSON is tolerated rather than trusted:
//!
//! ```json
//! {
//!   "query": [{"code": "metric", "selection": {"filter": "item", "values": ["population_total"]}}],
//!   "scenario": "baseline",
//!   "metrics": ["..."], "regions": ["..."], "selectedYears": [2023, 2024]
//! }
//! ```
//!
//! A missing or malformed `query` array falls back to the top-level hints.
//! Entries without a known dimension code are skipped; a known dimension
//! with a malformed selection rejects the request. A present but empty
//! `metrics` or `regions` hint selects nothing.

use crate::dimension::Dimension;
use crate::error::QueryError;
use crate::scenario::{Measure, Scenario};
use crate::selection::{scalar_to_string, Resolved, Selection};
use indexmap::IndexMap;
use riq_catalog::{DataType, Level};
use serde_json::Value;

/// Typed declarative query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    selectors: IndexMap<Dimension, Selection>,
}

impl QuerySpec {
    /// Create empty spec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a selector; the first selector for a dimension wins
    ///
    /// Returns `false` if the dimension already had a selector.
    pub fn insert(&mut self, dimension: Dimension, selection: Selection) -> bool {
        if self.selectors.contains_key(&dimension) {
            tracing::warn!(%dimension, "duplicate selector ignored");
            return false;
        }
        self.selectors.insert(dimension, selection);
        true
    }

    /// With selector (builder form of [`QuerySpec::insert`])
    #[inline]
    #[must_use]
    pub fn with(mut self, dimension: Dimension, selection: Selection) -> Self {
        self.insert(dimension, selection);
        self
    }

    /// Selector for a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&Selection> {
        self.selectors.get(&dimension)
    }

    /// Dimensions with selectors, in request order
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.selectors.keys().copied()
    }

    /// Parse a request body
    ///
    /// # Errors
    /// Fails when the body is not a JSON object, or when an entry for a known
    /// dimension carries a missing or malformed selection
    pub fn from_request(body: &Value) -> Result<Self, QueryError> {
        let Some(obj) = body.as_object() else {
            return Err(QueryError::MalformedBody(format!(
                "expected object, got {}",
                json_kind(body)
            )));
        };

        let mut spec = Self::new();

        if let Some(entries) = obj.get("query").and_then(Value::as_array) {
            for entry in entries {
                let Some(code) = entry.get("code").and_then(Value::as_str) else {
                    tracing::debug!("query entry without code skipped");
                    continue;
                };
                let Some(dimension) = Dimension::from_code(code) else {
                    tracing::debug!(code, "unknown dimension ignored");
                    continue;
                };
                let Some(raw) = entry.get("selection") else {
                    return Err(QueryError::malformed_selection(dimension, "missing selection"));
                };
                let selection = serde_json::from_value::<Selection>(raw.clone())
                    .map_err(|e| QueryError::malformed_selection(dimension, e.to_string()))?;
                spec.insert(dimension, selection);
            }
        } else if obj.contains_key("query") {
            tracing::debug!("query is not an array; using top-level hints");
        }

        spec.apply_hints(obj);
        Ok(spec)
    }

    /// Parse a request body from JSON text
    ///
    /// # Errors
    /// Fails on invalid JSON or a non-object body
    pub fn from_json_str(json: &str) -> Result<Self, QueryError> {
        let body: Value =
            serde_json::from_str(json).map_err(|e| QueryError::MalformedBody(e.to_string()))?;
        Self::from_request(&body)
    }

    fn apply_hints(&mut self, obj: &serde_json::Map<String, Value>) {
        let hints = [
            (Dimension::Metric, obj.get("metrics")),
            (Dimension::Region, obj.get("regions")),
            (Dimension::Scenario, obj.get("scenarios").or_else(|| obj.get("scenario"))),
            (Dimension::Year, obj.get("selectedYears")),
        ];
        for (dimension, hint) in hints {
            if self.selectors.contains_key(&dimension) {
                continue;
            }
            let Some(values) = hint.and_then(hint_values) else {
                continue;
            };
            let selects_nothing = matches!(dimension, Dimension::Metric | Dimension::Region);
            if !values.is_empty() || selects_nothing {
                self.selectors.insert(dimension, Selection::items(values));
            }
        }
    }

    /// Requested metric ids (`All` if unrestricted)
    #[must_use]
    pub fn metric_ids(&self) -> Resolved<String> {
        self.resolve(Dimension::Metric)
    }

    /// Requested public region codes (`All` if unrestricted)
    #[must_use]
    pub fn region_codes(&self) -> Resolved<String> {
        self.resolve(Dimension::Region)
    }

    /// Requested years
    #[must_use]
    pub fn years(&self) -> Resolved<i32> {
        self.get(Dimension::Year)
            .map_or(Resolved::All, Selection::resolve_years)
    }

    /// Requested scenarios; baseline when unspecified, all three for `all`
    ///
    /// # Errors
    /// Unknown scenario names and range selectors are client errors
    pub fn scenarios(&self) -> Result<Vec<Scenario>, QueryError> {
        self.reject_range(Dimension::Scenario)?;
        match self.resolve(Dimension::Scenario) {
            Resolved::Items(values) => {
                let mut out = Vec::with_capacity(values.len());
                for value in values {
                    let scenario: Scenario = value.parse()?;
                    if !out.contains(&scenario) {
                        out.push(scenario);
                    }
                }
                if out.is_empty() {
                    out.push(Scenario::Baseline);
                }
                Ok(out)
            }
            Resolved::All if self.get(Dimension::Scenario).is_some() => Ok(Scenario::ALL.to_vec()),
            _ => Ok(vec![Scenario::Baseline]),
        }
    }

    /// Explicit measure override (first listed value)
    ///
    /// # Errors
    /// Unknown measure names and range selectors are client errors
    pub fn measure_override(&self) -> Result<Option<Measure>, QueryError> {
        self.reject_range(Dimension::Measure)?;
        match self.resolve(Dimension::Measure) {
            Resolved::Items(values) => values.first().map(|v| v.parse()).transpose(),
            _ => Ok(None),
        }
    }

    /// Data-type filter
    ///
    /// # Errors
    /// Unknown data types and range selectors are client errors
    pub fn data_types(&self) -> Result<Option<Vec<DataType>>, QueryError> {
        self.reject_range(Dimension::DataType)?;
        match self.resolve(Dimension::DataType) {
            Resolved::Items(values) if !values.is_empty() => values
                .iter()
                .map(|v| {
                    DataType::parse(v).ok_or_else(|| QueryError::invalid_value(Dimension::DataType, v))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Level restriction
    ///
    /// # Errors
    /// Unknown level names and range selectors are client errors
    pub fn levels(&self) -> Result<Option<Vec<Level>>, QueryError> {
        self.reject_range(Dimension::Level)?;
        match self.resolve(Dimension::Level) {
            Resolved::Items(values) if !values.is_empty() => values
                .iter()
                .map(|v| {
                    v.parse::<Level>()
                        .map_err(|_| QueryError::invalid_value(Dimension::Level, v))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            _ => Ok(None),
        }
    }

    fn reject_range(&self, dimension: Dimension) -> Result<(), QueryError> {
        match self.get(dimension) {
            Some(Selection::Range { .. }) => Err(QueryError::UnsupportedRange { dimension }),
            _ => Ok(()),
        }
    }

    fn resolve(&self, dimension: Dimension) -> Resolved<String> {
        self.get(dimension).map_or(Resolved::All, Selection::resolve)
    }
}

fn hint_values(hint: &Value) -> Option<Vec<String>> {
    match hint {
        Value::Array(items) => Some(items.iter().filter_map(scalar_to_string).collect()),
        Value::Null => None,
        scalar => scalar_to_string(scalar).map(|s| vec![s]),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
