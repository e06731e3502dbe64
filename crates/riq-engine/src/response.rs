//! Outbound query response

use crate::config::EngineConfig;
use crate::rows::CanonicalRow;
use serde::{Deserialize, Serialize};

/// Response metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Per-call identifier
    pub request_id: String,
    /// Dataset name
    pub dataset: String,
    /// Producing system
    pub source: String,
    /// Release vintage
    pub vintage: String,
    /// Release status
    pub status: String,
    /// Citation line
    pub citation: String,
    /// Access timestamp (UTC, RFC 3339)
    pub accessed_at: String,
    /// Estimated record cost of the request
    pub estimated_records: u64,
    /// Rows returned
    pub returned_records: usize,
    /// Whether a cap cut the result short
    pub truncated: bool,
    /// Non-fatal notes
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ResponseMeta {
    /// Meta for one call
    #[must_use]
    pub fn new(config: &EngineConfig, request_id: impl Into<String>, accessed_at: impl Into<String>) -> Self {
        let accessed_at = accessed_at.into();
        Self {
            request_id: request_id.into(),
            dataset: config.dataset.clone(),
            source: config.lifecycle.source.clone(),
            vintage: config.lifecycle.vintage.clone(),
            status: config.lifecycle.status.clone(),
            citation: config.lifecycle.citation(&accessed_at),
            accessed_at,
            estimated_records: 0,
            returned_records: 0,
            truncated: false,
            warnings: Vec::new(),
        }
    }
}

/// Query-mode result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Metadata
    pub meta: ResponseMeta,
    /// Canonical rows
    pub data: Vec<CanonicalRow>,
}
