//! Multi-region comparison
//!
//! A focus region is read alongside each of its same-level peers. Each
//! region is an independent call: a failed focus read fails the comparison,
//! a failed peer read only drops that peer.

use crate::engine::Engine;
use crate::error::{EngineError, ValidationError};
use crate::rows::CanonicalRow;
use futures::future::join_all;
use riq_query::{Dimension, QuerySpec, Selection};
use serde::Serialize;

/// Rows for one region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSeries {
    /// Public region code
    pub region_code: String,
    /// Region label
    pub region: String,
    /// Canonical rows
    pub rows: Vec<CanonicalRow>,
}

/// Focus region with its peers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Focus region
    pub focus: RegionSeries,
    /// Peers that were read successfully, in catalog order
    pub peers: Vec<RegionSeries>,
    /// Peers dropped because their read failed
    pub dropped: Vec<String>,
}

impl Engine {
    /// Compare a region with its same-level peers for one metric
    ///
    /// # Errors
    /// Unknown metric or region, or a failed read of the focus region
    pub async fn compare(
        &self,
        metric_id: &str,
        region_code: &str,
        years: Selection,
    ) -> Result<Comparison, EngineError> {
        let Some(focus) = self.reference().regions().by_code(region_code) else {
            return Err(ValidationError::UnknownRegion(region_code.to_string()).into());
        };
        let spec_for = |code: &str| {
            QuerySpec::new()
                .with(Dimension::Metric, Selection::items([metric_id]))
                .with(Dimension::Region, Selection::items([code]))
                .with(Dimension::Year, years.clone())
        };

        let focus_rows = self.run(&spec_for(&focus.code)).await?.built.rows;

        let peers = self.reference().regions().peers_of(&focus.code);
        let reads = peers.iter().map(|peer| {
            let spec = spec_for(&peer.code);
            async move { self.run(&spec).await }
        });
        let results = join_all(reads).await;

        let mut comparison = Comparison {
            focus: RegionSeries {
                region_code: focus.code.clone(),
                region: focus.name.clone(),
                rows: focus_rows,
            },
            peers: Vec::with_capacity(peers.len()),
            dropped: Vec::new(),
        };
        for (peer, result) in peers.iter().zip(results) {
            match result {
                Ok(outcome) => comparison.peers.push(RegionSeries {
                    region_code: peer.code.clone(),
                    region: peer.name.clone(),
                    rows: outcome.built.rows,
                }),
                Err(error) => {
                    tracing::warn!(peer = %peer.code, %error, "comparison peer dropped");
                    comparison.dropped.push(peer.code.clone());
                }
            }
        }
        Ok(comparison)
    }
}
