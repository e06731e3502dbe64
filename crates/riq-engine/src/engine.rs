//! Engine facade
//!
//! Wires resolution, routing, fetching, row building and output assembly
//! together for one call. The engine holds only immutable, `Arc`-shared
//! state, so concurrent calls need no locking.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::export::{self, CsvBundleWriter, ExportFile, WorkbookWriter};
use crate::matrix::Matrix;
use crate::request::{estimate_records, ResolvedRequest};
use crate::response::{QueryResponse, ResponseMeta};
use crate::router::{fetch_all, LevelRouter};
use crate::rows::{build_rows, BuiltRows};
use crate::schema::SchemaDescription;
use crate::store::ObservationStore;
use chrono::{SecondsFormat, Utc};
use riq_catalog::ReferenceData;
use riq_query::{JobsRule, QuerySpec};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use ulid::Ulid;

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub(crate) struct Outcome {
    pub(crate) request: ResolvedRequest,
    pub(crate) built: BuiltRows,
    pub(crate) estimated: u64,
}

impl Outcome {
    fn warnings(&self, max_records: usize) -> Vec<String> {
        let mut warnings = self.request.warnings.clone();
        if self.built.truncated {
            warnings.push(format!("result truncated at {max_records} records"));
        }
        warnings
    }
}

/// Observation query engine
#[derive(Clone)]
pub struct Engine {
    reference: Arc<ReferenceData>,
    store: Arc<dyn ObservationStore>,
    writer: Arc<dyn WorkbookWriter>,
    config: EngineConfig,
    rule: JobsRule,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create engine with the bundled CSV writer
    #[must_use]
    pub fn new(reference: Arc<ReferenceData>, store: Arc<dyn ObservationStore>, config: EngineConfig) -> Self {
        let rule = JobsRule::for_reference(&reference);
        Self {
            reference,
            store,
            writer: Arc::new(CsvBundleWriter::new()),
            config,
            rule,
        }
    }

    /// With workbook writer
    #[inline]
    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn WorkbookWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Reference data
    #[inline]
    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Describe what can be queried
    #[must_use]
    pub fn schema(&self) -> SchemaDescription {
        SchemaDescription::describe(&self.reference, &self.config)
    }

    /// Estimated record cost of a spec
    #[must_use]
    pub fn estimate_records(&self, spec: &QuerySpec) -> u64 {
        estimate_records(spec, &self.reference, &self.config)
    }

    /// Answer a JSON request body with canonical rows
    ///
    /// # Errors
    /// Validation failures and failed level reads
    pub async fn query(&self, body: &Value) -> Result<QueryResponse, EngineError> {
        let spec = QuerySpec::from_request(body)?;
        self.query_spec(&spec).await
    }

    /// Answer a parsed spec with canonical rows
    ///
    /// # Errors
    /// Validation failures and failed level reads
    pub async fn query_spec(&self, spec: &QuerySpec) -> Result<QueryResponse, EngineError> {
        let request_id = Ulid::new().to_string();
        let span = tracing::info_span!("query", request_id = %request_id);
        let outcome = self.run(spec).instrument(span).await?;

        let mut meta = ResponseMeta::new(&self.config, request_id, now_rfc3339());
        meta.estimated_records = outcome.estimated;
        meta.returned_records = outcome.built.rows.len();
        meta.truncated = outcome.built.truncated;
        meta.warnings = outcome.warnings(self.config.max_records);

        tracing::info!(
            request_id = %meta.request_id,
            estimated_records = meta.estimated_records,
            returned_records = meta.returned_records,
            truncated = meta.truncated,
            "observations query"
        );
        Ok(QueryResponse {
            meta,
            data: outcome.built.rows,
        })
    }

    /// Pivot matrix for a spec
    ///
    /// # Errors
    /// Validation failures and failed level reads
    pub async fn matrix(&self, spec: &QuerySpec) -> Result<Matrix, EngineError> {
        let outcome = self.run(spec).await?;
        Ok(Matrix::build(&outcome.built.rows))
    }

    /// Render a JSON request body as a downloadable file
    ///
    /// # Errors
    /// Validation failures, failed level reads and writer failures
    pub async fn export(&self, body: &Value) -> Result<ExportFile, EngineError> {
        let spec = QuerySpec::from_request(body)?;
        let request_id = Ulid::new().to_string();
        let span = tracing::info_span!("export", request_id = %request_id);
        let outcome = self.run(&spec).instrument(span).await?;

        let now = Utc::now();
        let metadata = export::product_metadata(&self.config, &now.to_rfc3339_opts(SecondsFormat::Secs, true));
        let single = outcome.request.is_single_series();
        let layout = export::assemble(&outcome.request, outcome.built.rows, metadata);
        let file = export::render(self.writer.as_ref(), &layout, &outcome.request, now.date_naive())?;

        tracing::info!(
            %request_id,
            single_series = single,
            filename = %file.filename,
            bytes = file.bytes.len(),
            "export rendered"
        );
        Ok(file)
    }

    /// Resolve, route, fetch and build rows
    pub(crate) async fn run(&self, spec: &QuerySpec) -> Result<Outcome, EngineError> {
        let estimated = self.estimate_records(spec);
        let request = ResolvedRequest::resolve(spec, &self.reference, &self.config)?;
        let router = LevelRouter::new(&self.reference, &self.config, &self.rule);

        let plan = router.plan(&request);
        tracing::debug!(
            metrics = request.metric_ids.len(),
            regions = request.region_codes.len(),
            levels = plan.len(),
            "query planned"
        );
        let fetched = fetch_all(self.store.as_ref(), plan).await?;
        let built = build_rows(
            &self.reference,
            &self.config,
            router,
            &request.scenarios,
            request.measure,
            &fetched,
        );

        Ok(Outcome {
            request,
            built,
            estimated,
        })
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use riq_catalog::DataType;
    use riq_query::ObservationRow;
    use serde_json::json;

    fn engine(store: InMemoryStore) -> Engine {
        Engine::new(
            Arc::new(ReferenceData::builtin().unwrap()),
            Arc::new(store),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn query_fills_meta() {
        let store = InMemoryStore::new().with_rows(
            "itl1_latest_all",
            [ObservationRow::new("E12000007", "population_total", 2024, 1.0, DataType::Historical)],
        );
        let response = engine(store)
            .query(&json!({"metrics": ["population_total"], "regions": ["UKI"], "selectedYears": [2024]}))
            .await
            .unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.meta.returned_records, 1);
        assert_eq!(response.meta.estimated_records, 1);
        assert!(!response.meta.truncated);
        assert_eq!(response.meta.request_id.len(), 26);
        assert!(response.meta.accessed_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn non_object_body_is_client_error() {
        let err = engine(InMemoryStore::new()).query(&json!("population")).await.unwrap_err();
        assert!(err.is_client_error());
    }
}
