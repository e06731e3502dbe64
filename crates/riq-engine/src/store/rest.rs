//! PostgREST storage adapter

use super::{ObservationStore, StoreQuery};
use crate::config::RestStoreConfig;
use crate::error::StoreError;
use async_trait::async_trait;
use reqwest::StatusCode;
use riq_query::ObservationRow;
use std::time::Duration;

const REGION_COLUMN: &str = "region_code";

/// Paged reads from `{base_url}/rest/v1/{table}`
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    config: RestStoreConfig,
}

impl RestStore {
    /// Create adapter
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be built
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Adapter configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    async fn fetch_page(
        &self,
        query: &StoreQuery,
        offset: usize,
    ) -> Result<Vec<ObservationRow>, StoreError> {
        let params = build_params(query, offset, self.config.page_size);
        let response = self
            .client
            .get(self.table_url(&query.table))
            .header("apikey", &self.config.api_key)
            .header("authorization", format!("Bearer {}", self.config.bearer()))
            .header("accept", "application/json")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::UnknownTable(query.table.clone()));
        }
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch_all_pages(&self, query: &StoreQuery) -> Result<Vec<ObservationRow>, StoreError> {
        let mut rows = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.fetch_page(query, offset).await?;
            let len = page.len();
            rows.extend(page);
            tracing::trace!(table = %query.table, offset, len, "page fetched");
            if len == 0 || len < self.config.page_size {
                break;
            }
            offset += len;
        }
        Ok(rows)
    }
}

#[async_trait]
impl ObservationStore for RestStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<ObservationRow>, StoreError> {
        let Some(regions) = query.in_values(REGION_COLUMN) else {
            return self.fetch_all_pages(query).await;
        };

        let mut rows = Vec::new();
        for chunk in regions.chunks(self.config.region_chunk.max(1)) {
            let chunked = query.with_in_values(REGION_COLUMN, chunk);
            rows.extend(self.fetch_all_pages(&chunked).await?);
        }
        Ok(rows)
    }
}

/// Query parameters for one page of a table read
#[must_use]
pub fn build_params(query: &StoreQuery, offset: usize, limit: usize) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(query.filters.len() + 4);
    params.push(("select".to_string(), query.select.join(",")));
    params.extend(query.filters.iter().map(super::Filter::to_param));
    if !query.order_by.is_empty() {
        let order = query
            .order_by
            .iter()
            .map(|c| format!("{c}.asc"))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }
    params.push(("offset".to_string(), offset.to_string()));
    params.push(("limit".to_string(), limit.to_string()));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Filter;
    use pretty_assertions::assert_eq;

    #[test]
    fn params_follow_postgrest_shape() {
        let query = StoreQuery::new("itl1_latest_all")
            .with_filter(Filter::is_in("region_code", ["E12000007", "K02000001"]))
            .with_filter(Filter::is_in("metric_id", ["emp_total_jobs", "emp_total_jobs_ni"]))
            .with_filter(Filter::gte("period", 2020))
            .with_filter(Filter::lte("period", 2024));

        let params = build_params(&query, 10_000, 10_000);
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        assert!(pairs[0].1.starts_with("region_code,region_name,metric_id,period"));
        assert_eq!(
            &pairs[1..],
            &[
                ("region_code", "in.(E12000007,K02000001)"),
                ("metric_id", "in.(emp_total_jobs,emp_total_jobs_ni)"),
                ("period", "gte.2020"),
                ("period", "lte.2024"),
                ("order", "metric_id.asc,region_code.asc,period.asc"),
                ("offset", "10000"),
                ("limit", "10000"),
            ]
        );
    }

    #[test]
    fn table_url_and_bearer() {
        let store = RestStore::new(RestStoreConfig::new("https://db.example.test/", "anon")).unwrap();
        assert_eq!(store.table_url("lad_latest_all"), "https://db.example.test/rest/v1/lad_latest_all");
        assert_eq!(store.config().bearer(), "anon");
    }
}
