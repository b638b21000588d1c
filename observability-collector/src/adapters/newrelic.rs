//! New Relic adapter: NRQL via the log-filter and GraphQL/NerdGraph query
//! endpoints, third in the fan-out priority order (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use credential_cache::HttpApiClient;
use serde::Deserialize;
use serde_json::json;

use crate::ports::{detect_log_level, CollectionWindow, LogsProvider, MetricsProvider, ProviderError};
use crate::types::{LogEntry, PartialMetrics};

pub struct NewRelicLogsAdapter {
    client: Arc<HttpApiClient>,
    account_id: String,
}

impl NewRelicLogsAdapter {
    pub fn new(client: Arc<HttpApiClient>, account_id: String) -> Self {
        Self { client, account_id }
    }
}

#[derive(Deserialize)]
struct NerdGraphResponse<T> {
    data: Option<NerdGraphData<T>>,
}

#[derive(Deserialize)]
struct NerdGraphData<T> {
    actor: NerdGraphActor<T>,
}

#[derive(Deserialize)]
struct NerdGraphActor<T> {
    account: NerdGraphAccount<T>,
}

#[derive(Deserialize)]
struct NerdGraphAccount<T> {
    nrql: NrqlResult<T>,
}

#[derive(Deserialize)]
struct NrqlResult<T> {
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Deserialize)]
struct LogResult {
    timestamp: Option<i64>,
    message: Option<String>,
}

#[async_trait]
impl LogsProvider for NewRelicLogsAdapter {
    async fn fetch_logs(&self, window: &CollectionWindow) -> Result<Vec<LogEntry>, ProviderError> {
        let nrql = format!(
            "SELECT timestamp, message FROM Log WHERE `service.name` = '{}' SINCE {} UNTIL {} LIMIT {}",
            window.service_name,
            window.start.timestamp(),
            window.end.timestamp(),
            window.remaining_log_budget.min(1000),
        );

        let body = json!({
            "query": "query($id: Int!, $nrql: Nrql!) { actor { account(id: $id) { nrql(query: $nrql) { results } } } }",
            "variables": { "id": self.account_id, "nrql": nrql },
        });

        let response = self
            .client
            .http
            .post(format!("{}/graphql", self.client.base_url))
            .header("API-Key", &self.client.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new("newrelic", e.to_string()))?;

        let parsed: NerdGraphResponse<LogResult> = response
            .json()
            .await
            .map_err(|e| ProviderError::new("newrelic", e.to_string()))?;

        let results = parsed.data.map(|d| d.actor.account.nrql.results).unwrap_or_default();

        let logs = results
            .into_iter()
            .map(|r| {
                let timestamp = r
                    .timestamp
                    .and_then(|ms| DateTime::from_timestamp(ms / 1000, ((ms % 1000) * 1_000_000) as u32))
                    .unwrap_or_else(chrono::Utc::now);
                let message = r.message.unwrap_or_default();
                let level = detect_log_level(&message);
                LogEntry { timestamp, level, message, attributes: HashMap::new() }
            })
            .collect();

        Ok(logs)
    }
}

pub struct NewRelicMetricsAdapter {
    client: Arc<HttpApiClient>,
    account_id: String,
}

impl NewRelicMetricsAdapter {
    pub fn new(client: Arc<HttpApiClient>, account_id: String) -> Self {
        Self { client, account_id }
    }

    async fn run_scalar_nrql(&self, nrql: &str) -> Result<Option<f64>, ProviderError> {
        #[derive(Deserialize)]
        struct ScalarRow {
            #[serde(flatten)]
            fields: HashMap<String, serde_json::Value>,
        }

        let body = json!({
            "query": "query($id: Int!, $nrql: Nrql!) { actor { account(id: $id) { nrql(query: $nrql) { results } } } }",
            "variables": { "id": self.account_id, "nrql": nrql },
        });

        let response = self
            .client
            .http
            .post(format!("{}/graphql", self.client.base_url))
            .header("API-Key", &self.client.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new("newrelic", e.to_string()))?;

        let parsed: NerdGraphResponse<ScalarRow> = response
            .json()
            .await
            .map_err(|e| ProviderError::new("newrelic", e.to_string()))?;

        let results = parsed.data.map(|d| d.actor.account.nrql.results).unwrap_or_default();
        Ok(results.into_iter().find_map(|row| {
            row.fields.values().find_map(|v| v.as_f64())
        }))
    }
}

#[async_trait]
impl MetricsProvider for NewRelicMetricsAdapter {
    async fn fetch_metrics(&self, window: &CollectionWindow) -> Result<PartialMetrics, ProviderError> {
        let svc = &window.service_name;
        let since_hours = (chrono::Utc::now() - window.start).num_hours().max(1);

        let latency_p99 = self
            .run_scalar_nrql(&format!(
                "SELECT percentile(duration, 99) FROM Transaction WHERE appName = '{svc}' SINCE {since_hours} hours ago"
            ))
            .await?
            .map(|v| v * 1000.0);

        let error_rate = self
            .run_scalar_nrql(&format!(
                "SELECT percentage(count(*), WHERE error IS true) FROM Transaction WHERE appName = '{svc}' SINCE {since_hours} hours ago"
            ))
            .await?;

        let throughput_per_minute = self
            .run_scalar_nrql(&format!(
                "SELECT rate(count(*), 1 minute) FROM Transaction WHERE appName = '{svc}' SINCE {since_hours} hours ago"
            ))
            .await?;

        let availability = error_rate.map(|e| 100.0 - e);

        Ok(PartialMetrics {
            latency_p50: None,
            latency_p99,
            error_rate,
            availability,
            throughput_per_minute,
        })
    }
}
