//! Datadog adapter: Logs Search API v2 + the metrics query DSL, second in
//! the fan-out priority order (§4.3).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use credential_cache::HttpApiClient;
use serde::Deserialize;
use serde_json::json;

use crate::ports::{CollectionWindow, LogsProvider, MetricsProvider, ProviderError};
use crate::types::{LogEntry, PartialMetrics};

pub struct DatadogLogsAdapter {
    client: Arc<HttpApiClient>,
}

impl DatadogLogsAdapter {
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct SearchLogsResponse {
    #[serde(default)]
    data: Vec<DatadogLog>,
}

#[derive(Deserialize)]
struct DatadogLog {
    attributes: Option<DatadogLogAttributes>,
}

#[derive(Deserialize)]
struct DatadogLogAttributes {
    timestamp: Option<String>,
    message: Option<String>,
    status: Option<String>,
    service: Option<String>,
    host: Option<String>,
}

#[async_trait]
impl LogsProvider for DatadogLogsAdapter {
    async fn fetch_logs(&self, window: &CollectionWindow) -> Result<Vec<LogEntry>, ProviderError> {
        let body = json!({
            "filter": {
                "query": format!("service:{}", window.service_name),
                "from": window.start.to_rfc3339(),
                "to": window.end.to_rfc3339(),
            },
            "sort": "-timestamp",
            "page": { "limit": window.remaining_log_budget.min(1000) },
        });

        let url = format!("{}/api/v2/logs/events/search", self.client.base_url);
        let response = self
            .client
            .http
            .post(url)
            .header("DD-API-KEY", &self.client.api_key)
            .header(
                "DD-APPLICATION-KEY",
                self.client.app_key.as_deref().unwrap_or_default(),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new("datadog", e.to_string()))?;

        let parsed: SearchLogsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new("datadog", e.to_string()))?;

        let logs = parsed
            .data
            .into_iter()
            .filter_map(|entry| entry.attributes)
            .map(|attrs| {
                let timestamp = attrs
                    .timestamp
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .unwrap_or_else(chrono::Utc::now);
                let message = attrs.message.unwrap_or_default();
                let level = attrs.status.unwrap_or_else(|| "INFO".to_string()).to_uppercase();

                let mut attributes = std::collections::HashMap::new();
                if let Some(service) = attrs.service {
                    attributes.insert("service".to_string(), service);
                }
                if let Some(host) = attrs.host {
                    attributes.insert("host".to_string(), host);
                }

                LogEntry { timestamp, level, message, attributes }
            })
            .collect();

        Ok(logs)
    }
}

pub struct DatadogMetricsAdapter {
    client: Arc<HttpApiClient>,
}

impl DatadogMetricsAdapter {
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }

    async fn query(&self, query: &str, window: &CollectionWindow) -> Result<Option<f64>, ProviderError> {
        #[derive(Deserialize)]
        struct QueryResponse {
            #[serde(default)]
            series: Vec<Series>,
        }
        #[derive(Deserialize)]
        struct Series {
            #[serde(default)]
            pointlist: Vec<(f64, Option<f64>)>,
        }

        let url = format!("{}/api/v1/query", self.client.base_url);
        let response = self
            .client
            .http
            .get(url)
            .header("DD-API-KEY", &self.client.api_key)
            .header(
                "DD-APPLICATION-KEY",
                self.client.app_key.as_deref().unwrap_or_default(),
            )
            .query(&[
                ("query", query),
                ("from", &window.start.timestamp().to_string()),
                ("to", &window.end.timestamp().to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new("datadog", e.to_string()))?;

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new("datadog", e.to_string()))?;

        let values: Vec<f64> = parsed
            .series
            .into_iter()
            .flat_map(|s| s.pointlist)
            .filter_map(|(_, v)| v)
            .collect();

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }
}

#[async_trait]
impl MetricsProvider for DatadogMetricsAdapter {
    async fn fetch_metrics(&self, window: &CollectionWindow) -> Result<PartialMetrics, ProviderError> {
        let svc = &window.service_name;

        let latency_p99 = self
            .query(&format!("avg:trace.http.request.duration.by.service.99p{{service:{svc}}}"), window)
            .await?
            .map(|v| v / 1_000_000.0);

        let error_rate = self
            .query(
                &format!(
                    "sum:trace.http.request.errors{{service:{svc}}}.as_rate() / sum:trace.http.request.hits{{service:{svc}}}.as_rate() * 100"
                ),
                window,
            )
            .await?;

        let throughput_per_minute = self
            .query(&format!("sum:trace.http.request.hits{{service:{svc}}}.as_rate()"), window)
            .await?
            .map(|v| v * 60.0);

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
