//! Grafana/Loki adapter: LogQL for logs, PromQL for the golden-signal
//! metrics. Queried first in the fan-out priority order (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use credential_cache::HttpApiClient;
use serde::Deserialize;

use crate::ports::{detect_log_level, CollectionWindow, LogsProvider, MetricsProvider, ProviderError};
use crate::types::{LogEntry, PartialMetrics};

const DEFAULT_SERVICE_LABEL: &str = "job";

pub struct GrafanaLogsAdapter {
    client: Arc<HttpApiClient>,
}

impl GrafanaLogsAdapter {
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct LokiResponse {
    data: LokiData,
}

#[derive(Deserialize)]
struct LokiData {
    result: Vec<LokiStream>,
}

#[derive(Deserialize)]
struct LokiStream {
    #[serde(default)]
    stream: HashMap<String, String>,
    #[serde(default)]
    values: Vec<[String; 2]>,
}

#[async_trait]
impl LogsProvider for GrafanaLogsAdapter {
    async fn fetch_logs(&self, window: &CollectionWindow) -> Result<Vec<LogEntry>, ProviderError> {
        let query = format!("{{{DEFAULT_SERVICE_LABEL}=\"{}\"}}", window.service_name);
        let url = format!("{}/loki/api/v1/query_range", self.client.base_url);
        let limit = window.remaining_log_budget.min(1000);

        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.client.api_key)
            .query(&[
                ("query", query.as_str()),
                ("start", &(window.start.timestamp_nanos_opt().unwrap_or_default()).to_string()),
                ("end", &(window.end.timestamp_nanos_opt().unwrap_or_default()).to_string()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new("grafana", e.to_string()))?;

        let parsed: LokiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new("grafana", e.to_string()))?;

        let mut logs = Vec::new();
        for stream in parsed.data.result {
            for [timestamp_ns, message] in stream.values {
                let ns: i64 = timestamp_ns.parse().unwrap_or(0);
                let timestamp = DateTime::from_timestamp(ns / 1_000_000_000, (ns % 1_000_000_000) as u32)
                    .unwrap_or_else(chrono::Utc::now);
                logs.push(LogEntry {
                    timestamp,
                    level: detect_log_level(&message),
                    message,
                    attributes: stream.stream.clone(),
                });
            }
        }
        Ok(logs)
    }
}

pub struct GrafanaMetricsAdapter {
    client: Arc<HttpApiClient>,
}

impl GrafanaMetricsAdapter {
    pub fn new(client: Arc<HttpApiClient>) -> Self {
        Self { client }
    }

    async fn query_scalar(&self, promql: &str, window: &CollectionWindow) -> Result<Option<f64>, ProviderError> {
        let url = format!("{}/api/v1/query_range", self.client.base_url);
        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(&self.client.api_key)
            .query(&[
                ("query", promql),
                ("start", &window.start.timestamp().to_string()),
                ("end", &window.end.timestamp().to_string()),
                ("step", "3600"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new("grafana", e.to_string()))?;

        #[derive(Deserialize)]
        struct PromResponse {
            data: PromData,
        }
        #[derive(Deserialize)]
        struct PromData {
            result: Vec<PromSeries>,
        }
        #[derive(Deserialize)]
        struct PromSeries {
            values: Vec<(f64, String)>,
        }

        let parsed: PromResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new("grafana", e.to_string()))?;

        let samples: Vec<f64> = parsed
            .data
            .result
            .into_iter()
            .flat_map(|s| s.values)
            .filter_map(|(_, v)| v.parse::<f64>().ok())
            .collect();

        if samples.is_empty() {
            return Ok(None);
        }
        Ok(Some(samples.iter().sum::<f64>() / samples.len() as f64))
    }
}

#[async_trait]
impl MetricsProvider for GrafanaMetricsAdapter {
    async fn fetch_metrics(&self, window: &CollectionWindow) -> Result<PartialMetrics, ProviderError> {
        let svc = &window.service_name;

        let latency_p99 = self
            .query_scalar(&format!("histogram_quantile(0.99, sum(rate(http_request_duration_seconds_bucket{{job=\"{svc}\"}}[5m])) by (le))"), window)
            .await?
            .map(|v| v * 1000.0);
        let latency_p50 = self
            .query_scalar(&format!("histogram_quantile(0.50, sum(rate(http_request_duration_seconds_bucket{{job=\"{svc}\"}}[5m])) by (le))"), window)
            .await?
            .map(|v| v * 1000.0);
        let error_rate = self
            .query_scalar(&format!("sum(rate(http_requests_total{{job=\"{svc}\",status=~\"5..\"}}[5m])) / sum(rate(http_requests_total{{job=\"{svc}\"}}[5m])) * 100"), window)
            .await?;
        let throughput_per_minute = self
            .query_scalar(&format!("sum(rate(http_requests_total{{job=\"{svc}\"}}[5m])) * 60"), window)
            .await?;
        let availability = error_rate.map(|e| 100.0 - e);

        Ok(PartialMetrics { latency_p50, latency_p99, error_rate, availability, throughput_per_minute })
    }
}
