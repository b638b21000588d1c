//! CloudWatch adapter: last in the fan-out priority order (§4.3). Log group
//! discovery by service name is not a standard AWS concept, so logs try a
//! small hardcoded set of name patterns until one yields events.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_cloudwatch::Client as CloudWatchMetricsClient;
use aws_sdk_cloudwatchlogs::Client as CloudWatchLogsClient;
use chrono::DateTime;

use crate::ports::{CollectionWindow, LogsProvider, MetricsProvider, ProviderError};
use crate::types::{LogEntry, PartialMetrics};

const PER_PATTERN_LIMIT: i32 = 500;

fn log_group_patterns(service_name: &str) -> [String; 4] {
    [
        format!("/aws/lambda/{service_name}"),
        format!("/ecs/{service_name}"),
        format!("/aws/ecs/{service_name}"),
        format!("/{service_name}"),
    ]
}

pub struct CloudWatchLogsAdapter {
    client: CloudWatchLogsClient,
}

impl CloudWatchLogsAdapter {
    pub fn new(client: CloudWatchLogsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogsProvider for CloudWatchLogsAdapter {
    async fn fetch_logs(&self, window: &CollectionWindow) -> Result<Vec<LogEntry>, ProviderError> {
        let mut logs = Vec::new();

        for log_group_name in log_group_patterns(&window.service_name) {
            if logs.len() >= window.remaining_log_budget {
                break;
            }
            let limit = ((window.remaining_log_budget - logs.len()) as i32).min(PER_PATTERN_LIMIT);

            let result = self
                .client
                .filter_log_events()
                .log_group_name(&log_group_name)
                .filter_pattern("ERROR")
                .start_time(window.start.timestamp_millis())
                .end_time(window.end.timestamp_millis())
                .limit(limit)
                .send()
                .await;

            let response = match result {
                Ok(r) => r,
                Err(_) => continue, // log group likely does not exist; try the next pattern
            };

            for event in response.events() {
                let timestamp_ms = event.timestamp().unwrap_or_default();
                let timestamp = DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_else(chrono::Utc::now);
                let message = event.message().unwrap_or_default().trim().to_string();
                let level = crate::ports::detect_log_level(&message);

                let mut attributes = HashMap::new();
                attributes.insert("logGroup".to_string(), log_group_name.clone());

                logs.push(LogEntry { timestamp, level, message, attributes });
            }

            if logs.len() >= window.remaining_log_budget {
                break;
            }
        }

        Ok(logs)
    }
}

pub struct CloudWatchMetricsAdapter {
    client: CloudWatchMetricsClient,
}

impl CloudWatchMetricsAdapter {
    pub fn new(client: CloudWatchMetricsClient) -> Self {
        Self { client }
    }

    async fn statistic_average(
        &self,
        namespace: &str,
        metric_name: &str,
        dimension_value: &str,
        window: &CollectionWindow,
        statistic: aws_sdk_cloudwatch::types::Statistic,
    ) -> Result<Option<f64>, ProviderError> {
        let dimension = aws_sdk_cloudwatch::types::Dimension::builder()
            .name("FunctionName")
            .value(dimension_value)
            .build();

        let response = self
            .client
            .get_metric_statistics()
            .namespace(namespace)
            .metric_name(metric_name)
            .dimensions(dimension)
            .start_time(aws_sdk_cloudwatch::primitives::DateTime::from_secs(window.start.timestamp()))
            .end_time(aws_sdk_cloudwatch::primitives::DateTime::from_secs(window.end.timestamp()))
            .period(3600)
            .statistics(statistic)
            .send()
            .await
            .map_err(|e| ProviderError::new("cloudwatch", e.to_string()))?;

        let values: Vec<f64> = response
            .datapoints()
            .iter()
            .filter_map(|dp| dp.average().or(dp.sum()))
            .collect();

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }

    async fn sum(
        &self,
        namespace: &str,
        metric_name: &str,
        dimension_value: &str,
        window: &CollectionWindow,
    ) -> Result<f64, ProviderError> {
        let dimension = aws_sdk_cloudwatch::types::Dimension::builder()
            .name("FunctionName")
            .value(dimension_value)
            .build();

        let response = self
            .client
            .get_metric_statistics()
            .namespace(namespace)
            .metric_name(metric_name)
            .dimensions(dimension)
            .start_time(aws_sdk_cloudwatch::primitives::DateTime::from_secs(window.start.timestamp()))
            .end_time(aws_sdk_cloudwatch::primitives::DateTime::from_secs(window.end.timestamp()))
            .period(3600)
            .statistics(aws_sdk_cloudwatch::types::Statistic::Sum)
            .send()
            .await
            .map_err(|e| ProviderError::new("cloudwatch", e.to_string()))?;

        Ok(response.datapoints().iter().filter_map(|dp| dp.sum()).sum())
    }
}

#[async_trait]
impl MetricsProvider for CloudWatchMetricsAdapter {
    async fn fetch_metrics(&self, window: &CollectionWindow) -> Result<PartialMetrics, ProviderError> {
        let svc = &window.service_name;

        let latency_p99 = self
            .statistic_average("AWS/Lambda", "Duration", svc, window, aws_sdk_cloudwatch::types::Statistic::Average)
            .await?;

        let error_sum = self.sum("AWS/Lambda", "Errors", svc, window).await?;
        let invocation_sum = self.sum("AWS/Lambda", "Invocations", svc, window).await?;

        let (error_rate, availability, throughput_per_minute) = if invocation_sum > 0.0 {
            let error_rate = (error_sum / invocation_sum) * 100.0;
            let total_minutes = (window.end - window.start).num_seconds() as f64 / 60.0;
            let throughput = if total_minutes > 0.0 { Some(invocation_sum / total_minutes) } else { None };
            (Some(error_rate), Some(100.0 - error_rate), throughput)
        } else {
            (None, None, None)
        };

        Ok(PartialMetrics {
            latency_p50: None,
            latency_p99,
            error_rate,
            availability,
            throughput_per_minute,
        })
    }
}
