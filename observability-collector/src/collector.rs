use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::capability::{Capability, ExecutionContext};
use crate::fingerprint::aggregate_errors_from_logs;
use crate::ports::{CollectionWindow, LogsProvider, MetricsProvider};
use crate::types::{CollectedData, PartialMetrics};

const MAX_LOG_SAMPLES: usize = 1000;

/// One slot per provider, in the fixed priority order logs are fanned out
/// in (base spec §4.3: Grafana/Loki → Datadog → New Relic → CloudWatch).
/// `None` means the provider isn't configured/healthy for this workspace —
/// callers build this from the resolved `ExecutionContext` rather than the
/// collector deciding availability itself.
#[derive(Default)]
pub struct ProviderSet {
    pub grafana_logs: Option<Arc<dyn LogsProvider>>,
    pub datadog_logs: Option<Arc<dyn LogsProvider>>,
    pub newrelic_logs: Option<Arc<dyn LogsProvider>>,
    pub cloudwatch_logs: Option<Arc<dyn LogsProvider>>,

    pub grafana_metrics: Option<Arc<dyn MetricsProvider>>,
    pub datadog_metrics: Option<Arc<dyn MetricsProvider>>,
    pub newrelic_metrics: Option<Arc<dyn MetricsProvider>>,
    pub cloudwatch_metrics: Option<Arc<dyn MetricsProvider>>,
}

pub struct Collector {
    providers: ProviderSet,
}

impl Collector {
    pub fn new(providers: ProviderSet) -> Self {
        Self { providers }
    }

    pub async fn collect(
        &self,
        workspace_id: Uuid,
        service_name: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        context: &ExecutionContext,
    ) -> CollectedData {
        info!(service = service_name, "collecting logs");
        let logs = self
            .collect_logs(workspace_id, service_name, window_start, window_end, context)
            .await;

        info!(service = service_name, "collecting metrics");
        let metrics = self
            .collect_metrics(workspace_id, service_name, window_start, window_end, context)
            .await;

        let errors = aggregate_errors_from_logs(&logs);
        let log_count = logs.len();
        let metric_count = metrics.non_null_count();

        CollectedData {
            logs: logs.into_iter().take(MAX_LOG_SAMPLES).collect(),
            log_count,
            metrics,
            metric_count,
            errors,
        }
    }

    async fn collect_logs(
        &self,
        workspace_id: Uuid,
        service_name: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        context: &ExecutionContext,
    ) -> Vec<crate::types::LogEntry> {
        let mut logs = Vec::new();

        let attempts: [(Capability, &Option<Arc<dyn LogsProvider>>, &str); 4] = [
            (Capability::Logs, &self.providers.grafana_logs, "grafana"),
            (Capability::DatadogLogs, &self.providers.datadog_logs, "datadog"),
            (Capability::NewRelicLogs, &self.providers.newrelic_logs, "newrelic"),
            (Capability::AwsLogs, &self.providers.cloudwatch_logs, "cloudwatch"),
        ];

        for (capability, provider, name) in attempts {
            if logs.len() >= MAX_LOG_SAMPLES {
                break;
            }
            if !context.has_capability(capability) {
                continue;
            }
            let Some(provider) = provider else { continue };

            let window = CollectionWindow {
                workspace_id,
                service_name: service_name.to_string(),
                start: window_start,
                end: window_end,
                remaining_log_budget: MAX_LOG_SAMPLES - logs.len(),
            };

            match provider.fetch_logs(&window).await {
                Ok(fetched) => {
                    info!(provider = name, count = fetched.len(), "collected logs");
                    logs.extend(fetched);
                }
                Err(err) => warn!(provider = name, error = %err, "failed to collect logs"),
            }
        }

        if logs.is_empty() {
            warn!(service = service_name, "no logs collected");
        }
        logs
    }

    async fn collect_metrics(
        &self,
        workspace_id: Uuid,
        service_name: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        context: &ExecutionContext,
    ) -> PartialMetrics {
        let mut merged = PartialMetrics::default();

        let attempts: [(Capability, &Option<Arc<dyn MetricsProvider>>, &str); 4] = [
            (Capability::Metrics, &self.providers.grafana_metrics, "grafana"),
            (Capability::DatadogMetrics, &self.providers.datadog_metrics, "datadog"),
            (Capability::NewRelicMetrics, &self.providers.newrelic_metrics, "newrelic"),
            (Capability::AwsMetrics, &self.providers.cloudwatch_metrics, "cloudwatch"),
        ];

        for (capability, provider, name) in attempts {
            if !context.has_capability(capability) {
                continue;
            }
            let Some(provider) = provider else { continue };

            let window = CollectionWindow {
                workspace_id,
                service_name: service_name.to_string(),
                start: window_start,
                end: window_end,
                remaining_log_budget: 0,
            };

            match provider.fetch_metrics(&window).await {
                Ok(partial) => {
                    info!(provider = name, "collected metrics");
                    merged.merge_from(partial);
                }
                Err(err) => warn!(provider = name, error = %err, "failed to collect metrics"),
            }
        }

        merged
    }
}
