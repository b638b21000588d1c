use std::sync::Arc;

/// One entry per (provider, data-kind) pair the cache can hand out a client
/// for, per base spec §4.2's `kind ∈ {cloudwatch_logs, cloudwatch_metrics,
/// datadog_*, newrelic_*, grafana_*}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientKind {
    CloudWatchLogs,
    CloudWatchMetrics,
    DatadogLogs,
    DatadogMetrics,
    NewRelicLogs,
    NewRelicMetrics,
    GrafanaLogs,
    GrafanaMetrics,
}

/// A thin authenticated HTTP client for the reqwest-based providers
/// (Datadog, New Relic, Grafana/Loki all speak plain HTTPS + API-key
/// headers, unlike CloudWatch's SDK-mediated SigV4).
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    pub http: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub app_key: Option<String>,
}

/// The concrete client handed out by [`crate::ClientCache::get_client`].
#[derive(Clone)]
pub enum Client {
    CloudWatchLogs(Arc<aws_sdk_cloudwatchlogs::Client>),
    CloudWatchMetrics(Arc<aws_sdk_cloudwatch::Client>),
    Http(Arc<HttpApiClient>),
}

impl Client {
    pub fn as_cloudwatch_logs(&self) -> Option<&aws_sdk_cloudwatchlogs::Client> {
        match self {
            Client::CloudWatchLogs(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_cloudwatch_metrics(&self) -> Option<&aws_sdk_cloudwatch::Client> {
        match self {
            Client::CloudWatchMetrics(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_http(&self) -> Option<&HttpApiClient> {
        match self {
            Client::Http(c) => Some(c),
            _ => None,
        }
    }
}
