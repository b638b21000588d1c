pub mod cloudwatch;
pub mod datadog;
pub mod grafana;
pub mod newrelic;
