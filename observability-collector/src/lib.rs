//! Observability Data Collector (C3): sequential priority fan-out across
//! Grafana/Loki, Datadog, New Relic, and CloudWatch, plus error
//! fingerprinting over the collected logs.
//!
//! This crate does not resolve which providers are configured/healthy for a
//! workspace — that `ExecutionContext` is handed in by the caller (the
//! orchestrator), which is the only place with access to the persisted
//! integration rows.

pub mod adapters;
mod capability;
mod collector;
mod fingerprint;
mod ports;
mod types;

pub use capability::{Capability, ExecutionContext};
pub use collector::{Collector, ProviderSet};
pub use fingerprint::{aggregate_errors_from_logs, extract_stack_trace, fingerprint_error};
pub use ports::{CollectionWindow, LogsProvider, MetricsProvider, ProviderError};
pub use types::{CollectedData, ErrorData, LogEntry, PartialMetrics};
