use std::collections::HashSet;

/// One (provider, data-kind) pair actually configured and healthy for a
/// workspace, per base spec §4.3's `ExecutionContext` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Logs,
    Metrics,
    DatadogLogs,
    DatadogMetrics,
    NewRelicLogs,
    NewRelicMetrics,
    AwsLogs,
    AwsMetrics,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    capabilities: HashSet<Capability>,
}

impl ExecutionContext {
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self { capabilities: capabilities.into_iter().collect() }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
