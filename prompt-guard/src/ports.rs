//! Persistence seam for the audit trail this guard writes. The actual table
//! lives in the core's persistence layer, out of scope here (base spec §1).

use async_trait::async_trait;
use domain::SecurityEvent;

/// Sink for `SecurityEvent`s. Failures here must never surface as guard
/// failures — a user message is still safe or blocked on its own merits even
/// if the audit write fails, matching `_store_security_event`'s
/// swallow-and-log behavior in the original.
#[async_trait]
pub trait SecurityEventSink: Send + Sync {
    async fn record(&self, event: SecurityEvent);
}
