//! RED (Rate, Errors, Duration) dashboard-readiness — optional extension.
//!
//! Grounded in `original_source/.../rule_engine/schemas.py`'s
//! `REDDashboardReadiness`/`REDMetricStatus`; the original's predicate
//! bodies (`red_rules.py`) were filtered out of the retrieved pack, so this
//! is derived from the same fact indices MET_001/MET_002 already use,
//! consistent with the GLOSSARY's "used as an optional extension."

use serde::{Deserialize, Serialize};

use domain::FactType;

use crate::index::FactIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedCoverage {
    Covered,
    Partial,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedSignalStatus {
    pub signal: &'static str,
    pub coverage: RedCoverage,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedDashboardReadiness {
    pub rate: RedSignalStatus,
    pub errors: RedSignalStatus,
    pub duration: RedSignalStatus,
    pub is_red_ready: bool,
    pub summary: String,
}

/// Off by default: only computed when a caller opts in, since it isn't part
/// of the required logging/metrics gap output.
pub fn assess(index: &FactIndex) -> RedDashboardReadiness {
    let handlers = index.of_type(FactType::HttpHandler);
    let metrics_calls = index.of_type(FactType::MetricsCall);
    let has_handlers = !handlers.is_empty();
    let has_metrics = !metrics_calls.is_empty();

    let handlers_with_metrics = handlers
        .iter()
        .filter(|h| !index.contained_in(h.file_path, h, FactType::MetricsCall).is_empty())
        .count();

    let rate = signal_status("rate", has_handlers, has_metrics, handlers_with_metrics, handlers.len());
    let duration = signal_status("duration", has_handlers, has_metrics, handlers_with_metrics, handlers.len());

    let try_excepts = index.of_type(FactType::TryExcept);
    let try_with_metrics = try_excepts
        .iter()
        .filter(|t| !index.contained_in(t.file_path, t, FactType::MetricsCall).is_empty())
        .count();
    let errors = signal_status(
        "errors",
        !try_excepts.is_empty(),
        has_metrics,
        try_with_metrics,
        try_excepts.len(),
    );

    let is_red_ready = matches!(rate.coverage, RedCoverage::Covered)
        && matches!(errors.coverage, RedCoverage::Covered)
        && matches!(duration.coverage, RedCoverage::Covered);

    let summary = if is_red_ready {
        "RED dashboard (rate/errors/duration) is fully instrumented.".to_string()
    } else {
        "RED dashboard has gaps; see per-signal coverage.".to_string()
    };

    RedDashboardReadiness { rate, errors, duration, is_red_ready, summary }
}

fn signal_status(
    signal: &'static str,
    scope_present: bool,
    has_metrics_at_all: bool,
    covered_count: usize,
    total_count: usize,
) -> RedSignalStatus {
    if !scope_present {
        return RedSignalStatus {
            signal,
            coverage: RedCoverage::Missing,
            note: format!("No instrumentable {signal} scope found in this repository."),
        };
    }
    if !has_metrics_at_all || covered_count == 0 {
        return RedSignalStatus {
            signal,
            coverage: RedCoverage::Missing,
            note: format!("0 of {total_count} {signal} scopes emit metrics."),
        };
    }
    if covered_count == total_count {
        RedSignalStatus {
            signal,
            coverage: RedCoverage::Covered,
            note: format!("All {total_count} {signal} scopes emit metrics."),
        }
    } else {
        RedSignalStatus {
            signal,
            coverage: RedCoverage::Partial,
            note: format!("{covered_count} of {total_count} {signal} scopes emit metrics."),
        }
    }
}
