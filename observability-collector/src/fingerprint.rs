//! Error fingerprinting: turn a pile of raw ERROR-level log messages into a
//! small number of grouped, trend-trackable error signatures.
//!
//! Grounded verbatim (pattern list, truncation lengths, regex order) in
//! `original_source/.../data_collector/service.py`'s `_fingerprint_error`,
//! `_extract_stack_trace`, and `_aggregate_errors_from_logs`.

use std::collections::HashMap;
use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;

use crate::types::{ErrorData, LogEntry};

const MESSAGE_SAMPLE_MAX: usize = 500;
const STACK_TRACE_MAX: usize = 2000;
const MAX_ENDPOINTS: usize = 10;

static ERROR_TYPE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\w+Error):",
        r"(\w+Exception):",
        r"Error:\s*(\w+)",
        r"Exception:\s*(\w+)",
        r"^\[?(\w+Error)\]?",
        r"^\[?(\w+Exception)\]?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static error-type pattern"))
    .collect()
});

static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b").unwrap()
});
static TIMESTAMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").unwrap());
static NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").unwrap());
static DQUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"]*""#).unwrap());
static SQUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'[^']*'").unwrap());

static STACK_TRACE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)(Traceback \(most recent call last\):.*?)(?:\n\n|\z)",
        r"(?s)(at [\w.$]+\([\w.]+:\d+\).*?)(?:\n\n|\z)",
        r#"(?s)(File "[^"]+", line \d+.*?)(?:\n\n|\z)"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static stack-trace pattern"))
    .collect()
});

fn extract_error_type(message: &str) -> String {
    for pattern in ERROR_TYPE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(message) {
            if let Some(m) = captures.get(1) {
                return m.as_str().to_string();
            }
        }
    }
    "UnknownError".to_string()
}

fn normalize_message(message: &str) -> String {
    let normalized = UUID_RE.replace_all(message, "<UUID>");
    let normalized = TIMESTAMP_RE.replace_all(&normalized, "<TIMESTAMP>");
    let normalized = NUM_RE.replace_all(&normalized, "<NUM>");
    let normalized = DQUOTE_RE.replace_all(&normalized, "\"<STR>\"");
    let normalized = SQUOTE_RE.replace_all(&normalized, "'<STR>'");
    normalized.into_owned()
}

/// Returns `(error_type, fingerprint)` where fingerprint is the first 16 hex
/// chars of `MD5(error_type + ":" + normalized_message)`.
pub fn fingerprint_error(message: &str) -> (String, String) {
    let error_type = extract_error_type(message);
    let normalized = normalize_message(message);

    let mut hasher = Md5::new();
    hasher.update(format!("{error_type}:{normalized}").as_bytes());
    let digest = hasher.finalize();
    let fingerprint = digest.iter().map(|b| format!("{b:02x}")).collect::<String>()[..16].to_string();

    (error_type, fingerprint)
}

pub fn extract_stack_trace(message: &str) -> Option<String> {
    for pattern in STACK_TRACE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(message) {
            if let Some(m) = captures.get(1) {
                let trace = m.as_str();
                let truncated: String = trace.chars().take(STACK_TRACE_MAX).collect();
                return Some(truncated);
            }
        }
    }
    None
}

struct Accumulator {
    error_type: String,
    message_sample: String,
    count: u64,
    first_seen: chrono::DateTime<chrono::Utc>,
    last_seen: chrono::DateTime<chrono::Utc>,
    endpoints: Vec<String>,
    stack_trace: Option<String>,
}

/// Filters `logs` to level `ERROR`, groups by fingerprint, and returns the
/// aggregation sorted by count descending.
pub fn aggregate_errors_from_logs(logs: &[LogEntry]) -> Vec<ErrorData> {
    let mut by_fingerprint: HashMap<String, Accumulator> = HashMap::new();

    for log in logs.iter().filter(|l| l.level == "ERROR") {
        let (error_type, fingerprint) = fingerprint_error(&log.message);
        let endpoint = log
            .attributes
            .get("endpoint")
            .or_else(|| log.attributes.get("path"))
            .cloned();

        match by_fingerprint.get_mut(&fingerprint) {
            Some(acc) => {
                acc.count += 1;
                if log.timestamp > acc.last_seen {
                    acc.last_seen = log.timestamp;
                }
                if log.timestamp < acc.first_seen {
                    acc.first_seen = log.timestamp;
                }
                if let Some(ep) = endpoint {
                    if !acc.endpoints.contains(&ep) {
                        acc.endpoints.push(ep);
                    }
                }
            }
            None => {
                let message_sample: String = log.message.chars().take(MESSAGE_SAMPLE_MAX).collect();
                by_fingerprint.insert(
                    fingerprint.clone(),
                    Accumulator {
                        error_type,
                        message_sample,
                        count: 1,
                        first_seen: log.timestamp,
                        last_seen: log.timestamp,
                        endpoints: endpoint.into_iter().collect(),
                        stack_trace: extract_stack_trace(&log.message),
                    },
                );
            }
        }
    }

    let mut errors: Vec<ErrorData> = by_fingerprint
        .into_iter()
        .map(|(fingerprint, acc)| ErrorData {
            fingerprint,
            error_type: acc.error_type,
            message_sample: acc.message_sample,
            count: acc.count,
            first_seen: acc.first_seen,
            last_seen: acc.last_seen,
            endpoints: acc.endpoints.into_iter().take(MAX_ENDPOINTS).collect(),
            stack_trace: acc.stack_trace,
        })
        .collect();

    errors.sort_by(|a, b| b.count.cmp(&a.count));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn log(level: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp: chrono::Utc::now(),
            level: level.to_string(),
            message: message.to_string(),
            attributes: Map::new(),
        }
    }

    #[test]
    fn extracts_known_error_type() {
        let (ty, _) = fingerprint_error("ConnectionError: could not reach host");
        assert_eq!(ty, "ConnectionError");
    }

    #[test]
    fn defaults_to_unknown_error_type() {
        let (ty, _) = fingerprint_error("something went sideways");
        assert_eq!(ty, "UnknownError");
    }

    #[test]
    fn fingerprint_is_stable_across_variable_values() {
        let (_, fp1) = fingerprint_error(
            "ValueError: request 550e8400-e29b-41d4-a716-446655440000 failed at 2024-01-01T10:00:00 after 42 retries",
        );
        let (_, fp2) = fingerprint_error(
            "ValueError: request 11111111-2222-3333-4444-555555555555 failed at 2024-06-01T09:30:00 after 7 retries",
        );
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.len(), 16);
    }

    #[test]
    fn fingerprint_differs_for_distinct_messages() {
        let (_, fp1) = fingerprint_error("ValueError: bad input");
        let (_, fp2) = fingerprint_error("KeyError: missing field");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn extracts_python_traceback() {
        let message = "Traceback (most recent call last):\n  File \"app.py\", line 10\nValueError: bad\n\nmore text";
        let trace = extract_stack_trace(message).unwrap();
        assert!(trace.starts_with("Traceback (most recent call last):"));
        assert!(!trace.contains("more text"));
    }

    #[test]
    fn aggregates_and_sorts_by_count_descending() {
        let logs = vec![
            log("ERROR", "ValueError: bad input 1"),
            log("ERROR", "ValueError: bad input 2"),
            log("ERROR", "KeyError: missing field"),
            log("INFO", "all good"),
        ];
        let errors = aggregate_errors_from_logs(&logs);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].count, 2);
        assert_eq!(errors[0].error_type, "ValueError");
    }

    #[test]
    fn message_sample_truncated_to_500_chars() {
        let long_message = format!("ValueError: {}", "x".repeat(600));
        let logs = vec![log("ERROR", &long_message)];
        let errors = aggregate_errors_from_logs(&logs);
        assert_eq!(errors[0].message_sample.chars().count(), 500);
    }
}
