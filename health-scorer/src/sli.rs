//! Real-metric SLI calculation (base spec §4.7). Grounded in
//! `original_source/.../sli_indicator/service.py`'s
//! `_calculate_{availability,latency,error_rate,throughput}_sli`.

use domain::{ReviewSli, Trend};
use observability_collector::PartialMetrics;
use uuid::Uuid;

const TARGET_AVAILABILITY: f64 = 99.9;
const TARGET_LATENCY_P99_MS: f64 = 300.0;
const TARGET_ERROR_RATE_PCT: f64 = 1.0;

/// Previous SLI scores by name, looked up from the most recent completed
/// review — NaN/missing previous values surface as `None`, never a default.
pub fn previous_scores(previous_slis: &[ReviewSli]) -> std::collections::HashMap<&str, u8> {
    previous_slis.iter().map(|s| (s.name.as_str(), s.score)).collect()
}

pub fn calculate(
    review_id: Uuid,
    metrics: &PartialMetrics,
    previous: &std::collections::HashMap<&str, u8>,
) -> Vec<ReviewSli> {
    vec![
        availability_sli(review_id, metrics.availability, previous.get("availability").copied()),
        latency_sli(review_id, metrics.latency_p99, previous.get("latency_p99").copied()),
        error_rate_sli(review_id, metrics.error_rate, previous.get("error_rate").copied()),
        throughput_sli(review_id, metrics.throughput_per_minute, previous.get("throughput").copied()),
    ]
}

fn non_nan(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn trend_for(score: u8, previous: Option<u8>) -> Option<Trend> {
    previous.map(|p| Trend::from_delta(score as f64, p as f64))
}

fn availability_sli(review_id: Uuid, actual: Option<f64>, previous: Option<u8>) -> ReviewSli {
    let actual = non_nan(actual);
    let score = actual.map(|a| ((a / TARGET_AVAILABILITY) * 100.0).min(100.0) as u8).unwrap_or(0);

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "availability".to_string(),
        category: "reliability".to_string(),
        score,
        previous_score: previous,
        trend: trend_for(score, previous),
        target: format!("{TARGET_AVAILABILITY}%"),
        actual: actual.map(|a| format!("{a:.2}%")).unwrap_or_default(),
        unit: "percent".to_string(),
        data_source: "metrics".to_string(),
    }
}

fn latency_sli(review_id: Uuid, actual: Option<f64>, previous: Option<u8>) -> ReviewSli {
    let actual = non_nan(actual);
    let score = actual
        .map(|p| (((1.0 - (p / (TARGET_LATENCY_P99_MS * 2.0))) * 100.0).clamp(0.0, 100.0)) as u8)
        .unwrap_or(0);

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "latency_p99".to_string(),
        category: "performance".to_string(),
        score,
        previous_score: previous,
        trend: trend_for(score, previous),
        target: format!("{TARGET_LATENCY_P99_MS}ms"),
        actual: actual.map(|a| format!("{a:.0}ms")).unwrap_or_default(),
        unit: "ms".to_string(),
        data_source: "metrics".to_string(),
    }
}

fn error_rate_sli(review_id: Uuid, actual: Option<f64>, previous: Option<u8>) -> ReviewSli {
    let actual = non_nan(actual);
    let score = actual
        .map(|r| (((1.0 - ((r * 100.0) / TARGET_ERROR_RATE_PCT)) * 100.0).clamp(0.0, 100.0)) as u8)
        .unwrap_or(0);

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "error_rate".to_string(),
        category: "reliability".to_string(),
        score,
        previous_score: previous,
        trend: trend_for(score, previous),
        target: format!("{TARGET_ERROR_RATE_PCT}%"),
        actual: actual.map(|a| format!("{:.2}%", a * 100.0)).unwrap_or_default(),
        unit: "percent".to_string(),
        data_source: "metrics".to_string(),
    }
}

fn throughput_sli(review_id: Uuid, actual: Option<f64>, previous: Option<u8>) -> ReviewSli {
    let actual = non_nan(actual);
    let score = if actual.is_some() { 100 } else { 0 };

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "throughput".to_string(),
        category: "performance".to_string(),
        score,
        previous_score: previous,
        trend: actual.and(trend_for(score, previous)),
        target: String::new(),
        actual: actual.map(|a| format!("{a:.0} req/min")).unwrap_or_default(),
        unit: "req/min".to_string(),
        data_source: "metrics".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_metric_scores_zero_with_no_trend() {
        let metrics = PartialMetrics::default();
        let previous = std::collections::HashMap::new();
        let slis = calculate(Uuid::new_v4(), &metrics, &previous);
        assert!(slis.iter().all(|s| s.score == 0 && s.trend.is_none()));
    }

    #[test]
    fn nan_is_treated_as_missing() {
        let metrics = PartialMetrics {
            availability: Some(f64::NAN),
            ..Default::default()
        };
        let previous = std::collections::HashMap::new();
        let slis = calculate(Uuid::new_v4(), &metrics, &previous);
        let availability = slis.iter().find(|s| s.name == "availability").unwrap();
        assert_eq!(availability.score, 0);
        assert!(availability.actual.is_empty());
    }

    #[test]
    fn healthy_availability_scores_near_100() {
        let metrics = PartialMetrics { availability: Some(99.95), ..Default::default() };
        let previous = std::collections::HashMap::new();
        let slis = calculate(Uuid::new_v4(), &metrics, &previous);
        let availability = slis.iter().find(|s| s.name == "availability").unwrap();
        assert_eq!(availability.score, 100);
    }

    #[test]
    fn trend_reflects_score_delta() {
        let metrics = PartialMetrics { availability: Some(99.95), ..Default::default() };
        let mut previous = std::collections::HashMap::new();
        previous.insert("availability", 50u8);
        let slis = calculate(Uuid::new_v4(), &metrics, &previous);
        let availability = slis.iter().find(|s| s.name == "availability").unwrap();
        assert_eq!(availability.trend, Some(Trend::Up));
    }
}
