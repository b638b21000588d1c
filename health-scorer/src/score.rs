//! Deterministic health scoring (base spec §4.7). Grounded in
//! `original_source/.../health_scorer/service.py::HealthScorerService`.

use observability_collector::PartialMetrics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthScores {
    pub overall: u8,
    pub reliability: u8,
    pub performance: u8,
    pub observability: u8,
}

pub fn calculate(metrics: &PartialMetrics, gaps_count: usize) -> HealthScores {
    let reliability = score_error_rate(metrics.error_rate) + score_availability(metrics.availability);
    let performance = score_performance(metrics.latency_p99);
    let observability = score_observability(gaps_count);

    let overall = (reliability as f64 * 0.4 + performance as f64 * 0.3 + observability as f64 * 0.3) as u8;

    HealthScores { overall, reliability, performance, observability }
}

fn score_error_rate(error_rate: Option<f64>) -> u8 {
    match error_rate {
        None => 25,
        Some(r) if r < 0.001 => 50,
        Some(r) if r < 0.01 => 40,
        Some(r) if r < 0.05 => 25,
        Some(_) => 10,
    }
}

fn score_availability(availability: Option<f64>) -> u8 {
    match availability {
        None => 25,
        Some(a) if a >= 99.9 => 50,
        Some(a) if a >= 99.5 => 45,
        Some(a) if a >= 99.0 => 40,
        Some(a) if a >= 95.0 => 25,
        Some(_) => 10,
    }
}

fn score_performance(latency_p99: Option<f64>) -> u8 {
    match latency_p99 {
        None => 50,
        Some(p) if p < 100.0 => 100,
        Some(p) if p < 200.0 => 90,
        Some(p) if p < 500.0 => 70,
        Some(p) if p < 1000.0 => 50,
        Some(_) => 30,
    }
}

fn score_observability(gaps_count: usize) -> u8 {
    match gaps_count {
        0 => 100,
        1..=2 => 80,
        3..=5 => 60,
        6..=10 => 40,
        _ => 20,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(error_rate: Option<f64>, availability: Option<f64>, latency_p99: Option<f64>) -> PartialMetrics {
        PartialMetrics { error_rate, availability, latency_p99, ..Default::default() }
    }

    #[test]
    fn healthy_service_scores_high() {
        let m = metrics(Some(0.0005), Some(99.95), Some(80.0));
        let scores = calculate(&m, 0);
        assert_eq!(scores.reliability, 100);
        assert_eq!(scores.performance, 100);
        assert_eq!(scores.observability, 100);
        assert_eq!(scores.overall, 100);
    }

    #[test]
    fn missing_metrics_fall_back_to_midpoint_scores() {
        let m = metrics(None, None, None);
        let scores = calculate(&m, 0);
        assert_eq!(scores.reliability, 50);
        assert_eq!(scores.performance, 50);
    }

    #[test]
    fn gaps_count_drives_observability_thresholds() {
        let m = metrics(None, None, None);
        assert_eq!(calculate(&m, 0).observability, 100);
        assert_eq!(calculate(&m, 2).observability, 80);
        assert_eq!(calculate(&m, 5).observability, 60);
        assert_eq!(calculate(&m, 10).observability, 40);
        assert_eq!(calculate(&m, 11).observability, 20);
    }

    #[test]
    fn degraded_service_scores_low() {
        let m = metrics(Some(0.2), Some(90.0), Some(2000.0));
        let scores = calculate(&m, 20);
        assert_eq!(scores.reliability, 20);
        assert_eq!(scores.performance, 30);
        assert_eq!(scores.observability, 20);
    }
}
