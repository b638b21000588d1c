//! Deterministic mock SLI generation for demo mode (`USE_MOCK_LLM_ANALYZER`).
//!
//! Grounded in `original_source/.../sli_indicator/service.py::_generate_mock_slis`:
//! seeded from the service name's character sum so the same service always
//! produces the same "random" but plausible numbers.

use domain::{ReviewSli, Trend};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use uuid::Uuid;

use crate::sli::previous_scores;

pub fn generate(review_id: Uuid, service_name: &str, previous: &[ReviewSli]) -> Vec<ReviewSli> {
    let previous_by_name = previous_scores(previous);
    let seed: u64 = service_name.chars().map(|c| c as u64).sum();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut slis = Vec::with_capacity(6);
    slis.push(mock_availability(review_id, &mut rng, &previous_by_name));
    slis.push(mock_latency(review_id, &mut rng, &previous_by_name));
    slis.push(mock_error_rate(review_id, &mut rng, &previous_by_name));
    slis.push(mock_throughput(review_id, &mut rng, &previous_by_name));
    slis.push(mock_error_budget(review_id, &mut rng, &previous_by_name));
    slis.push(mock_saturation(review_id, &mut rng, &previous_by_name));
    slis
}

fn trend_for(score: u8, previous: Option<&u8>) -> Option<Trend> {
    previous.map(|p| Trend::from_delta(score as f64, *p as f64))
}

fn mock_availability(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let availability = rng.gen_range(99.82..99.98);
    let target = 99.9;
    let score = (((availability / target) * 100.0).min(100.0)) as u8;
    let previous_score = previous.get("availability").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "availability".to_string(),
        category: "reliability".to_string(),
        score,
        previous_score,
        trend: trend_for(score, previous_score.as_ref()),
        target: format!("{target}%"),
        actual: format!("{availability:.3}%"),
        unit: "percent".to_string(),
        data_source: "datadog".to_string(),
    }
}

fn mock_latency(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let p99 = rng.gen_range(120.0..380.0);
    let target_ms = 300.0;
    let score = (((1.0 - (p99 / (target_ms * 2.0))) * 100.0).clamp(0.0, 100.0)) as u8;
    let previous_score = previous.get("latency_p99").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "latency_p99".to_string(),
        category: "performance".to_string(),
        score,
        previous_score,
        trend: trend_for(score, previous_score.as_ref()),
        target: format!("{target_ms}ms"),
        actual: format!("{p99:.0}ms"),
        unit: "ms".to_string(),
        data_source: "datadog".to_string(),
    }
}

fn mock_error_rate(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let error_rate_pct = rng.gen_range(0.05..1.4);
    let target = 1.0;
    let score = (((1.0 - (error_rate_pct / target)) * 100.0).clamp(0.0, 100.0)) as u8;
    let previous_score = previous.get("error_rate").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "error_rate".to_string(),
        category: "reliability".to_string(),
        score,
        previous_score,
        trend: trend_for(score, previous_score.as_ref()),
        target: format!("{target}%"),
        actual: format!("{error_rate_pct:.2}%"),
        unit: "percent".to_string(),
        data_source: "datadog".to_string(),
    }
}

fn mock_throughput(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let throughput = rng.gen_range(800.0..3500.0);
    let previous_score = previous.get("throughput").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "throughput".to_string(),
        category: "performance".to_string(),
        score: 100,
        previous_score,
        trend: trend_for(100, previous_score.as_ref()),
        target: String::new(),
        actual: format!("{throughput:.0} req/min"),
        unit: "req/min".to_string(),
        data_source: "datadog".to_string(),
    }
}

fn mock_error_budget(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let avail_target = 99.9;
    let monthly_budget_minutes = (1.0 - avail_target / 100.0) * 30.0 * 24.0 * 60.0;
    let consumed_minutes = rng.gen_range(5.0..35.0);
    let budget_remaining_pct =
        (((monthly_budget_minutes - consumed_minutes) / monthly_budget_minutes) * 100.0).max(0.0);
    let score = budget_remaining_pct.min(100.0) as u8;
    let previous_score = previous.get("error_budget_remaining").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "error_budget_remaining".to_string(),
        category: "reliability".to_string(),
        score,
        previous_score,
        trend: trend_for(score, previous_score.as_ref()),
        target: "100%".to_string(),
        actual: format!("{budget_remaining_pct:.1}%"),
        unit: "percent".to_string(),
        data_source: "calculated".to_string(),
    }
}

fn mock_saturation(review_id: Uuid, rng: &mut StdRng, previous: &std::collections::HashMap<&str, u8>) -> ReviewSli {
    let cpu_util = rng.gen_range(25.0..72.0);
    let memory_util = rng.gen_range(40.0..78.0);
    let score = (100.0 - cpu_util.max(memory_util)).clamp(0.0, 100.0) as u8;
    let previous_score = previous.get("saturation").copied();

    ReviewSli {
        id: Uuid::new_v4(),
        review_id,
        name: "saturation".to_string(),
        category: "capacity".to_string(),
        score,
        previous_score,
        trend: trend_for(score, previous_score.as_ref()),
        target: "<70%".to_string(),
        actual: format!("CPU {cpu_util:.0}% / Mem {memory_util:.0}%"),
        unit: "percent".to_string(),
        data_source: "datadog".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_service_name_yields_same_mock_slis() {
        let a = generate(Uuid::new_v4(), "payments-api", &[]);
        let b = generate(Uuid::new_v4(), "payments-api", &[]);
        let actuals_a: Vec<_> = a.iter().map(|s| s.actual.clone()).collect();
        let actuals_b: Vec<_> = b.iter().map(|s| s.actual.clone()).collect();
        assert_eq!(actuals_a, actuals_b);
    }

    #[test]
    fn different_service_names_can_diverge() {
        let a = generate(Uuid::new_v4(), "payments-api", &[]);
        let b = generate(Uuid::new_v4(), "inventory-worker", &[]);
        let actuals_a: Vec<_> = a.iter().map(|s| s.actual.clone()).collect();
        let actuals_b: Vec<_> = b.iter().map(|s| s.actual.clone()).collect();
        assert_ne!(actuals_a, actuals_b);
    }

    #[test]
    fn produces_six_indicators_with_expected_names() {
        let slis = generate(Uuid::new_v4(), "checkout", &[]);
        let names: Vec<_> = slis.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["availability", "latency_p99", "error_rate", "throughput", "error_budget_remaining", "saturation"]
        );
    }

    #[test]
    fn scores_are_fed_forward_as_previous() {
        let first = generate(Uuid::new_v4(), "checkout", &[]);
        let second = generate(Uuid::new_v4(), "checkout", &first);
        for sli in &second {
            assert!(sli.previous_score.is_some());
        }
    }
}
