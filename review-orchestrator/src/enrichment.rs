//! Phase 6 — LLM enrichment (base spec §4.8): one budgeted call over every
//! surviving gap, producing per-gap remediation guidance plus a top-level
//! summary. Counted against the review's C1 budget like every other call.

use domain::DetectedProblem;
use llm_budget::Budget;
use llm_port::{LlmPort, Profile};
use serde::Deserialize;

use crate::error::ReviewError;

#[derive(Debug, Clone, Default)]
pub struct EnrichedGap {
    pub suggested_log_statement: Option<String>,
    pub implementation_guide: Option<String>,
    pub example_code: Option<String>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrichmentResult {
    pub summary: String,
    pub recommendations: String,
    /// Aligned by position with the `gaps` slice passed to `enrich`.
    pub per_gap: Vec<EnrichedGap>,
}

#[derive(Debug, Deserialize)]
struct RawEnrichedGap {
    gap_index: usize,
    suggested_log_statement: Option<String>,
    implementation_guide: Option<String>,
    example_code: Option<String>,
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEnrichmentResponse {
    summary: String,
    recommendations: String,
    #[serde(default)]
    gaps: Vec<RawEnrichedGap>,
}

/// Budget-checked before the call; a call failure is fatal to the review
/// (enrichment is not one of the phases base spec §4.6.3 singles out as
/// non-fatal), but malformed output degrades gracefully to an empty
/// per-gap list with a generic summary rather than failing the review.
pub async fn enrich(
    llm: &dyn LlmPort,
    budget: &Budget,
    service_name: &str,
    gaps: &[DetectedProblem],
) -> Result<EnrichmentResult, ReviewError> {
    if gaps.is_empty() {
        return Ok(EnrichmentResult {
            summary: format!("No logging or metrics gaps detected for {service_name} this period."),
            recommendations: String::new(),
            per_gap: Vec::new(),
        });
    }

    budget.check_before_start()?;

    let system_prompt = "You write remediation guidance for detected observability gaps: for \
        each gap, a suggested_log_statement or metric definition, an implementation_guide, an \
        example_code snippet, and a rationale. Also write a top-level summary and recommendations \
        string for the service's health review. Respond with JSON \
        `{\"summary\", \"recommendations\", \"gaps\": [{\"gap_index\", \"suggested_log_statement\"?, \
        \"implementation_guide\"?, \"example_code\"?, \"rationale\"?}]}`. Respond with JSON only.";
    let user_prompt = format!(
        "Service: {service_name}\n\nGaps:\n{}",
        gaps.iter()
            .enumerate()
            .map(|(i, g)| format!(
                "[{i}] {} ({:?}, rule {}): files {}",
                g.title,
                g.severity,
                g.rule_id,
                g.affected_files.join(", ")
            ))
            .collect::<Vec<_>>()
            .join("\n")
    );

    let completion = llm.invoke(Profile::Slow, system_prompt, &user_prompt).await?;
    budget.record_completion(completion.tokens_used);

    Ok(parse_enrichment(&completion.text, gaps.len(), service_name))
}

fn parse_enrichment(text: &str, gap_count: usize, service_name: &str) -> EnrichmentResult {
    let cleaned = strip_code_fence(text);
    match serde_json::from_str::<RawEnrichmentResponse>(&cleaned) {
        Ok(raw) => {
            let mut per_gap = vec![EnrichedGap::default(); gap_count];
            for g in raw.gaps {
                if let Some(slot) = per_gap.get_mut(g.gap_index) {
                    *slot = EnrichedGap {
                        suggested_log_statement: g.suggested_log_statement,
                        implementation_guide: g.implementation_guide,
                        example_code: g.example_code,
                        rationale: g.rationale,
                    };
                }
            }
            EnrichmentResult { summary: raw.summary, recommendations: raw.recommendations, per_gap }
        }
        Err(err) => {
            tracing::warn!(service_name, error = %err, "Phase 6 enrichment returned malformed JSON");
            EnrichmentResult {
                summary: format!("Health review completed for {service_name}; enrichment detail unavailable."),
                recommendations: String::new(),
                per_gap: vec![EnrichedGap::default(); gap_count],
            }
        }
    }
}

fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .strip_suffix("```")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}
