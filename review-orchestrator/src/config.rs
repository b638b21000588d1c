//! Process-wide orchestrator configuration (base spec §4.8, §6).

/// Files read in Phase 3 (fact extraction) beyond this cap are ignored —
/// mirrors `original_source`'s implicit file-count ceiling for very large
/// repositories.
pub const MAX_FACT_EXTRACTION_FILES: usize = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// `USE_MOCK_LLM_ANALYZER`: short-circuits phases 3-7 into a
    /// deterministic mock analyzer for live demos.
    pub use_mock_llm_analyzer: bool,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self {
            use_mock_llm_analyzer: std::env::var("USE_MOCK_LLM_ANALYZER")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }
}
