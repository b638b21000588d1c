//! Flattening and indexing of parsed facts ahead of rule evaluation.
//!
//! Grounded in `original_source/.../rule_engine/service.py::RuleEngineService.evaluate`,
//! which flattens `ExtractedFacts` across files and builds `facts_by_file`/
//! `facts_by_type` dicts before running any rule.

use std::collections::HashMap;

use domain::{CodeFact, FactType, ParsedFile};

/// A fact paired with the file it was extracted from. Facts themselves carry
/// no `file_path` (see `domain::parsed::CodeFact`) — that association only
/// exists at the `ParsedFile` level, so the index is what recovers it.
#[derive(Debug, Clone, Copy)]
pub struct FlatFact<'a> {
    pub file_path: &'a str,
    pub fact: &'a CodeFact,
}

impl<'a> FlatFact<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.fact.metadata.get("name").and_then(|v| v.as_str())
    }

    /// Best-effort scope label: the fact's own name if it's a named entity
    /// (function/http_handler), otherwise the enclosing function's name.
    pub fn scope_name(&self) -> Option<&'a str> {
        match self.fact.fact_type {
            FactType::Function | FactType::HttpHandler => {
                self.name().or(self.fact.parent_function.as_deref())
            }
            _ => self.fact.parent_function.as_deref(),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.fact.line_end.saturating_sub(self.fact.line_start) + 1
    }
}

/// Twice-indexed view over every fact in the repository: by `file_path` and
/// by `fact_type`, as base spec §4.4 ("Indexing") requires.
pub struct FactIndex<'a> {
    pub by_file: HashMap<&'a str, Vec<FlatFact<'a>>>,
    pub by_type: HashMap<FactType, Vec<FlatFact<'a>>>,
}

impl<'a> FactIndex<'a> {
    pub fn build(files: &'a [ParsedFile]) -> Self {
        let mut by_file: HashMap<&'a str, Vec<FlatFact<'a>>> = HashMap::new();
        let mut by_type: HashMap<FactType, Vec<FlatFact<'a>>> = HashMap::new();

        for file in files {
            for fact in &file.facts {
                let flat = FlatFact { file_path: &file.file_path, fact };
                by_file.entry(&file.file_path).or_default().push(flat);
                by_type.entry(fact.fact_type).or_default().push(flat);
            }
        }

        Self { by_file, by_type }
    }

    pub fn of_type(&self, fact_type: FactType) -> &[FlatFact<'a>] {
        self.by_type.get(&fact_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_file(&self, file_path: &str) -> &[FlatFact<'a>] {
        self.by_file.get(file_path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn file_paths(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_file.keys().copied()
    }

    /// Facts of `fact_type` in `file_path` whose range lies inside `outer`.
    pub fn contained_in(
        &self,
        file_path: &str,
        outer: &FlatFact<'a>,
        fact_type: FactType,
    ) -> Vec<FlatFact<'a>> {
        self.in_file(file_path)
            .iter()
            .filter(|f| f.fact.fact_type == fact_type)
            .filter(|f| outer.fact.contains_range(f.fact.line_start, f.fact.line_end))
            .copied()
            .collect()
    }

    /// Facts of `fact_type` in `file_path` sharing the same enclosing
    /// function name as `scope`.
    pub fn in_same_scope(
        &self,
        file_path: &str,
        scope: Option<&str>,
        fact_type: FactType,
    ) -> Vec<FlatFact<'a>> {
        self.in_file(file_path)
            .iter()
            .filter(|f| f.fact.fact_type == fact_type)
            .filter(|f| f.fact.parent_function.as_deref() == scope)
            .copied()
            .collect()
    }
}
