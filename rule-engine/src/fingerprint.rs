//! Cross-review gap fingerprinting (base spec §4.4).

use sha2::{Digest, Sha256};

use domain::DetectedProblem;

/// `SHA-256(rule_id || "::" || join("|", sorted affected_files) || "::" ||
/// join("|", sorted affected_functions))[:16 hex]`. Invariant over
/// permutations of `affected_files`/`affected_functions`.
pub fn fingerprint(problem: &DetectedProblem) -> String {
    let mut files = problem.affected_files.clone();
    files.sort();
    let mut functions = problem.affected_functions.clone();
    functions.sort();

    fingerprint_parts(&problem.rule_id, &files, &functions)
}

pub fn fingerprint_parts(rule_id: &str, sorted_files: &[String], sorted_functions: &[String]) -> String {
    let key = format!("{}::{}::{}", rule_id, sorted_files.join("|"), sorted_functions.join("|"));
    let digest = Sha256::digest(key.as_bytes());
    let hex = format!("{digest:x}");
    hex[..16].to_string()
}
