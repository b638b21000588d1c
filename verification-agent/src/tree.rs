//! Repository file tree rendering for Phase A's candidate-file prompt.
//!
//! Grounded in base spec §4.6.2's "For trees larger than 500 files, compact
//! the tree by grouping files per directory into a summary line" — the
//! original's `format_repo_tree`/`_compact_repo_tree`.

use domain::ParsedFile;

const COMPACTION_THRESHOLD: usize = 500;

#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub file_path: String,
    pub language: String,
    pub line_count: u32,
}

pub fn entries(files: &[ParsedFile]) -> Vec<TreeEntry> {
    files
        .iter()
        .map(|f| TreeEntry {
            file_path: f.file_path.clone(),
            language: f.language.clone(),
            line_count: f.line_count,
        })
        .collect()
}

/// One line per file under 500 files; otherwise one summary line per
/// top-level directory (`dir/ (N files, languages: ...)`), never raw paths.
pub fn format_tree(entries: &[TreeEntry]) -> String {
    if entries.len() <= COMPACTION_THRESHOLD {
        return entries
            .iter()
            .map(|e| format!("{} ({}, {} lines)", e.file_path, e.language, e.line_count))
            .collect::<Vec<_>>()
            .join("\n");
    }

    use std::collections::BTreeMap;
    let mut by_dir: BTreeMap<&str, (usize, std::collections::BTreeSet<&str>)> = BTreeMap::new();
    for e in entries {
        let dir = e.file_path.rsplit_once('/').map(|(d, _)| d).unwrap_or(".");
        let slot = by_dir.entry(dir).or_insert((0, std::collections::BTreeSet::new()));
        slot.0 += 1;
        slot.1.insert(e.language.as_str());
    }

    by_dir
        .into_iter()
        .map(|(dir, (count, langs))| {
            let langs: Vec<&str> = langs.into_iter().collect();
            format!("{dir}/ ({count} files, languages: {})", langs.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn known_paths(entries: &[TreeEntry]) -> std::collections::HashSet<&str> {
    entries.iter().map(|e| e.file_path.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str) -> TreeEntry {
        TreeEntry { file_path: path.to_string(), language: "python".to_string(), line_count: 10 }
    }

    #[test]
    fn small_tree_lists_every_file() {
        let entries = vec![entry("a.py"), entry("b.py")];
        let rendered = format_tree(&entries);
        assert!(rendered.contains("a.py"));
        assert!(rendered.contains("b.py"));
    }

    #[test]
    fn large_tree_compacts_by_directory() {
        let entries: Vec<_> = (0..600).map(|i| entry(&format!("src/file{i}.py"))).collect();
        let rendered = format_tree(&entries);
        assert!(!rendered.contains("file0.py"));
        assert_eq!(rendered.lines().count(), 1);
    }
}
