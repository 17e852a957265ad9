use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::application::{FileRepository, SearchIndex, SymbolRepository};
use crate::domain::{Candidate, CandidateType, DomainError, NodeKind, RetrievalHints};

const SCORE_HINT: f64 = 10.0;
const SCORE_PATH_IN_TASK: f64 = 8.0;
const SCORE_CAMELCASE: f64 = 6.0;
const FTS_LIMIT: u32 = 20;

/// Words too common to discriminate in a task description.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "have", "has", "what", "when",
    "where", "how", "does", "will", "can", "are", "was", "were", "been", "their", "then", "than",
    "should", "could", "would", "about", "make", "need", "want", "add", "use", "using", "file",
    "code", "work", "works", "function", "class", "type", "return", "async", "await", "null",
    "undefined", "true", "false", "const", "import", "export",
];

pub struct CandidateDiscovery {
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    search: Arc<dyn SearchIndex>,
    path_pattern: Regex,
    camel_pattern: Regex,
}

impl CandidateDiscovery {
    pub fn new(
        files: Arc<dyn FileRepository>,
        symbols: Arc<dyn SymbolRepository>,
        search: Arc<dyn SearchIndex>,
    ) -> Self {
        Self {
            files,
            symbols,
            search,
            path_pattern: Regex::new(r"(?:[\w./-]+/[\w./-]*\.(?:ts|js|tsx|jsx)\b)")
                .expect("invalid path pattern"),
            camel_pattern: Regex::new(r"\b[A-Z][a-z]+(?:[A-Z][a-z]+)+\b")
                .expect("invalid camel-case pattern"),
        }
    }

    /// Runs every discovery strategy and returns candidates deduplicated
    /// by file (best score wins; tied scores concatenate reasons), sorted
    /// by score descending.
    pub async fn execute(
        &self,
        repo_id: i64,
        task: &str,
        hints: &RetrievalHints,
    ) -> Result<Vec<Candidate>, DomainError> {
        let mut found = Vec::new();

        self.hint_paths(repo_id, hints, &mut found).await?;
        self.hint_symbols(repo_id, hints, &mut found).await?;
        self.paths_in_task(repo_id, task, &mut found).await?;
        self.camelcase_tokens(repo_id, task, &mut found).await?;
        self.full_text(repo_id, task, &mut found).await?;

        debug!("Discovery produced {} raw candidates", found.len());
        Ok(dedupe(found))
    }

    async fn hint_paths(
        &self,
        repo_id: i64,
        hints: &RetrievalHints,
        found: &mut Vec<Candidate>,
    ) -> Result<(), DomainError> {
        for path in hints.paths.iter().flatten() {
            if let Some(file) = self.files.find_by_path(repo_id, path).await? {
                found.push(Candidate {
                    candidate_type: CandidateType::File,
                    id: file.id,
                    file_id: file.id,
                    path: file.path,
                    score: SCORE_HINT,
                    reason: format!("hint:path \"{}\"", path),
                });
            }
        }
        Ok(())
    }

    async fn hint_symbols(
        &self,
        repo_id: i64,
        hints: &RetrievalHints,
        found: &mut Vec<Candidate>,
    ) -> Result<(), DomainError> {
        for name in hints.symbols.iter().flatten() {
            for symbol in self.symbols.find_by_name(repo_id, name).await? {
                let path = self.file_path(symbol.file_id).await?;
                found.push(Candidate {
                    candidate_type: CandidateType::Symbol,
                    id: symbol.id,
                    file_id: symbol.file_id,
                    path,
                    score: SCORE_HINT,
                    reason: format!("hint:symbol \"{}\"", name),
                });
            }
        }
        Ok(())
    }

    async fn paths_in_task(
        &self,
        repo_id: i64,
        task: &str,
        found: &mut Vec<Candidate>,
    ) -> Result<(), DomainError> {
        for m in self.path_pattern.find_iter(task) {
            let raw = m.as_str();
            let mut file = self.files.find_by_path(repo_id, raw).await?;
            if file.is_none() {
                if let Some(stripped) = raw.strip_prefix("./") {
                    file = self.files.find_by_path(repo_id, stripped).await?;
                }
            }
            if let Some(file) = file {
                found.push(Candidate {
                    candidate_type: CandidateType::File,
                    id: file.id,
                    file_id: file.id,
                    path: file.path,
                    score: SCORE_PATH_IN_TASK,
                    reason: "path-in-task".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn camelcase_tokens(
        &self,
        repo_id: i64,
        task: &str,
        found: &mut Vec<Candidate>,
    ) -> Result<(), DomainError> {
        let tokens: HashSet<&str> = self.camel_pattern.find_iter(task).map(|m| m.as_str()).collect();
        for token in tokens {
            for symbol in self.symbols.find_by_name(repo_id, token).await? {
                let path = self.file_path(symbol.file_id).await?;
                found.push(Candidate {
                    candidate_type: CandidateType::Symbol,
                    id: symbol.id,
                    file_id: symbol.file_id,
                    path,
                    score: SCORE_CAMELCASE,
                    reason: "camelcase-match".to_string(),
                });
            }
        }
        Ok(())
    }

    async fn full_text(
        &self,
        repo_id: i64,
        task: &str,
        found: &mut Vec<Candidate>,
    ) -> Result<(), DomainError> {
        let words = task_words(task);
        if words.is_empty() {
            return Ok(());
        }

        let query = words.join(" ");
        for row in self.search.search(repo_id, &query, FTS_LIMIT).await? {
            // bm25 rank is negative; better matches therefore score lower
            // here. Kept as-is.
            let score = (3.0 + row.rank).clamp(1.0, 5.0);
            match row.entity_type {
                NodeKind::File => {
                    let path = self
                        .files
                        .find_by_ids(&[row.entity_id])
                        .await?
                        .into_iter()
                        .next()
                        .map(|f| f.path)
                        .unwrap_or(row.text.clone());
                    found.push(Candidate {
                        candidate_type: CandidateType::File,
                        id: row.entity_id,
                        file_id: row.entity_id,
                        path,
                        score,
                        reason: "fts-match".to_string(),
                    });
                }
                NodeKind::Symbol => {
                    // Best-effort: relocate the symbol by its short name,
                    // the first token of the indexed text. Same-name
                    // shadowing can credit the wrong file.
                    let Some(name) = row.text.split_whitespace().next() else {
                        continue;
                    };
                    let Some(symbol) = self
                        .symbols
                        .find_by_name(repo_id, name)
                        .await?
                        .into_iter()
                        .next()
                    else {
                        continue;
                    };
                    let path = self.file_path(symbol.file_id).await?;
                    found.push(Candidate {
                        candidate_type: CandidateType::Symbol,
                        id: symbol.id,
                        file_id: symbol.file_id,
                        path,
                        score,
                        reason: "fts-match".to_string(),
                    });
                }
                NodeKind::Module => {}
            }
        }
        Ok(())
    }

    async fn file_path(&self, file_id: i64) -> Result<String, DomainError> {
        Ok(self
            .files
            .find_by_ids(&[file_id])
            .await?
            .into_iter()
            .next()
            .map(|f| f.path)
            .unwrap_or_default())
    }
}

/// Lowercased task words longer than three characters, minus stop words,
/// deduplicated in order of first appearance.
fn task_words(task: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    task.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.len() > 3)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Keeps one candidate per file: the highest score wins, and candidates
/// tied on score merge their reasons.
fn dedupe(found: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_file: HashMap<i64, Candidate> = HashMap::new();
    for candidate in found {
        match by_file.get_mut(&candidate.file_id) {
            None => {
                by_file.insert(candidate.file_id, candidate);
            }
            Some(existing) => {
                if candidate.score > existing.score {
                    *existing = candidate;
                } else if candidate.score == existing.score
                    && !existing.reason.contains(&candidate.reason)
                {
                    existing.reason = format!("{}; {}", existing.reason, candidate.reason);
                }
            }
        }
    }

    let mut out: Vec<Candidate> = by_file.into_values().collect();
    out.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_words_filters_stop_words_and_short_words() {
        let words = task_words("How does the AuthService function handle token refresh?");
        assert!(words.contains(&"authservice".to_string()));
        assert!(words.contains(&"token".to_string()));
        assert!(words.contains(&"refresh".to_string()));
        assert!(words.contains(&"handle".to_string()));
        assert!(!words.contains(&"does".to_string()));
        assert!(!words.contains(&"the".to_string()));
        assert!(!words.contains(&"function".to_string()));
        assert!(!words.contains(&"how".to_string()));
    }

    #[test]
    fn test_task_words_deduplicates() {
        let words = task_words("token token TOKEN");
        assert_eq!(words, vec!["token"]);
    }

    #[test]
    fn test_dedupe_keeps_best_score() {
        let mk = |file_id, score, reason: &str| Candidate {
            candidate_type: CandidateType::File,
            id: file_id,
            file_id,
            path: format!("f{}.ts", file_id),
            score,
            reason: reason.to_string(),
        };
        let out = dedupe(vec![mk(1, 8.0, "path-in-task"), mk(1, 4.0, "fts-match")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 8.0);
        assert_eq!(out[0].reason, "path-in-task");
    }

    #[test]
    fn test_dedupe_concatenates_tied_reasons() {
        let mk = |score, reason: &str| Candidate {
            candidate_type: CandidateType::File,
            id: 1,
            file_id: 1,
            path: "f.ts".to_string(),
            score,
            reason: reason.to_string(),
        };
        let out = dedupe(vec![mk(6.0, "camelcase-match"), mk(6.0, "fts-match")]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reason, "camelcase-match; fts-match");
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let mk = |file_id, score| Candidate {
            candidate_type: CandidateType::File,
            id: file_id,
            file_id,
            path: format!("f{}.ts", file_id),
            score,
            reason: "r".to_string(),
        };
        let out = dedupe(vec![mk(1, 2.0), mk(2, 9.0), mk(3, 5.0)]);
        let scores: Vec<f64> = out.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![9.0, 5.0, 2.0]);
    }
}
