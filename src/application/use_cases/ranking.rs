use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use crate::application::{FileRepository, SymbolRepository};
use crate::domain::{Candidate, DomainError, Expansion, RankedFile};

const ENTRY_POINT_BONUS: f64 = 3.0;

pub struct Ranker {
    files: Arc<dyn FileRepository>,
    symbols: Arc<dyn SymbolRepository>,
    entry_patterns: Vec<Regex>,
}

impl Ranker {
    pub fn new(files: Arc<dyn FileRepository>, symbols: Arc<dyn SymbolRepository>) -> Self {
        let entry_patterns = [
            r"/routes/",
            r"/controllers/",
            r"/pages/",
            r"(?:^|/)app\.[^/.]+$",
            r"(?:^|/)main\.[^/.]+$",
            r"(?:^|/)index\.(?:ts|tsx|js|jsx)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid entry-point pattern"))
        .collect();
        Self {
            files,
            symbols,
            entry_patterns,
        }
    }

    fn is_entry_point(&self, path: &str) -> bool {
        self.entry_patterns.iter().any(|p| p.is_match(path))
    }

    /// Merges candidate and expansion scores per file (sum scores, union
    /// reasons), applies the entry-point bonus, attaches every symbol of
    /// each file, and sorts by score descending.
    pub async fn merge(
        &self,
        repo_id: i64,
        candidates: &[Candidate],
        expansion: &Expansion,
    ) -> Result<Vec<RankedFile>, DomainError> {
        struct Entry {
            score: f64,
            reasons: Vec<String>,
            path: Option<String>,
        }
        let mut merged: HashMap<i64, Entry> = HashMap::new();

        for candidate in candidates {
            let entry = merged.entry(candidate.file_id).or_insert(Entry {
                score: 0.0,
                reasons: Vec::new(),
                path: None,
            });
            entry.score += candidate.score;
            if !entry.reasons.contains(&candidate.reason) {
                entry.reasons.push(candidate.reason.clone());
            }
            entry.path.get_or_insert_with(|| candidate.path.clone());
        }

        for expanded in &expansion.files {
            let entry = merged.entry(expanded.file_id).or_insert(Entry {
                score: 0.0,
                reasons: Vec::new(),
                path: None,
            });
            entry.score += expanded.score;
            let reason = format!("graph-depth-{}", expanded.depth);
            if !entry.reasons.contains(&reason) {
                entry.reasons.push(reason);
            }
        }

        // Expansion-only files still need their paths.
        let missing: Vec<i64> = merged
            .iter()
            .filter(|(_, e)| e.path.is_none())
            .map(|(id, _)| *id)
            .collect();
        if !missing.is_empty() {
            for file in self.files.find_by_ids(&missing).await? {
                if let Some(entry) = merged.get_mut(&file.id) {
                    entry.path = Some(file.path);
                }
            }
        }

        let mut ranked = Vec::with_capacity(merged.len());
        for (file_id, entry) in merged {
            let Some(path) = entry.path else {
                // The file vanished from the store between stages.
                continue;
            };
            let mut score = entry.score;
            if self.is_entry_point(&path) {
                score += ENTRY_POINT_BONUS;
            }
            let symbols = self.symbols.for_file(repo_id, file_id).await?;
            ranked.push(RankedFile {
                file_id,
                path,
                score,
                reasons: entry.reasons,
                symbols,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::storage::{
        SqliteFileRepository, SqliteStore, SqliteSymbolRepository,
    };

    fn ranker() -> Ranker {
        let store = SqliteStore::in_memory().unwrap();
        Ranker::new(
            Arc::new(SqliteFileRepository::new(store.connection())),
            Arc::new(SqliteSymbolRepository::new(store.connection())),
        )
    }

    #[test]
    fn test_entry_point_patterns() {
        let r = ranker();
        assert!(r.is_entry_point("src/routes/users.ts"));
        assert!(r.is_entry_point("src/controllers/auth.ts"));
        assert!(r.is_entry_point("web/pages/home.tsx"));
        assert!(r.is_entry_point("src/app.ts"));
        assert!(r.is_entry_point("cmd/main.go"));
        assert!(r.is_entry_point("src/index.ts"));
        assert!(r.is_entry_point("index.js"));

        assert!(!r.is_entry_point("src/models/user.ts"));
        assert!(!r.is_entry_point("src/mainframe/link.ts"));
        assert!(!r.is_entry_point("src/index.py"));
    }
}
