use std::path::Path;

use tracing::debug;

use crate::domain::{compute_sha256, RankedFile, Snippet};

/// Lines around a symbol's range included for context.
const CONTEXT_LINES: u32 = 3;
/// Files at or under this length are emitted whole.
const WHOLE_FILE_LINES: usize = 60;

/// Tokens are estimated as ceil(chars / 4).
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() as u32 + 3) / 4
}

pub struct SnippetExtractor;

impl SnippetExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Walks the ranked files in order, emitting snippets until the budget
    /// is exhausted. The very first snippet goes out unconditionally; once
    /// one snippet would overflow the budget, extraction stops globally.
    pub async fn execute(
        &self,
        repo_root: &Path,
        ranked: &[RankedFile],
        budget_tokens: u32,
    ) -> (Vec<Snippet>, u32) {
        let mut snippets = Vec::new();
        let mut used = 0u32;

        'files: for file in ranked {
            let absolute = repo_root.join(&file.path);
            let content = match tokio::fs::read_to_string(&absolute).await {
                Ok(content) => content,
                Err(e) => {
                    debug!("Skipping unreadable file {}: {}", file.path, e);
                    continue;
                }
            };
            let lines: Vec<&str> = content.lines().collect();
            let total = lines.len();
            if total == 0 {
                continue;
            }

            for (start, end) in ranges_for(file, total) {
                let text = lines[(start as usize - 1)..(end as usize)].join("\n");
                let tokens = estimate_tokens(&text);
                if used + tokens > budget_tokens && !snippets.is_empty() {
                    break 'files;
                }
                used += tokens;
                snippets.push(Snippet {
                    path: file.path.clone(),
                    start,
                    end,
                    sha256: compute_sha256(&text),
                    text,
                });
            }
        }

        (snippets, used)
    }
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Line ranges for one file: the whole file when it is short or has no
/// attached symbols; otherwise one padded range per symbol, merged when
/// overlapping or adjacent.
fn ranges_for(file: &RankedFile, total_lines: usize) -> Vec<(u32, u32)> {
    let total = total_lines as u32;
    if total_lines <= WHOLE_FILE_LINES || file.symbols.is_empty() {
        return vec![(1, total)];
    }

    let mut ranges: Vec<(u32, u32)> = file
        .symbols
        .iter()
        .map(|s| {
            (
                s.start_line.saturating_sub(CONTEXT_LINES).max(1),
                (s.end_line + CONTEXT_LINES).min(total),
            )
        })
        .collect();
    ranges.sort();

    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => {
                last.1 = last.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Symbol, SymbolKind};

    fn symbol(start: u32, end: u32) -> Symbol {
        Symbol {
            id: 0,
            repo_id: 1,
            file_id: 1,
            kind: SymbolKind::Function,
            name: "f".into(),
            fq_name: "a.ts:f".into(),
            signature: None,
            start_line: start,
            start_col: 1,
            end_line: end,
            end_col: 1,
        }
    }

    fn ranked(symbols: Vec<Symbol>) -> RankedFile {
        RankedFile {
            file_id: 1,
            path: "a.ts".into(),
            score: 1.0,
            reasons: vec![],
            symbols,
        }
    }

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_short_file_is_one_range() {
        let file = ranked(vec![symbol(5, 10)]);
        assert_eq!(ranges_for(&file, 42), vec![(1, 42)]);
    }

    #[test]
    fn test_no_symbols_is_one_range() {
        let file = ranked(vec![]);
        assert_eq!(ranges_for(&file, 100), vec![(1, 100)]);
    }

    #[test]
    fn test_symbol_ranges_padded_and_merged() {
        let file = ranked(vec![symbol(10, 20), symbol(24, 30), symbol(80, 90)]);
        // 10-20 pads to 7-23; 24-30 pads to 21-33: overlapping, merged.
        // 80-90 pads to 77-93: separate.
        assert_eq!(ranges_for(&file, 100), vec![(7, 33), (77, 93)]);
    }

    #[test]
    fn test_range_clamped_to_file() {
        let file = ranked(vec![symbol(1, 2), symbol(98, 99)]);
        assert_eq!(ranges_for(&file, 99), vec![(1, 5), (95, 99)]);
    }

    #[tokio::test]
    async fn test_budget_respected_after_first_snippet() {
        let dir = tempfile::tempdir().unwrap();
        let body = "x\n".repeat(40);
        std::fs::write(dir.path().join("a.ts"), &body).unwrap();
        std::fs::write(dir.path().join("b.ts"), &body).unwrap();

        let files = vec![
            RankedFile {
                file_id: 1,
                path: "a.ts".into(),
                score: 2.0,
                reasons: vec![],
                symbols: vec![],
            },
            RankedFile {
                file_id: 2,
                path: "b.ts".into(),
                score: 1.0,
                reasons: vec![],
                symbols: vec![],
            },
        ];

        // Budget of 1 token: the first snippet is emitted unconditionally,
        // the second would overflow and stops extraction.
        let (snippets, used) = SnippetExtractor::new().execute(dir.path(), &files, 1).await;
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].path, "a.ts");
        assert!(used >= 1);
    }
}
