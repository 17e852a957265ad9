use std::path::Path;

use crate::domain::{DomainError, FileSnippet};

/// `repo_snippet`: a line range straight from disk, bypassing the store.
pub struct FileSnippetUseCase;

impl FileSnippetUseCase {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        root: &Path,
        file_path: &str,
        start_line: Option<u32>,
        end_line: Option<u32>,
    ) -> Result<FileSnippet, DomainError> {
        let root = root
            .canonicalize()
            .map_err(|e| DomainError::invalid_input(format!("Invalid path: {}", e)))?;
        if !root.is_dir() {
            return Err(DomainError::invalid_input(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        // Canonicalise before reading so `..` and symlinked escapes are
        // refused without ever touching the target.
        let joined = root.join(file_path);
        let resolved = joined
            .canonicalize()
            .map_err(|_| DomainError::not_found(format!("No such file: {}", file_path)))?;
        if !resolved.starts_with(&root) {
            return Err(DomainError::invalid_input(format!(
                "Path escapes repository root: {}",
                file_path
            )));
        }
        if !resolved.is_file() {
            return Err(DomainError::invalid_input(format!(
                "Not a file: {}",
                file_path
            )));
        }

        let content = tokio::fs::read_to_string(&resolved).await?;
        let lines: Vec<&str> = content.lines().collect();
        let total_lines = lines.len() as u32;

        let start = start_line.unwrap_or(1).max(1);
        let end = end_line.unwrap_or(total_lines).min(total_lines.max(1));
        if start > end && total_lines > 0 {
            return Err(DomainError::invalid_input(format!(
                "Invalid line range: {}..{}",
                start, end
            )));
        }

        let text = if total_lines == 0 {
            String::new()
        } else {
            lines[(start as usize - 1)..(end as usize)].join("\n")
        };

        Ok(FileSnippet {
            path: file_path.to_string(),
            start_line: start,
            end_line: end,
            total_lines,
            text,
        })
    }
}

impl Default for FileSnippetUseCase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_whole_file_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "one\ntwo\nthree\n").unwrap();

        let snippet = FileSnippetUseCase::new()
            .execute(dir.path(), "a.ts", None, None)
            .await
            .unwrap();
        assert_eq!(snippet.start_line, 1);
        assert_eq!(snippet.end_line, 3);
        assert_eq!(snippet.total_lines, 3);
        assert_eq!(snippet.text, "one\ntwo\nthree");
    }

    #[tokio::test]
    async fn test_line_range() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "one\ntwo\nthree\nfour\n").unwrap();

        let snippet = FileSnippetUseCase::new()
            .execute(dir.path(), "a.ts", Some(2), Some(3))
            .await
            .unwrap();
        assert_eq!(snippet.text, "two\nthree");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "x\n").unwrap();

        let err = FileSnippetUseCase::new()
            .execute(dir.path(), "../../etc/passwd", None, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input() || err.is_not_found());
    }

    #[tokio::test]
    async fn test_absolute_path_outside_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSnippetUseCase::new()
            .execute(dir.path(), "/etc/passwd", None, None)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input() || err.is_not_found());
    }
}
