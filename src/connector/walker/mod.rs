//! Repository discovery: which files are indexable under a root.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use tracing::debug;

use crate::domain::{DiscoveredFile, Language};

/// Directories skipped wherever they appear in a path.
const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    ".next",
    ".cache",
    "coverage",
    ".git",
];

/// File-name suffixes skipped regardless of location.
const IGNORED_SUFFIXES: &[&str] = &[".lock", ".min.js", ".min.css", ".map"];

pub struct Walker;

impl Walker {
    /// Discovers every indexable file under `root`: known language by
    /// extension, not ignored, not a dotfile, symlinks not followed.
    /// The root `.gitignore` is applied on top of the fixed rules; files
    /// whose metadata cannot be read are silently dropped.
    pub fn discover(root: &Path) -> Vec<DiscoveredFile> {
        let gitignore = root_gitignore(root);

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(true)
            .follow_links(false)
            .build();

        let mut files = Vec::new();
        for entry in walker.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let relative = match path.strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let rel_str = to_forward_slash(relative);
            if is_ignored(&rel_str) {
                continue;
            }
            if let Some(matcher) = &gitignore {
                if matcher
                    .matched_path_or_any_parents(relative, false)
                    .is_ignore()
                {
                    continue;
                }
            }

            let lang = Language::from_path(path);
            if !lang.is_known() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let mtime = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            files.push(DiscoveredFile {
                path: rel_str,
                absolute_path: path.to_path_buf(),
                lang,
                mtime,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("Discovered {} indexable files under {}", files.len(), root.display());
        files
    }
}

/// Only the root `.gitignore` is honoured; nested ones are not read.
fn root_gitignore(root: &Path) -> Option<Gitignore> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root);
    builder.add(path);
    builder.build().ok()
}

fn to_forward_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored(rel_path: &str) -> bool {
    for part in rel_path.split('/') {
        if IGNORED_DIRS.contains(&part) {
            return true;
        }
        // Dotfiles beyond the named directories are excluded too.
        if part.starts_with('.') {
            return true;
        }
    }
    IGNORED_SUFFIXES
        .iter()
        .any(|suffix| rel_path.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_discovers_known_languages_only() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/app.ts", "export {}");
        touch(dir.path(), "src/util.py", "x = 1");
        touch(dir.path(), "README.md", "# hi");

        let found = Walker::discover(dir.path());
        let paths: Vec<&str> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.ts", "src/util.py"]);
        assert_eq!(found[0].lang, Language::TypeScript);
    }

    #[test]
    fn test_fixed_ignore_rules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "node_modules/pkg/index.js", "x");
        touch(dir.path(), "dist/out.js", "x");
        touch(dir.path(), "app.min.js", "x");
        touch(dir.path(), "Cargo.lock", "x");
        touch(dir.path(), ".hidden/secret.ts", "x");
        touch(dir.path(), "src/main.ts", "x");

        let found = Walker::discover(dir.path());
        let paths: Vec<&str> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.ts"]);
    }

    #[test]
    fn test_root_gitignore_applied() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), ".gitignore", "generated/\n");
        touch(dir.path(), "generated/gen.ts", "x");
        touch(dir.path(), "src/main.ts", "x");

        let found = Walker::discover(dir.path());
        let paths: Vec<&str> = found.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.ts"]);
    }
}
