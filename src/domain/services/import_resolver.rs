//! Relative-import resolution against the set of indexed paths.
//!
//! Resolution deliberately consults the paths recorded in the store rather
//! than the live filesystem: by the time imports are linked, every file of
//! the current run has its row, so a lookup can only miss when the target
//! genuinely is not part of the repository.

use std::collections::HashSet;

const SOURCE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Resolves `specifier` as written in `importing_file` (repo-relative,
/// forward-slash) to a known repo-relative path. Non-relative specifiers
/// are external packages and resolve to `None`, as does anything escaping
/// the repository root.
pub fn resolve(
    specifier: &str,
    importing_file: &str,
    known_paths: &HashSet<String>,
) -> Option<String> {
    if !specifier.starts_with('.') {
        return None;
    }

    let dir = parent_dir(importing_file);
    let base = normalize_relative(&dir, specifier)?;

    for candidate in candidates(&base) {
        if known_paths.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Candidate paths in probe order: the specifier as-is; `.js`/`.jsx`
/// specifiers re-tried with `.ts`/`.tsx`; appended source extensions;
/// directory `index` files.
fn candidates(base: &str) -> Vec<String> {
    let mut out = vec![base.to_string()];

    if let Some(stem) = base.strip_suffix(".js") {
        out.push(format!("{}.ts", stem));
    } else if let Some(stem) = base.strip_suffix(".jsx") {
        out.push(format!("{}.tsx", stem));
    }

    for ext in SOURCE_EXTENSIONS {
        out.push(format!("{}.{}", base, ext));
    }
    for ext in SOURCE_EXTENSIONS {
        out.push(format!("{}/index.{}", base, ext));
    }
    out
}

fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Joins `specifier` onto `dir` and normalizes `.`/`..` segments. Returns
/// `None` when the result would climb above the repository root.
fn normalize_relative(dir: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();

    for seg in specifier.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    Some(parts.join("/"))
}
